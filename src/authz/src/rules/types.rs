//! Rule type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RuleError;
use crate::types::ResolvedIds;

/// Name of a scope rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleName {
    /// Hubs the user may operate on
    UserHub,
    /// Sellers the user may operate on
    Seller,
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserHub => write!(f, "user_hub"),
            Self::Seller => write!(f, "seller"),
        }
    }
}

/// Condition operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Value must be one of the enumerated values
    Equals,
    /// Wildcard: every resource of the rule's type
    All,
}

/// A single rule condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub operator: Operator,

    #[serde(default)]
    pub values: Vec<String>,
}

impl Condition {
    pub fn equals<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operator: Operator::Equals,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn all() -> Self {
        Self {
            operator: Operator::All,
            values: Vec::new(),
        }
    }

    /// Whether this condition admits `value`
    pub fn grants(&self, value: &str) -> bool {
        match self.operator {
            Operator::All => true,
            Operator::Equals => self.values.iter().any(|v| v == value),
        }
    }
}

/// A named scope rule with ordered conditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub name: RuleName,

    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Rule {
    pub fn new(name: RuleName, conditions: Vec<Condition>) -> Self {
        Self { name, conditions }
    }

    /// True if any condition carries the `All` operator
    pub fn is_wildcard(&self) -> bool {
        self.conditions.iter().any(|c| c.operator == Operator::All)
    }

    /// IDs granted by this rule.
    ///
    /// A wildcard anywhere in the conditions makes the grant unrestricted;
    /// otherwise the grant is the union of all enumerated values.
    pub fn granted_ids(&self) -> ResolvedIds {
        if self.is_wildcard() {
            return ResolvedIds::Unrestricted;
        }

        ResolvedIds::enumerated(
            self.conditions
                .iter()
                .flat_map(|c| c.values.iter().cloned()),
        )
    }
}

/// All rules attached to a caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleGroup {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleGroup {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Look up a rule by name. When a name repeats, the last rule wins.
    pub fn rule(&self, name: RuleName) -> Option<&Rule> {
        self.rules.iter().rev().find(|r| r.name == name)
    }

    /// The caller's own grant for `name`
    pub fn granted_ids(&self, name: RuleName) -> Result<ResolvedIds, RuleError> {
        self.rule(name)
            .map(Rule::granted_ids)
            .ok_or(RuleError::RuleNotFound(name))
    }

    /// Whether the rule for `name` is a wildcard grant
    pub fn has_wildcard(&self, name: RuleName) -> Result<bool, RuleError> {
        self.rule(name)
            .map(Rule::is_wildcard)
            .ok_or(RuleError::RuleNotFound(name))
    }
}
