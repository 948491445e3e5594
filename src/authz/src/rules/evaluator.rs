//! Rule evaluation capability

use std::collections::HashMap;
use std::sync::Arc;

use super::types::{Rule, RuleGroup, RuleName};
use crate::error::RuleError;

/// Type alias for a shared rule evaluator
pub type RuleEvaluatorRef = Arc<dyn RuleEvaluator>;

/// Decides whether a caller's rules grant access to a resource
///
/// `attributes` describes the resource (e.g. `{"hub_id": "h1"}`); `names`
/// selects which of the caller's rules must grant it.
pub trait RuleEvaluator: Send + Sync {
    fn rule_valid(
        &self,
        group: &RuleGroup,
        attributes: &HashMap<String, String>,
        names: &[RuleName],
    ) -> Result<bool, RuleError>;
}

/// Evaluator over `Equals`/`All` conditions
///
/// Every named rule must exist and grant every attribute value. A missing rule
/// is an error, not a denial.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn rule_grants(rule: &Rule, attributes: &HashMap<String, String>) -> bool {
        if rule.is_wildcard() {
            return true;
        }

        !attributes.is_empty()
            && attributes
                .values()
                .all(|value| rule.conditions.iter().any(|c| c.grants(value)))
    }
}

impl RuleEvaluator for ConditionEvaluator {
    fn rule_valid(
        &self,
        group: &RuleGroup,
        attributes: &HashMap<String, String>,
        names: &[RuleName],
    ) -> Result<bool, RuleError> {
        if names.is_empty() {
            return Err(RuleError::Evaluation("no rule names requested".to_string()));
        }

        for name in names {
            let rule = group.rule(*name).ok_or(RuleError::RuleNotFound(*name))?;
            if !Self::rule_grants(rule, attributes) {
                return Ok(false);
            }
        }

        Ok(true)
    }
}
