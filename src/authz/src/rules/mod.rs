//! Caller entitlements and their evaluation
//!
//! A caller carries a [`RuleGroup`]; each [`Rule`] names a resource type and
//! either enumerates the IDs it grants or carries the wildcard `All` operator.
//!
//! # Examples
//!
//! ```
//! use ims_authz::rules::{Condition, Rule, RuleGroup, RuleName};
//!
//! let group = RuleGroup::new(vec![Rule::new(
//!     RuleName::UserHub,
//!     vec![Condition::equals(["h1", "h2"])],
//! )]);
//!
//! assert!(group.granted_ids(RuleName::UserHub).unwrap().allows("h1"));
//! assert!(group.granted_ids(RuleName::Seller).is_err());
//! ```

mod types;
mod evaluator;


pub use types::{Condition, Operator, Rule, RuleGroup, RuleName};
pub use evaluator::{ConditionEvaluator, RuleEvaluator, RuleEvaluatorRef};
