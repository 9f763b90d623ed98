//! Ownership, referential-integrity and permission decisions for mutating
//! a record. The two remote checks fail closed; the evaluator is pure.

mod dependency;
mod evaluator;
mod outcome;
mod ownership;
mod policy;

pub use dependency::{edges_into, Dependent, DependencyChecker, DependencyEdge, DependencyQuery, DependencyReport, DEPENDENCY_EDGES};
pub use evaluator::{evaluate, Action, PermissionDecision, PermissionEvaluator, PermissionInputs};
pub use outcome::CheckOutcome;
pub use ownership::OwnershipResolver;
pub use policy::{FieldLock, FieldRule, FieldRuleTable, RuleEntry, RuleKey};
