mod accounts;
mod elevation;
mod evaluator;
mod rights;

pub use accounts::Actor;
pub use elevation::SecurityElevation;
pub use evaluator::AccessEvaluator;
pub use rights::{AccessPermission, AccessResult, AccessRight};
