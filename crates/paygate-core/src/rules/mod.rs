//! Rule Engine.

mod defaults;
mod engine;

pub use defaults::default_rules;
pub use engine::{Alternative, Evaluation, RuleEngine, RuleFile};
