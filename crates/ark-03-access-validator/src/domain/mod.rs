//! # Domain Layer

pub mod entities;
pub mod rules;

pub use entities::ValidationRule;
pub use rules::RuleBook;
