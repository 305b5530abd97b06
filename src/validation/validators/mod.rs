//! Stateless checks used by the rule chains.

pub mod file;
pub mod text;
