//! Transfer policy split into types (rates, categories, quotes) and the
//! rule-evaluation engine.

pub mod engine;
pub mod types;

pub use engine::*;
pub use types::*;
