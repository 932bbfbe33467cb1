//! Shared data model for Spruce content corpora.

pub mod defs;
pub mod normalize;
pub mod validate;

pub use defs::*;
pub use normalize::normalize_id;
pub use validate::{CorpusIssue, Duplicate, IdTable};
