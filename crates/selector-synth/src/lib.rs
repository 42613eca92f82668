//! Selector synthesis
//!
//! Computes a short, human-readable locator for a DOM element:
//! - Attribute candidates (test ids, ARIA, input/img attributes)
//! - Own-text candidates through the `text` engine
//! - Readable ids, rejecting generated ones
//! - Greedy ancestor walk validated against the live DOM
//! - Structural XPath fallback when no attribute path resolves

pub mod candidate;
pub mod dom;
pub mod errors;
pub mod query;
pub mod resolver;
pub mod snapshot;
pub mod types;
pub mod xpath;

pub use candidate::{build_candidate, is_guid_like};
pub use dom::{DomChild, DomElement, SelectorQuery};
pub use errors::*;
pub use resolver::*;
pub use snapshot::{DomSnapshot, SnapshotElement};
pub use types::*;
pub use xpath::build_xpath;
