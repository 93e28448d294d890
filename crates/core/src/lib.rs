//! `tokengate-core`: identifiers and errors shared by every other crate.
//!
//! Nothing in here knows about tokens, HTTP or storage.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{IssueId, ProjectId, UserId};
