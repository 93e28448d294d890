//! `tokengate-infra`: the data collaborator behind the auth layer.
//!
//! Storage is in-memory only: users, projects, memberships and issues live in
//! maps behind a lock. The auth crate sees this through
//! [`tokengate_auth::MembershipDirectory`]; route handlers use the store traits.

pub mod in_memory;
pub mod password;
pub mod records;
pub mod store;

pub use in_memory::InMemoryDirectory;
pub use password::{PasswordError, hash_password, verify_password};
pub use records::{
    HourlyCount, IssueKind, IssueRecord, NewUser, Page, Pagination, ProjectRecord, ProjectSummary, UserProfile,
    UserRecord,
};
pub use store::{IssueStore, ProjectStore, UserStore};
