//! Quill Security Crate
//!
//! This crate holds the sanitizer policy: which tags are destroyed, which
//! attributes survive, and which URI schemes are never allowed in a link or
//! resource attribute.

pub mod defaults;
pub mod error;
pub mod matcher;
pub mod policy;

pub use error::{SecurityError, SecurityResult};
pub use matcher::{NameMatcher, NameRule, SchemeMatcher};
pub use policy::{PolicyTables, SanitizerPolicy, SanitizerPolicyBuilder};
