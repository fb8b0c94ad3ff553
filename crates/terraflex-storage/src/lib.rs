//! Storage drivers: local directory, git-branch-locked repository, and
//! read-only environment variables, exposed uniformly through
//! [`DriverHandle`].

pub mod envvar;
pub mod git;
pub mod local;
pub mod traits;

pub use envvar::{EnvVarDriver, EnvVarKey};
pub use git::{GitDriver, GitKey};
pub use local::{LocalDriver, LocalKey};
pub use traits::{DriverHandle, Lockable, Readable, Writable};
