//! Java-specific algorithms over the type model.
//!
//! Everything here is side-effect free with respect to the [`crate::TypeEnv`]: functions take a
//! shared reference and allocate nothing in the store. The formatters are "Java-like" and stable,
//! intended for logging and test failure output.

pub mod format;
pub mod helpers;
pub mod hierarchy;
pub mod subtyping;
