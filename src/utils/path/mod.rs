//! Path utilities.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `resolve_path`)
//! - [`route`]: Web paths and suffix handling (`web_path`, `replace_suffix`, `has_suffix`)

pub mod fs;
pub mod route;

pub use fs::{normalize_path, resolve_path};
pub use route::{has_suffix, replace_suffix, web_path};
