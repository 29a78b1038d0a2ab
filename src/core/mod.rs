//! Core types shared across the codebase.

mod driver;
mod state;

pub use driver::Profile;
pub use state::{is_shutdown, setup_shutdown_handler, shutdown_channel};
