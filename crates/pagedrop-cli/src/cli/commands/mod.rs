//! CLI command handlers, one per file.

mod classify;
mod fetch;
mod navigate;
mod open;
mod persist;
mod script;
mod serve;

pub use classify::run_classify;
pub use fetch::run_fetch;
pub use navigate::run_navigate;
pub use open::run_open;
pub use persist::run_persist;
pub use script::run_script;
pub use serve::run_serve;
