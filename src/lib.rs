pub mod app;
pub mod cli;
pub mod embedded;
pub mod shutdown;

pub use app::{exit_code, Application};
pub use cli::{build_cli, parse_command, parse_global, DispatchCommand, GlobalOptions};
