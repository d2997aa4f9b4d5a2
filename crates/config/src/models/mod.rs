pub mod app_config;
pub mod dispatch;
pub mod embedded;
pub mod logging;
pub mod transport;

pub use app_config::*;
pub use dispatch::*;
pub use embedded::*;
pub use logging::*;
pub use transport::*;
