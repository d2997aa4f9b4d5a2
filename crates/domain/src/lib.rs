pub mod clock;
pub mod entities;
pub mod messaging;
pub mod requests;
pub mod task_description;

pub use clock::*;
pub use entities::*;
pub use fleet_errors::{DispatchError, DispatchResult};
pub use messaging::*;
pub use requests::*;
pub use task_description::*;
