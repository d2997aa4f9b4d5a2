pub mod clock;
pub mod in_memory_bus;

pub use clock::*;
pub use in_memory_bus::*;
