//! # Fleet Testing Utils
//!
//! 派发相关各 crate 共用的测试工具：内存 mock、测试数据构建器和常用等待辅助。
//!
//! ```toml
//! [dev-dependencies]
//! fleet-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use helpers::*;
pub use mocks::*;
