//! Rust code generation modules.

pub mod enums;
pub mod messages;
pub mod types;

pub use enums::EnumGenerator;
pub use messages::MessageGenerator;
pub use types::{TypeGenerator, TypeMapper};
