//! # IronProto
//!
//! Build-time protocol compilation for Rust.
//!
//! Protocols are written either in a compact interface-definition language
//! (`.idl`) or directly in the canonical JSON form (`.schema`). IronProto
//! lowers the former into the latter and generates Rust types and a
//! protocol trait for each.
//!
//! ## Quick Start
//!
//! ```ignore
//! // build.rs
//! use ironproto::prelude::*;
//!
//! fn main() -> Result<(), BuildError> {
//!     ProtocolCompiler::from_cargo_env()?
//!         .exclude("drafts/**")
//!         .run(&mut CargoHost::new())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Crate Organization
//!
//! - [`schema`] - Protocol model, canonical form, IDL lowering, validation
//! - [`codegen`] - Rust code generation from canonical schemas
//! - [`build`] - Discovery, staged compilation and workspace handling

pub mod prelude;

/// Protocol model, canonical form and IDL lowering.
pub mod schema {
    pub use ironproto_schema::*;
}

/// Rust code generation from canonical schemas.
pub mod codegen {
    pub use ironproto_codegen::*;
}

/// Build pipeline.
pub mod build {
    pub use ironproto_build::*;
}

// Re-export commonly used items at the crate root
pub use ironproto_build::{BuildError, BuildReport, ProtocolCompiler};
pub use ironproto_schema::{Protocol, parse_idl, parse_protocol};
