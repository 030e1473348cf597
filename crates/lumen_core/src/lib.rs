//! Lumen Core
//!
//! Foundational types shared by every Lumen crate:
//!
//! - [`errors`]: the [`LumenError`] type and the crate-wide [`Result`] alias
//! - [`handles`]: slotmap keys addressing nodes, materials and programs
//! - [`interner`]: global string interner backing shader define symbols

pub mod errors;
pub mod handles;
pub mod interner;

pub use errors::{LumenError, Result};
pub use handles::{MaterialHandle, NodeHandle, ProgramHandle};
pub use interner::Symbol;
