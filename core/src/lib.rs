// #![warn(clippy::pedantic)]

// #![warn(clippy::nursery)]
// #![warn(clippy::cargo)]
#![warn(clippy::complexity)]
#![warn(clippy::correctness)]
#![warn(clippy::perf)]
#![warn(clippy::style)]
#![warn(clippy::suspicious)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
// #![warn(clippy::todo)]
// #![warn(clippy::unimplemented)]
// #![warn(clippy::dbg_macro)]
// #![warn(clippy::unreachable)]
// #![warn(clippy::panic)]

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod axis;
pub mod direction;
pub mod error;
pub mod geom;
pub mod layout;
pub mod mem;
pub mod metadata;
pub mod ops;
pub mod reader;
pub mod source;
pub mod subcube;

#[cfg(test)]
mod testdata;

pub use error::{Error, ErrorKind, Result, ValidationError};
pub use metadata::MetadataHandle;
pub use ops::BinaryOperator;
pub use reader::{CubeLocation, CubeReader, CubeStore, Interpolation, Voxel};
pub use source::{DataHandle, DataSource};
