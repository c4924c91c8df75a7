//! Block-mapped flash translation layer over an in-memory NAND stand-in.
//!
//! Logical blocks are bound to physical blocks one to one. Writing a page
//! that already holds data relocates the whole block out of place; when no
//! physical block is free, one greedy garbage-collection pass is attempted
//! before the write fails with [`FtlError::NoFreeBlock`].

#[macro_use]
extern crate log;

pub mod config;
pub mod error;
pub mod flash;
pub mod ftl;
mod gc;
pub mod map;
pub mod stats;

pub use config::Geometry;
pub use error::{FtlError, Result};
pub use ftl::Ftl;
pub use stats::Stats;
