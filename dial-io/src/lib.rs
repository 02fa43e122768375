//! Binary I/O primitives shared by the dialVM bytecode loader.
//!
//! This crate provides little-endian binary reading and writing used to
//! decode and encode the `.dsb` bytecode container format.

pub mod binary_reader;
pub mod binary_writer;
pub mod error;

pub use binary_reader::BinaryReader;
pub use binary_writer::BinaryWriter;
pub use error::{IoError, IoResult};
