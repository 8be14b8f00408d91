//! Bounds-checked little-endian reads and writes over `bytes` buffers,
//! shared by the wire codec of the transport crates.

mod error;
mod io;

pub use error::{BinaryError, Result};
pub use io::{BinaryReader, BinaryWriter};
