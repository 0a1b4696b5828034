// Serial acquisition for pulsetone: line parsing, the serial channel,
// and the curve-to-tone pipeline loop.

pub mod error;
pub mod parser;
pub mod reader;
pub mod serial;

pub use error::AcquireError;
pub use parser::CurveParser;
pub use reader::{AcquireShared, Pipeline, ReaderHandle, spawn_reader};
pub use serial::{LineSource, SerialSource};
