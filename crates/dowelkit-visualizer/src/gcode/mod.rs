//! G-code reading.

pub mod decoder;

pub use decoder::{compare_lines, decode_program, DecodedProgram, GcodeDecodeError, LineMismatch};
