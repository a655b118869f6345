//! Utility functions and supporting infrastructure.
//!
//! Provides byte order aware integer I/O and the error types used across
//! parsing, demuxing and conversion.

pub mod byteorder;
pub mod errors;
