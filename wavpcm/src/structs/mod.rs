//! Data structures produced by parsing and consumed by demuxing and encoding.

pub mod channel;
pub mod descriptor;
