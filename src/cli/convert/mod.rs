mod convert_impl;
pub mod progress;
pub mod report;
pub mod worker;

pub use convert_impl::cmd_convert;
