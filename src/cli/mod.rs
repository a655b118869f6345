pub mod command;
pub mod convert;
