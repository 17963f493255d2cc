//! Command Line Interface support.
//!
//! Configuration, output formatting and status reports for the `tsd`
//! operator tool.

pub mod config;
pub mod output;
pub mod status;

pub use config::*;
pub use output::*;
pub use status::*;
