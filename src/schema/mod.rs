//! Schema module - Questions, target profiles, configuration and result types.

mod config;
mod question;
mod result;
mod target;

pub use config::*;
pub use question::*;
pub use result::*;
pub use target::*;
