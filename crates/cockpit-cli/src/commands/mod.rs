//! Command implementations.

pub mod configure;
pub mod ports;
pub mod run;
