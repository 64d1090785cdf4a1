//! Configuration for the wallet driver.

mod driver_config;

pub use driver_config::*;
