//! Wallet CLI driver - drive an interactive CLI wallet from automated tests.

pub mod config;
pub mod driver;
