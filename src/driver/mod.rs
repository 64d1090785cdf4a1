//! Driver for an interactive CLI wallet: process supervision, the
//! command/response channel and response parsing.

mod channel;
mod controller;
mod drain;
mod parse;
mod process;
mod records;
mod transcript;

pub use channel::*;
pub use controller::*;
pub use drain::*;
pub use parse::*;
pub use process::*;
pub use records::*;
pub use transcript::*;
