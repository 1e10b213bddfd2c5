//! Wire types for the pagesmith task server and a small client for it.

pub mod client;
pub mod result;
pub mod types;

pub use client::Client;
pub use result::{ClientError, Result};
