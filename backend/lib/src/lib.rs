//! ComputerChan backend library
//!
//! Wallet signature login, NFT holder profiles and the client session that
//! consumes them.

pub mod api;
pub mod client;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod log;
pub mod models;
pub mod services;
#[cfg(any(test, feature = "mocks"))]
pub mod test_utils;
pub mod utils;

pub use api::create_app;
pub use config::Config;
pub use error::{Error, Result};
