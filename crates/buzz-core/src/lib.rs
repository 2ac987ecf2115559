pub mod config;
pub mod error;
pub mod types;

pub use config::BuzzConfig;
pub use error::{BuzzError, Result};
pub use types::{Message, Role};
