pub mod config;
pub mod error;
pub mod types;

pub use config::OlehConfig;
pub use error::{OlehError, Result};
pub use types::*;
