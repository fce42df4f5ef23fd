pub mod types;
pub mod config;
pub mod error;

pub use types::*;
pub use config::{Config, SourceKind};
pub use error::CommentWatchError;
