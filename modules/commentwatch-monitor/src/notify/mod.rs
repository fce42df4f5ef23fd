pub mod backend;
pub mod log;
pub mod slack;

pub use backend::CommentReporter;
