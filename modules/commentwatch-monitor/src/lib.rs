pub mod dedup;
pub mod engagement;
pub mod filter;
pub mod monitor;
pub mod notify;
pub mod recency;
pub mod session;
pub mod sources;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
