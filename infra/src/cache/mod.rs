//! Code store backends
//!
//! - `InMemoryCodeStore`: sharded concurrent map for single-instance deployments
//! - `RedisCodeStore`: shared store for multi-instance deployments
//! - `ExpirySweeper`: background purge of long-expired in-memory records

pub mod memory_store;
pub mod redis_client;
pub mod redis_code_store;
pub mod sweeper;

pub use memory_store::InMemoryCodeStore;
pub use redis_client::RedisClient;
pub use redis_code_store::RedisCodeStore;
pub use sweeper::{ExpirySweeper, SweepResult, SweeperConfig};
