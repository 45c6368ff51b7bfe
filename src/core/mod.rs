/*!
 * Core Module
 * Fundamental census types, limits and error handling
 */

pub mod errors;
pub mod limits;
pub mod serde;
pub mod sharding;
pub mod types;

// Re-export for convenience
pub use errors::*;
pub use sharding::{ShardManager, WorkloadProfile};
pub use types::*;
