/*!
 * Registry Module
 * Weak tracking of live object populations
 */

pub mod handle;
pub mod registry;
pub mod traits;

// Re-export for convenience
pub use handle::WeakHandle;
pub use registry::{RegistryStats, WeakRegistry};
pub use traits::*;
