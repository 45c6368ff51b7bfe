/*!
 * Sizing Module
 * Best-effort per-type byte estimates from declared field layouts
 */

pub mod estimator;
pub mod layout;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use estimator::SizeEstimator;
pub use layout::LayoutTable;
pub use traits::*;
pub use types::*;
