/*!
 * Sizing Traits
 * Pluggable layout resolution
 */

use super::types::TypeLayout;
use crate::core::types::TypeKey;

/// Resolves a type key to its declared field layout
///
/// Returning `None` means the type is unknown to this oracle; the estimator
/// then charges the fallback size.
pub trait SizeOracle: Send + Sync {
    fn layout(&self, key: &TypeKey) -> Option<TypeLayout>;
}

/// Types that can describe their own field layout
pub trait DescribeLayout {
    fn layout() -> TypeLayout;
}

/// Oracle that knows nothing; every type gets the fallback size
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLayouts;

impl SizeOracle for NoLayouts {
    fn layout(&self, _key: &TypeKey) -> Option<TypeLayout> {
        None
    }
}

impl<F> SizeOracle for F
where
    F: Fn(&TypeKey) -> Option<TypeLayout> + Send + Sync,
{
    fn layout(&self, key: &TypeKey) -> Option<TypeLayout> {
        self(key)
    }
}
