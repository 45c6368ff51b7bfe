/*!
 * Layout Table
 * In-process oracle fed by the host at registration time
 */

use super::traits::{DescribeLayout, SizeOracle};
use super::types::TypeLayout;
use crate::core::types::{short_type_name, TypeKey};
use ahash::{HashMap, HashMapExt};
use parking_lot::RwLock;
use tracing::debug;

/// Layouts declared per type name
///
/// Lookups try the full key first so a variant may declare its own layout,
/// then fall back to the base type name.
#[derive(Debug, Default)]
pub struct LayoutTable {
    layouts: RwLock<HashMap<String, TypeLayout>>,
}

impl LayoutTable {
    pub fn new() -> Self {
        Self {
            layouts: RwLock::new(HashMap::new()),
        }
    }

    /// Declare the layout for a type name (or a full `Base#variant` key)
    pub fn declare(&self, name: impl Into<String>, layout: TypeLayout) {
        let name = name.into();
        debug!(type_name = %name, fields = layout.fields.len(), "Layout declared");
        self.layouts.write().insert(name, layout);
    }

    /// Declare the layout of `T` under its short type name
    pub fn describe<T: DescribeLayout>(&self) {
        self.declare(short_type_name(std::any::type_name::<T>()), T::layout());
    }

    pub fn len(&self) -> usize {
        self.layouts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.read().is_empty()
    }
}

impl SizeOracle for LayoutTable {
    fn layout(&self, key: &TypeKey) -> Option<TypeLayout> {
        let layouts = self.layouts.read();
        layouts
            .get(key.as_str())
            .or_else(|| layouts.get(key.base()))
            .cloned()
    }
}
