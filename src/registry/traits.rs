/*!
 * Registry Traits
 * What a tracked object may expose to the census
 */

use crate::core::types::{short_type_name, Position, TypeKey};
use std::borrow::Cow;

/// An object whose population is counted by the census
///
/// Only [`type_name`](Trackable::type_name) is needed for counting; the
/// other hooks feed the optional per-instance detail.
pub trait Trackable: Send + Sync + 'static {
    /// Base type name used for grouping
    fn type_name(&self) -> Cow<'static, str> {
        Cow::Borrowed(short_type_name(std::any::type_name::<Self>()))
    }

    /// Sub-kind discriminator counted separately from the base type
    fn variant(&self) -> Option<Cow<'_, str>> {
        None
    }

    /// Stable numeric or string identifier, if the object has one
    fn instance_id(&self) -> Option<String> {
        None
    }

    /// Human-readable code appended to the identifier
    fn label(&self) -> Option<String> {
        None
    }

    /// World position, if the object has one
    fn position(&self) -> Option<Position> {
        None
    }

    /// Grouping key: base name plus variant suffix
    fn type_key(&self) -> TypeKey {
        TypeKey::with_variant(&self.type_name(), self.variant().as_deref())
    }
}
