/*!
 * Weak Handles
 * Non-owning references to tracked objects
 */

use super::traits::Trackable;
use std::sync::{Arc, Weak};

/// Weak reference to a tracked object plus its identity
///
/// The handle never keeps the object alive. It does keep the `Arc`
/// allocation itself reserved, so the identity address cannot be handed
/// to another object while this handle exists.
#[derive(Clone)]
pub struct WeakHandle {
    target: Weak<dyn Trackable>,
    identity: usize,
}

impl WeakHandle {
    pub fn new<T: Trackable>(object: &Arc<T>) -> Self {
        let strong: Arc<dyn Trackable> = object.clone();
        Self {
            identity: identity_of(object),
            target: Arc::downgrade(&strong),
        }
    }

    /// Address-based identity of the referent
    #[inline]
    pub fn identity(&self) -> usize {
        self.identity
    }

    /// Whether the referent has not been dropped yet
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Strong reference to the referent, if it is still alive
    pub fn upgrade(&self) -> Option<Arc<dyn Trackable>> {
        self.target.upgrade()
    }
}

impl std::fmt::Debug for WeakHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakHandle")
            .field("identity", &format_args!("{:#x}", self.identity))
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Identity of a shared object: the address of its allocation
#[inline]
pub fn identity_of<T: ?Sized>(object: &Arc<T>) -> usize {
    Arc::as_ptr(object) as *const () as usize
}
