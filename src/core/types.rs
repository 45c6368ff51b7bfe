/*!
 * Core Types
 * Common types used across the census
 */

use serde::{Deserialize, Serialize};
use smartstring::alias::String as SmartString;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Separator between a base type name and its variant discriminator
pub const VARIANT_SEPARATOR: char = '#';

/// Grouping key for a tracked kind of object
///
/// A base type name, optionally refined by a variant discriminator
/// (`Zombie#elite`) so distinct sub-kinds of one type count separately.
/// Short keys are stored inline without allocation.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(SmartString);

impl TypeKey {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(SmartString::from(name.as_ref()))
    }

    /// Build a key from a base name and an optional variant
    pub fn with_variant(base: &str, variant: Option<&str>) -> Self {
        match variant {
            Some(v) if !v.is_empty() => {
                let mut key = SmartString::from(base);
                key.push(VARIANT_SEPARATOR);
                key.push_str(v);
                Self(key)
            }
            _ => Self::new(base),
        }
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Base type name without the variant suffix
    pub fn base(&self) -> &str {
        match self.0.split_once(VARIANT_SEPARATOR) {
            Some((base, _)) => base,
            None => self.as_str(),
        }
    }

    /// Variant discriminator, if any
    pub fn variant(&self) -> Option<&str> {
        self.0.split_once(VARIANT_SEPARATOR).map(|(_, v)| v)
    }

    /// Case-insensitive substring match
    pub fn contains_ignore_case(&self, fragment: &str) -> bool {
        if fragment.is_empty() {
            return true;
        }
        self.as_str()
            .to_lowercase()
            .contains(&fragment.to_lowercase())
    }
}

// Eq/Ord/Hash go through `str` so `Borrow<str>` lookups stay consistent.
impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for TypeKey {}

impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl Borrow<str> for TypeKey {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for TypeKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for TypeKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TypeKey {
    fn from(s: String) -> Self {
        Self(SmartString::from(s))
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({:?})", self.as_str())
    }
}

/// Integer world position exposed by some tracked objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Strip module path and generic arguments from a `std::any::type_name`
///
/// `my_app::world::Zombie` becomes `Zombie`, `alloc::vec::Vec<u8>` becomes `Vec`.
pub fn short_type_name(full: &str) -> &str {
    let head = full.split('<').next().unwrap_or(full);
    head.rsplit("::").next().unwrap_or(head)
}
