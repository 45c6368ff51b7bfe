/*!
 * Sizing Types
 * Field classification and type layouts
 */

use crate::core::limits::*;
use serde::{Deserialize, Serialize};

/// Storage class of a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Bool,
    Byte,
    Short,
    Char,
    Int,
    Float,
    Long,
    Double,
    Decimal,
    Text,
    /// Pointer-sized handle to another object
    Reference,
    /// Anything the oracle cannot classify further
    Other,
}

impl FieldKind {
    /// Fixed byte cost charged for one field of this kind
    pub const fn cost(self) -> u64 {
        match self {
            FieldKind::Bool | FieldKind::Byte => BYTE_FIELD_COST,
            FieldKind::Short | FieldKind::Char => SHORT_FIELD_COST,
            FieldKind::Int | FieldKind::Float => INT_FIELD_COST,
            FieldKind::Long | FieldKind::Double => LONG_FIELD_COST,
            FieldKind::Decimal => DECIMAL_FIELD_COST,
            FieldKind::Text => TEXT_FIELD_COST,
            FieldKind::Reference | FieldKind::Other => REFERENCE_FIELD_COST,
        }
    }

    pub const fn is_primitive(self) -> bool {
        !matches!(self, FieldKind::Reference | FieldKind::Other)
    }
}

/// Declared field layout of a type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeLayout {
    pub fields: Vec<FieldKind>,
}

impl TypeLayout {
    pub fn new(fields: impl IntoIterator<Item = FieldKind>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Sum of per-field costs
    pub fn summed_size(&self) -> u64 {
        self.fields.iter().map(|f| f.cost()).sum()
    }
}
