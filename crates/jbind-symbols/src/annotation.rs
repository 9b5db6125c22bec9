//! Annotation instances.
//!
//! Annotation bindings are built on demand and never interned: two bindings
//! are equal when they have the same annotation type and the same
//! element-value pairs, compared deeply and regardless of pair order.

use crate::ids::TypeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Compile-time constant element value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Constant {
    Boolean(bool),
    Char(char),
    Integer(i64),
    Double(f64),
    String(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ElementValue {
    Constant(Constant),
    EnumConstant { enum_type: TypeId, name: Arc<str> },
    TypeLiteral(TypeId),
    Annotation(Box<AnnotationBinding>),
    Array(Vec<ElementValue>),
}

impl ElementValue {
    pub fn enum_constant(enum_type: TypeId, name: &str) -> Self {
        ElementValue::EnumConstant {
            enum_type,
            name: Arc::from(name),
        }
    }

    /// Name of the constant when this is an enum constant.
    pub fn as_enum_constant(&self) -> Option<&str> {
        match self {
            ElementValue::EnumConstant { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ElementValue]> {
        match self {
            ElementValue::Array(values) => Some(values),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationBinding {
    pub annotation_type: TypeId,
    /// Element name to value. `IndexMap` equality ignores order.
    pub pairs: IndexMap<Arc<str>, ElementValue>,
}

impl AnnotationBinding {
    /// A marker annotation (no element-value pairs).
    pub fn marker(annotation_type: TypeId) -> Self {
        Self {
            annotation_type,
            pairs: IndexMap::new(),
        }
    }

    pub fn with_pair(mut self, name: &str, value: ElementValue) -> Self {
        self.pairs.insert(Arc::from(name), value);
        self
    }

    pub fn value_of(&self, name: &str) -> Option<&ElementValue> {
        self.pairs.get(name)
    }

    /// The conventional single `value` element.
    pub fn value(&self) -> Option<&ElementValue> {
        self.value_of("value")
    }
}
