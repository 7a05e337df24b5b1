use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A set of named attribute values.
pub type Attrs = BTreeMap<String, Value>;

/// A dynamically-typed attribute value.
///
/// Integers of every width are stored as `i64`, so a value written as a `u8` reads back as any
/// integer type it fits in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<Value>),
    Map(Attrs),
}

impl Value {
    /// A short name for the type of this value, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Attrs> {
        match self {
            Self::Map(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(value) => Some(value),
            _ => None,
        }
    }
}

/// Return a deep copy of `attrs`.
///
/// Nested maps and lists are copied element-wise; the result shares no state with the input.
pub fn copy_attributes(attrs: &Attrs) -> Attrs {
    attrs
        .iter()
        .map(|(name, value)| (name.clone(), copy_value(value)))
        .collect()
}

fn copy_value(value: &Value) -> Value {
    match value {
        Value::Bool(value) => Value::Bool(*value),
        Value::Int(value) => Value::Int(*value),
        Value::String(value) => Value::String(value.clone()),
        Value::List(values) => Value::List(values.iter().map(copy_value).collect()),
        Value::Map(attrs) => Value::Map(copy_attributes(attrs)),
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Attrs> for Value {
    fn from(value: Attrs) -> Self {
        Self::Map(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

macro_rules! impl_from_lossless_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_lossless_int!(i8, i16, i32, i64, u8, u16, u32);

/// Decode a typed value out of an attribute [`Value`].
///
/// This is the receiving end of every attribute read: the caller names the type it expects, and
/// decoding fails (with `None`) if the stored value has a different type. No coercion happens
/// between strings, booleans, and integers; integers convert between widths only when the stored
/// value fits the requested type.
pub trait FromAttr: Sized {
    fn from_attr(value: &Value) -> Option<Self>;
}

impl FromAttr for Value {
    fn from_attr(value: &Value) -> Option<Self> {
        Some(copy_value(value))
    }
}

impl FromAttr for String {
    fn from_attr(value: &Value) -> Option<Self> {
        value.as_str().map(ToString::to_string)
    }
}

impl FromAttr for bool {
    fn from_attr(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl FromAttr for Attrs {
    fn from_attr(value: &Value) -> Option<Self> {
        value.as_map().map(copy_attributes)
    }
}

impl<T: FromAttr> FromAttr for Vec<T> {
    fn from_attr(value: &Value) -> Option<Self> {
        value.as_list()?.iter().map(T::from_attr).collect()
    }
}

macro_rules! impl_from_attr_int {
    ($($ty:ty),*) => {
        $(
            impl FromAttr for $ty {
                fn from_attr(value: &Value) -> Option<Self> {
                    match value {
                        Value::Int(value) => <$ty>::try_from(*value).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_from_attr_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
