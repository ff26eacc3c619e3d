//! Values stored on the blackboard.
//!
//! [`BlackboardValue`] is a closed tagged union; the tag can never disagree
//! with the payload. [`ValueType`] is its payload-free discriminant, used when
//! callers only need to know what kind of value a key holds.

use std::fmt;

use strum::EnumDiscriminants;

use crate::Vec3;

/// Opaque, non-owning handle to a world object (usually an actor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectRef(pub u64);

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object#{}", self.0)
    }
}

/// Symbolic reference to a type of object (e.g. an actor class).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeRef(pub String);

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single typed value stored under a blackboard key.
#[derive(Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(ValueType), derive(strum::Display, Hash))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlackboardValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
    /// Symbolic name, compared by value (e.g. a state name).
    Name(String),
    Vector(Vec3),
    Object(Option<ObjectRef>),
    Class(Option<TypeRef>),
}

impl BlackboardValue {
    /// Creates a symbolic-name value.
    pub fn name(name: impl Into<String>) -> Self {
        BlackboardValue::Name(name.into())
    }

    /// Returns the discriminant of this value.
    #[inline]
    pub fn value_type(&self) -> ValueType {
        ValueType::from(self)
    }

    /// Numeric view used by comparisons: bools map to 0/1, ints widen to f32.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            BlackboardValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            BlackboardValue::Int(i) => Some(*i as f32),
            BlackboardValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text view used by comparisons: strings and names.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            BlackboardValue::String(s) | BlackboardValue::Name(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for BlackboardValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlackboardValue::Bool(b) => write!(f, "{b}"),
            BlackboardValue::Int(i) => write!(f, "{i}"),
            BlackboardValue::Float(v) => write!(f, "{v:.2}"),
            BlackboardValue::String(s) | BlackboardValue::Name(s) => f.write_str(s),
            BlackboardValue::Vector(v) => write!(f, "{v}"),
            BlackboardValue::Object(Some(o)) => write!(f, "{o}"),
            BlackboardValue::Class(Some(c)) => write!(f, "{c}"),
            BlackboardValue::Object(None) | BlackboardValue::Class(None) => f.write_str("None"),
        }
    }
}

impl From<bool> for BlackboardValue {
    fn from(value: bool) -> Self {
        BlackboardValue::Bool(value)
    }
}

impl From<i32> for BlackboardValue {
    fn from(value: i32) -> Self {
        BlackboardValue::Int(value)
    }
}

impl From<f32> for BlackboardValue {
    fn from(value: f32) -> Self {
        BlackboardValue::Float(value)
    }
}

impl From<String> for BlackboardValue {
    fn from(value: String) -> Self {
        BlackboardValue::String(value)
    }
}

impl From<&str> for BlackboardValue {
    fn from(value: &str) -> Self {
        BlackboardValue::String(value.to_owned())
    }
}

impl From<Vec3> for BlackboardValue {
    fn from(value: Vec3) -> Self {
        BlackboardValue::Vector(value)
    }
}

impl From<ObjectRef> for BlackboardValue {
    fn from(value: ObjectRef) -> Self {
        BlackboardValue::Object(Some(value))
    }
}

impl From<Option<ObjectRef>> for BlackboardValue {
    fn from(value: Option<ObjectRef>) -> Self {
        BlackboardValue::Object(value)
    }
}

impl From<TypeRef> for BlackboardValue {
    fn from(value: TypeRef) -> Self {
        BlackboardValue::Class(Some(value))
    }
}

/// Type-directed extraction from a [`BlackboardValue`].
///
/// Returns `None` when the stored tag differs from the requested type, which
/// lets the blackboard fall back to the caller's default.
pub trait FromBlackboardValue: Sized {
    fn from_value(value: &BlackboardValue) -> Option<Self>;
}

macro_rules! impl_from_value {
    ($ty:ty, $variant:ident) => {
        impl FromBlackboardValue for $ty {
            #[inline]
            fn from_value(value: &BlackboardValue) -> Option<Self> {
                match value {
                    BlackboardValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_from_value!(bool, Bool);
impl_from_value!(i32, Int);
impl_from_value!(f32, Float);
impl_from_value!(String, String);
impl_from_value!(Vec3, Vector);
impl_from_value!(Option<ObjectRef>, Object);
impl_from_value!(Option<TypeRef>, Class);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminant_matches_payload() {
        assert_eq!(BlackboardValue::from(true).value_type(), ValueType::Bool);
        assert_eq!(BlackboardValue::from(3).value_type(), ValueType::Int);
        assert_eq!(BlackboardValue::from(1.5f32).value_type(), ValueType::Float);
        assert_eq!(BlackboardValue::from("a").value_type(), ValueType::String);
        assert_eq!(BlackboardValue::name("Idle").value_type(), ValueType::Name);
        assert_eq!(
            BlackboardValue::from(Vec3::ZERO).value_type(),
            ValueType::Vector
        );
        assert_eq!(
            BlackboardValue::from(ObjectRef(7)).value_type(),
            ValueType::Object
        );
        assert_eq!(
            BlackboardValue::from(TypeRef::new("Goblin")).value_type(),
            ValueType::Class
        );
    }

    #[test]
    fn mismatched_extraction_is_none() {
        let v = BlackboardValue::from(42);
        assert_eq!(i32::from_value(&v), Some(42));
        assert_eq!(f32::from_value(&v), None);
        assert_eq!(bool::from_value(&v), None);
    }

    #[test]
    fn name_is_not_a_string() {
        let v = BlackboardValue::name("Patrol");
        assert_eq!(String::from_value(&v), None);
        assert_eq!(v.as_text(), Some("Patrol"));
    }

    #[test]
    fn numeric_view() {
        assert_eq!(BlackboardValue::from(true).as_number(), Some(1.0));
        assert_eq!(BlackboardValue::from(2).as_number(), Some(2.0));
        assert_eq!(BlackboardValue::from("x").as_number(), None);
    }

    #[test]
    fn display_formats() {
        assert_eq!(BlackboardValue::from(0.5f32).to_string(), "0.50");
        assert_eq!(BlackboardValue::Object(None).to_string(), "None");
        assert_eq!(BlackboardValue::from(ObjectRef(3)).to_string(), "Object#3");
    }
}
