//! Explicit "unavailable" sentinel for values that may be missing

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Display token for any value that could not be retrieved or parsed
pub const UNAVAILABLE: &str = "N/A";

/// A value that was either retrieved or is explicitly unavailable
///
/// Distinct from zero and from the empty string: `Present(0.0)` is a real
/// value, `Unavailable` means the source never produced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field<T> {
    Present(T),
    Unavailable,
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Unavailable
    }
}

impl<T> Field<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Self::Present(value) => Field::Present(value),
            Self::Unavailable => Field::Unavailable,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Self::Present(value) => Field::Present(f(value)),
            Self::Unavailable => Field::Unavailable,
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Field<U>) -> Field<U> {
        match self {
            Self::Present(value) => f(value),
            Self::Unavailable => Field::Unavailable,
        }
    }

    /// Keep `self` if present, otherwise fall back to `other`
    pub fn or(self, other: Field<T>) -> Field<T> {
        match self {
            Self::Present(_) => self,
            Self::Unavailable => other,
        }
    }

    pub fn or_else(self, f: impl FnOnce() -> Field<T>) -> Field<T> {
        match self {
            Self::Present(_) => self,
            Self::Unavailable => f(),
        }
    }

    /// Borrow the value, if any
    pub fn present(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Unavailable => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Unavailable => None,
        }
    }

    /// Render with `f`, or the fixed sentinel token
    pub fn display_with(&self, f: impl FnOnce(&T) -> String) -> String {
        match self {
            Self::Present(value) => f(value),
            Self::Unavailable => UNAVAILABLE.to_string(),
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Present(value),
            None => Self::Unavailable,
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Present(value) => value.serialize(serializer),
            Self::Unavailable => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}
