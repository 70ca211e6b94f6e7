use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Marker key used to carry an unknown value through JSON plan files.
pub const UNKNOWN_MARKER: &str = "$unknown";

/// A single attribute of a plan or state record.
///
/// Plans distinguish a value that will only be known after apply
/// (`Unknown`) from one the configuration leaves out (`Null`). Persisted
/// state never holds `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attr<T> {
    Unknown,
    Null,
    Known(T),
}

impl<T> Default for Attr<T> {
    fn default() -> Self {
        Attr::Null
    }
}

impl<T> Attr<T> {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Attr::Unknown)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Attr::Null)
    }

    /// True when a concrete value is present.
    pub fn has_value(&self) -> bool {
        matches!(self, Attr::Known(_))
    }

    pub fn known(&self) -> Option<&T> {
        match self {
            Attr::Known(v) => Some(v),
            _ => None,
        }
    }

    /// The known value, or [`CoreError::MissingField`] naming `field`.
    pub fn require(&self, field: &str) -> Result<&T, CoreError> {
        self.known()
            .ok_or_else(|| CoreError::MissingField(field.to_string()))
    }

    pub fn as_ref(&self) -> Attr<&T> {
        match self {
            Attr::Unknown => Attr::Unknown,
            Attr::Null => Attr::Null,
            Attr::Known(v) => Attr::Known(v),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Attr<U> {
        match self {
            Attr::Unknown => Attr::Unknown,
            Attr::Null => Attr::Null,
            Attr::Known(v) => Attr::Known(f(v)),
        }
    }

    /// Replace `Unknown` with `Null`. Used when a computed value never
    /// arrived from the API.
    pub fn resolve_unknown(self) -> Self {
        match self {
            Attr::Unknown => Attr::Null,
            other => other,
        }
    }
}

impl Attr<String> {
    /// Known and not the empty string.
    pub fn has_text(&self) -> bool {
        matches!(self, Attr::Known(s) if !s.is_empty())
    }

    pub fn as_str(&self) -> Option<&str> {
        self.known().map(String::as_str)
    }

    /// The value, or the empty string when unset. Convenient for error
    /// messages and URL building where an absent id simply reads as blank.
    pub fn str_or_empty(&self) -> &str {
        self.as_str().unwrap_or_default()
    }
}

impl<T> From<Option<T>> for Attr<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Attr::Known(v),
            None => Attr::Null,
        }
    }
}

impl<T: Serialize> Attr<T> {
    /// Render for diagnostics: JSON for known values, `<null>` / `<unknown>`
    /// otherwise.
    pub fn render(&self) -> String {
        match self {
            Attr::Unknown => "<unknown>".to_string(),
            Attr::Null => "<null>".to_string(),
            Attr::Known(v) => {
                serde_json::to_string(v).unwrap_or_else(|_| "<unrenderable>".to_string())
            }
        }
    }
}

impl<T: Serialize> fmt::Display for Attr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl<T: Serialize> Serialize for Attr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Attr::Unknown => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(UNKNOWN_MARKER, &true)?;
                map.end()
            }
            Attr::Null => serializer.serialize_none(),
            Attr::Known(v) => v.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Attr<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        if is_unknown_marker(&raw) {
            return Ok(Attr::Unknown);
        }
        if raw.is_null() {
            return Ok(Attr::Null);
        }
        serde_json::from_value(raw)
            .map(Attr::Known)
            .map_err(serde::de::Error::custom)
    }
}

fn is_unknown_marker(raw: &serde_json::Value) -> bool {
    raw.as_object().is_some_and(|obj| {
        obj.len() == 1 && obj.get(UNKNOWN_MARKER) == Some(&serde_json::Value::Bool(true))
    })
}
