//! Read-only state inspection.
//!
//! Debuggers and scripts look at emulator state through dotted query
//! paths. A query never changes emulation state.

use std::fmt;

/// A dynamically-typed value returned by a state query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U64(u64),
    String(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "${v:02X}"),
            Value::U16(v) => write!(f, "${v:04X}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Bytes(bytes) => {
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{b:02X}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::U16(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// A component whose state can be inspected by path.
pub trait Observable {
    /// Query a property by dotted path, e.g. `pc`, `flags.z`, `bus.scanline`.
    ///
    /// Returns `None` if the path is not recognised.
    fn query(&self, path: &str) -> Option<Value>;

    /// All paths accepted by `query()`. Entries written as `<...>` are
    /// patterns rather than literal paths.
    fn query_paths(&self) -> &'static [&'static str];
}
