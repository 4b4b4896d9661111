//! Typed entry values
//!
//! A value is immutable once constructed: changing an entry replaces its
//! value wholesale, it never mutates a payload in place. This keeps reads
//! torn-free under concurrent access without per-payload locking.

use bytes::Bytes;

/// Value kind classification
///
/// Each kind maps to a single bit so that sets of kinds can be expressed
/// as a [`KindMask`]. `Unassigned` deliberately has no bit: an unassigned
/// entry only matches the `ANY` mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueKind {
    Unassigned = 0x00,
    Boolean = 0x01,
    Double = 0x02,
    Str = 0x04,
    Raw = 0x08,
    BooleanArray = 0x10,
    DoubleArray = 0x20,
    StringArray = 0x40,
    Rpc = 0x80,
}

impl ValueKind {
    #[inline]
    pub fn bit(self) -> u8 {
        self as u8
    }

    pub fn from_bit(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(ValueKind::Unassigned),
            0x01 => Some(ValueKind::Boolean),
            0x02 => Some(ValueKind::Double),
            0x04 => Some(ValueKind::Str),
            0x08 => Some(ValueKind::Raw),
            0x10 => Some(ValueKind::BooleanArray),
            0x20 => Some(ValueKind::DoubleArray),
            0x40 => Some(ValueKind::StringArray),
            0x80 => Some(ValueKind::Rpc),
            _ => None,
        }
    }
}

/// Bitset over value kinds, used by enumeration queries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KindMask(pub u8);

impl KindMask {
    /// Matches every kind, including `Unassigned`
    pub const ANY: KindMask = KindMask(0xFF);

    #[inline]
    pub fn of(kind: ValueKind) -> Self {
        KindMask(kind.bit())
    }

    #[inline]
    pub fn with(self, kind: ValueKind) -> Self {
        KindMask(self.0 | kind.bit())
    }

    /// Check whether a kind is selected by this mask
    #[inline]
    pub fn matches(self, kind: ValueKind) -> bool {
        self.0 == Self::ANY.0 || self.0 & kind.bit() != 0
    }
}

impl Default for KindMask {
    fn default() -> Self {
        KindMask::ANY
    }
}

/// A single typed value
///
/// The payload variant and the kind are one and the same, so they cannot
/// disagree. `Raw` and `Rpc` use [`Bytes`] because values are cloned into
/// every listener event and outbound update.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Unassigned,
    Boolean(bool),
    Double(f64),
    Str(String),
    Raw(Bytes),
    BooleanArray(Vec<bool>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<String>),
    /// RPC definition blob, opaque to the table
    Rpc(Bytes),
}

impl Value {
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Unassigned => ValueKind::Unassigned,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Double(_) => ValueKind::Double,
            Value::Str(_) => ValueKind::Str,
            Value::Raw(_) => ValueKind::Raw,
            Value::BooleanArray(_) => ValueKind::BooleanArray,
            Value::DoubleArray(_) => ValueKind::DoubleArray,
            Value::StringArray(_) => ValueKind::StringArray,
            Value::Rpc(_) => ValueKind::Rpc,
        }
    }

    #[inline]
    pub fn is_unassigned(&self) -> bool {
        matches!(self, Value::Unassigned)
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Bytes> {
        match self {
            Value::Raw(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_boolean_array(&self) -> Option<&[bool]> {
        match self {
            Value::BooleanArray(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_double_array(&self) -> Option<&[f64]> {
        match self {
            Value::DoubleArray(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_string_array(&self) -> Option<&[String]> {
        match self {
            Value::StringArray(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_rpc(&self) -> Option<&Bytes> {
        match self {
            Value::Rpc(b) => Some(b),
            _ => None,
        }
    }
}
