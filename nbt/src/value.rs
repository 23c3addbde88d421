use indexmap::IndexMap;

/// A complete NBT value. Compounds and Lists are recursively owned.
///
/// This is a dynamic, tagged-variant tree rather than a typed serde model:
/// callers that only care about a handful of known fields (eg a biome
/// palette) walk the tree with the `as_*` accessors instead of describing
/// the whole schema up front. Compounds preserve the order their entries
/// were read in, using an [`IndexMap`] rather than a [`std::collections::HashMap`],
/// so that re-serializing an untouched tree reproduces the original byte
/// layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    ByteArray(Vec<i8>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    List(Vec<Value>),
    Compound(IndexMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Byte(v) => Some(v as i64),
            Value::Short(v) => Some(v as i64),
            Value::Int(v) => Some(v as i64),
            Value::Long(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Compound(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_compound_mut(&mut self) -> Option<&mut IndexMap<String, Value>> {
        match self {
            Value::Compound(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// The NBT [`Tag`] that would be written for this value.
    pub fn tag(&self) -> Tag {
        match self {
            Value::Byte(_) => Tag::Byte,
            Value::Short(_) => Tag::Short,
            Value::Int(_) => Tag::Int,
            Value::Long(_) => Tag::Long,
            Value::Float(_) => Tag::Float,
            Value::Double(_) => Tag::Double,
            Value::String(_) => Tag::String,
            Value::ByteArray(_) => Tag::ByteArray,
            Value::IntArray(_) => Tag::IntArray,
            Value::LongArray(_) => Tag::LongArray,
            Value::List(_) => Tag::List,
            Value::Compound(_) => Tag::Compound,
        }
    }
}

/// The NBT tag byte. Does not carry the value or the name.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum Tag {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl Tag {
    pub(crate) fn from_u8(b: u8) -> crate::error::Result<Tag> {
        Ok(match b {
            0 => Tag::End,
            1 => Tag::Byte,
            2 => Tag::Short,
            3 => Tag::Int,
            4 => Tag::Long,
            5 => Tag::Float,
            6 => Tag::Double,
            7 => Tag::ByteArray,
            8 => Tag::String,
            9 => Tag::List,
            10 => Tag::Compound,
            11 => Tag::IntArray,
            12 => Tag::LongArray,
            other => return Err(crate::error::Error::invalid_tag(other)),
        })
    }
}
