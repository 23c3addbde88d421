use byteorder::{BigEndian, ReadBytesExt};
use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::value::{Tag, Value};

/// Parses a complete binary NBT document (as found inside a decompressed
/// chunk blob) into a [`Value::Compound`].
///
/// The root tag is always `Compound` for well-formed Minecraft NBT; its
/// name (conventionally empty) is read and discarded, matching what every
/// tool in this ecosystem does since nothing keys off the root's name.
pub fn read_root(bytes: &[u8]) -> Result<Value> {
    let mut input = bytes;
    let tag = read_tag(&mut input)?;
    if tag != Tag::Compound {
        return Err(Error::root_not_compound());
    }
    let _name = read_name(&mut input)?;
    read_compound_body(&mut input)
}

fn read_tag(input: &mut &[u8]) -> Result<Tag> {
    let b = input.read_u8().map_err(|_| Error::unexpected_eof())?;
    Tag::from_u8(b)
}

fn read_name(input: &mut &[u8]) -> Result<String> {
    read_mutf8_string(input)
}

fn read_mutf8_string(input: &mut &[u8]) -> Result<String> {
    let len = input
        .read_u16::<BigEndian>()
        .map_err(|_| Error::unexpected_eof())? as usize;
    if input.len() < len {
        return Err(Error::unexpected_eof());
    }
    let (raw, rest) = input.split_at(len);
    *input = rest;
    let s = cesu8::from_java_cesu8(raw).map_err(|_| Error::nonunicode_string(raw))?;
    Ok(s.into_owned())
}

fn read_compound_body(input: &mut &[u8]) -> Result<Value> {
    let mut map = IndexMap::new();
    loop {
        let tag = read_tag(input)?;
        if tag == Tag::End {
            break;
        }
        let name = read_name(input)?;
        let value = read_value(input, tag)?;
        map.insert(name, value);
    }
    Ok(Value::Compound(map))
}

fn read_value(input: &mut &[u8], tag: Tag) -> Result<Value> {
    Ok(match tag {
        Tag::End => return Err(Error::invalid_tag(0)),
        Tag::Byte => Value::Byte(input.read_i8().map_err(|_| Error::unexpected_eof())?),
        Tag::Short => Value::Short(
            input
                .read_i16::<BigEndian>()
                .map_err(|_| Error::unexpected_eof())?,
        ),
        Tag::Int => Value::Int(
            input
                .read_i32::<BigEndian>()
                .map_err(|_| Error::unexpected_eof())?,
        ),
        Tag::Long => Value::Long(
            input
                .read_i64::<BigEndian>()
                .map_err(|_| Error::unexpected_eof())?,
        ),
        Tag::Float => Value::Float(
            input
                .read_f32::<BigEndian>()
                .map_err(|_| Error::unexpected_eof())?,
        ),
        Tag::Double => Value::Double(
            input
                .read_f64::<BigEndian>()
                .map_err(|_| Error::unexpected_eof())?,
        ),
        Tag::String => Value::String(read_mutf8_string(input)?),
        Tag::ByteArray => {
            let len = read_len(input)?;
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(input.read_i8().map_err(|_| Error::unexpected_eof())?);
            }
            Value::ByteArray(v)
        }
        Tag::IntArray => {
            let len = read_len(input)?;
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(
                    input
                        .read_i32::<BigEndian>()
                        .map_err(|_| Error::unexpected_eof())?,
                );
            }
            Value::IntArray(v)
        }
        Tag::LongArray => {
            let len = read_len(input)?;
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(
                    input
                        .read_i64::<BigEndian>()
                        .map_err(|_| Error::unexpected_eof())?,
                );
            }
            Value::LongArray(v)
        }
        Tag::List => {
            let elem_tag = read_tag(input)?;
            let len = read_len(input)?;
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(read_value(input, elem_tag)?);
            }
            Value::List(v)
        }
        Tag::Compound => read_compound_body(input)?,
    })
}

fn read_len(input: &mut &[u8]) -> Result<usize> {
    let n = input
        .read_i32::<BigEndian>()
        .map_err(|_| Error::unexpected_eof())?;
    Ok(n.max(0) as usize)
}

