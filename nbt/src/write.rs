use byteorder::{BigEndian, WriteBytesExt};

use crate::error::{Error, Result};
use crate::value::{Tag, Value};

/// Serializes a [`Value::Compound`] back into a complete binary NBT
/// document, with the conventional empty root name.
pub fn write_root(value: &Value) -> Result<Vec<u8>> {
    let map = value.as_compound().ok_or_else(Error::root_not_compound)?;
    let mut out = Vec::new();
    out.write_u8(Tag::Compound as u8)?;
    write_mutf8_string(&mut out, "")?;
    write_compound_body(&mut out, map)?;
    Ok(out)
}

fn write_compound_body(
    out: &mut Vec<u8>,
    map: &indexmap::IndexMap<String, Value>,
) -> Result<()> {
    for (name, value) in map {
        out.write_u8(value.tag() as u8)?;
        write_mutf8_string(out, name)?;
        write_value(out, value)?;
    }
    out.write_u8(Tag::End as u8)?;
    Ok(())
}

fn write_value(out: &mut Vec<u8>, value: &Value) -> Result<()> {
    match value {
        Value::Byte(v) => out.write_i8(*v)?,
        Value::Short(v) => out.write_i16::<BigEndian>(*v)?,
        Value::Int(v) => out.write_i32::<BigEndian>(*v)?,
        Value::Long(v) => out.write_i64::<BigEndian>(*v)?,
        Value::Float(v) => out.write_f32::<BigEndian>(*v)?,
        Value::Double(v) => out.write_f64::<BigEndian>(*v)?,
        Value::String(s) => write_mutf8_string(out, s)?,
        Value::ByteArray(v) => {
            out.write_i32::<BigEndian>(v.len() as i32)?;
            for b in v {
                out.write_i8(*b)?;
            }
        }
        Value::IntArray(v) => {
            out.write_i32::<BigEndian>(v.len() as i32)?;
            for n in v {
                out.write_i32::<BigEndian>(*n)?;
            }
        }
        Value::LongArray(v) => {
            out.write_i32::<BigEndian>(v.len() as i32)?;
            for n in v {
                out.write_i64::<BigEndian>(*n)?;
            }
        }
        Value::List(items) => {
            let elem_tag = items.first().map(|v| v.tag()).unwrap_or(Tag::End);
            out.write_u8(elem_tag as u8)?;
            out.write_i32::<BigEndian>(items.len() as i32)?;
            for item in items {
                write_value(out, item)?;
            }
        }
        Value::Compound(map) => write_compound_body(out, map)?,
    }
    Ok(())
}

fn write_mutf8_string(out: &mut Vec<u8>, s: &str) -> Result<()> {
    let encoded = cesu8::to_java_cesu8(s);
    out.write_u16::<BigEndian>(encoded.len() as u16)?;
    out.extend_from_slice(&encoded);
    Ok(())
}
