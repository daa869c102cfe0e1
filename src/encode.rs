use crate::error::TagEncodeError;
use crate::tag::{CompoundTag, ListTag, Tag, TagKind};
use byteorder::{BigEndian, WriteBytesExt};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::io::Write;

/// Writes `tag` under `name`. The name of an `End` tag is never written.
pub fn write_tag<W: Write>(writer: &mut W, tag: &Tag, name: &str) -> Result<(), TagEncodeError> {
    writer.write_u8(tag.kind().id())?;

    if let Tag::End = tag {
        return Ok(());
    }

    write_string(writer, name)?;
    write_payload(writer, tag)
}

/// Writes `compound_tag` as an unnamed root.
pub fn write_compound_tag<W: Write>(
    writer: &mut W,
    compound_tag: &CompoundTag,
) -> Result<(), TagEncodeError> {
    writer.write_u8(TagKind::Compound.id())?;
    write_string(writer, "")?;
    write_compound(writer, compound_tag)
}

pub fn write_gzip_tag<W: Write>(
    writer: &mut W,
    tag: &Tag,
    name: &str,
) -> Result<(), TagEncodeError> {
    let mut encoder = GzEncoder::new(writer, Compression::default());
    write_tag(&mut encoder, tag, name)?;
    encoder.finish()?;

    Ok(())
}

pub fn write_zlib_tag<W: Write>(
    writer: &mut W,
    tag: &Tag,
    name: &str,
) -> Result<(), TagEncodeError> {
    let mut encoder = ZlibEncoder::new(writer, Compression::default());
    write_tag(&mut encoder, tag, name)?;
    encoder.finish()?;

    Ok(())
}

pub fn write_gzip_compound_tag<W: Write>(
    writer: &mut W,
    compound_tag: &CompoundTag,
) -> Result<(), TagEncodeError> {
    let mut encoder = GzEncoder::new(writer, Compression::default());
    write_compound_tag(&mut encoder, compound_tag)?;
    encoder.finish()?;

    Ok(())
}

pub fn write_zlib_compound_tag<W: Write>(
    writer: &mut W,
    compound_tag: &CompoundTag,
) -> Result<(), TagEncodeError> {
    let mut encoder = ZlibEncoder::new(writer, Compression::default());
    write_compound_tag(&mut encoder, compound_tag)?;
    encoder.finish()?;

    Ok(())
}

fn write_payload<W: Write>(writer: &mut W, tag: &Tag) -> Result<(), TagEncodeError> {
    match tag {
        Tag::End => {}
        Tag::Byte(value) => writer.write_i8(*value)?,
        Tag::Short(value) => writer.write_i16::<BigEndian>(*value)?,
        Tag::Int(value) => writer.write_i32::<BigEndian>(*value)?,
        Tag::Long(value) => writer.write_i64::<BigEndian>(*value)?,
        Tag::Float(value) => writer.write_f32::<BigEndian>(*value)?,
        Tag::Double(value) => writer.write_f64::<BigEndian>(*value)?,
        Tag::ByteArray(values) => {
            write_length(writer, TagKind::ByteArray, values.len())?;
            let bytes: Vec<u8> = values.iter().map(|value| *value as u8).collect();
            writer.write_all(&bytes)?;
        }
        Tag::String(value) => write_string(writer, value)?,
        Tag::List(list_tag) => write_list(writer, list_tag)?,
        Tag::Compound(compound_tag) => write_compound(writer, compound_tag)?,
        Tag::IntArray(values) => {
            write_length(writer, TagKind::IntArray, values.len())?;

            for value in values {
                writer.write_i32::<BigEndian>(*value)?;
            }
        }
        Tag::LongArray(values) => {
            write_length(writer, TagKind::LongArray, values.len())?;

            for value in values {
                writer.write_i64::<BigEndian>(*value)?;
            }
        }
    }

    Ok(())
}

fn write_list<W: Write>(writer: &mut W, list_tag: &ListTag) -> Result<(), TagEncodeError> {
    if list_tag.kind() == TagKind::End && !list_tag.is_empty() {
        return Err(TagEncodeError::UnexpectedEndTag);
    }

    writer.write_u8(list_tag.kind().id())?;
    write_length(writer, TagKind::List, list_tag.len())?;

    for item in list_tag {
        if item.kind() != list_tag.kind() {
            return Err(TagEncodeError::ListItemTypeMismatch {
                expected: list_tag.kind(),
                actual: item.kind(),
            });
        }

        write_payload(writer, item)?;
    }

    Ok(())
}

fn write_compound<W: Write>(
    writer: &mut W,
    compound_tag: &CompoundTag,
) -> Result<(), TagEncodeError> {
    for (name, tag) in compound_tag {
        // A nested End would terminate the compound early.
        if let Tag::End = tag {
            return Err(TagEncodeError::UnexpectedEndTag);
        }

        write_tag(writer, tag, name)?;
    }

    writer.write_u8(TagKind::End.id())?;

    Ok(())
}

fn write_length<W: Write>(
    writer: &mut W,
    tag_kind: TagKind,
    length: usize,
) -> Result<(), TagEncodeError> {
    if length > i32::MAX as usize {
        return Err(TagEncodeError::LengthExceedsMaximum {
            tag_kind,
            length,
            maximum_length: i32::MAX as usize,
        });
    }

    writer.write_i32::<BigEndian>(length as i32)?;

    Ok(())
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<(), TagEncodeError> {
    let bytes = value.as_bytes();

    if bytes.len() > u16::MAX as usize {
        return Err(TagEncodeError::LengthExceedsMaximum {
            tag_kind: TagKind::String,
            length: bytes.len(),
            maximum_length: u16::MAX as usize,
        });
    }

    writer.write_u16::<BigEndian>(bytes.len() as u16)?;
    writer.write_all(bytes)?;

    Ok(())
}
