use crate::error::TagDecodeError;
use crate::tag::{CompoundTag, ListTag, Tag, TagKind};
use byteorder::{BigEndian, ReadBytesExt};
use flate2::read::{GzDecoder, ZlibDecoder};
use std::convert::TryFrom;
use std::io::{self, Read};

/// Maximum nesting of lists and compounds.
pub const MAXIMUM_DEPTH: usize = 512;
/// Elements reserved up front for arrays and lists, whatever the declared length.
const PREALLOCATED_ELEMENTS_LIMIT: usize = 4096;

/// Reads one named tag and returns it with its name.
///
/// An `End` id yields `Tag::End` with an empty name and nothing else is read.
pub fn read_tag<R: Read>(reader: &mut R) -> Result<(Tag, String), TagDecodeError> {
    read_named_tag(reader, 0)
}

/// Reads a document whose root must be a compound.
pub fn read_compound_tag<R: Read>(reader: &mut R) -> Result<CompoundTag, TagDecodeError> {
    match read_tag(reader)? {
        (Tag::Compound(compound_tag), _) => Ok(compound_tag),
        (tag, _) => Err(TagDecodeError::RootMustBeCompound { actual: tag.kind() }),
    }
}

pub fn read_gzip_tag<R: Read>(reader: &mut R) -> Result<(Tag, String), TagDecodeError> {
    read_tag(&mut GzDecoder::new(reader))
}

pub fn read_zlib_tag<R: Read>(reader: &mut R) -> Result<(Tag, String), TagDecodeError> {
    read_tag(&mut ZlibDecoder::new(reader))
}

pub fn read_gzip_compound_tag<R: Read>(reader: &mut R) -> Result<CompoundTag, TagDecodeError> {
    read_compound_tag(&mut GzDecoder::new(reader))
}

pub fn read_zlib_compound_tag<R: Read>(reader: &mut R) -> Result<CompoundTag, TagDecodeError> {
    read_compound_tag(&mut ZlibDecoder::new(reader))
}

fn read_named_tag<R: Read>(reader: &mut R, depth: usize) -> Result<(Tag, String), TagDecodeError> {
    let tag_kind = read_tag_kind(reader)?;

    if tag_kind == TagKind::End {
        return Ok((Tag::End, String::new()));
    }

    let name = read_string(reader)?;
    let tag = read_payload(reader, tag_kind, depth)?;

    Ok((tag, name))
}

fn read_tag_kind<R: Read>(reader: &mut R) -> Result<TagKind, TagDecodeError> {
    let tag_type_id = reader.read_u8()?;

    TagKind::try_from(tag_type_id).map_err(|_| TagDecodeError::UnknownTagType { tag_type_id })
}

fn read_payload<R: Read>(
    reader: &mut R,
    tag_kind: TagKind,
    depth: usize,
) -> Result<Tag, TagDecodeError> {
    let tag = match tag_kind {
        TagKind::End => Tag::End,
        TagKind::Byte => Tag::Byte(reader.read_i8()?),
        TagKind::Short => Tag::Short(reader.read_i16::<BigEndian>()?),
        TagKind::Int => Tag::Int(reader.read_i32::<BigEndian>()?),
        TagKind::Long => Tag::Long(reader.read_i64::<BigEndian>()?),
        TagKind::Float => Tag::Float(reader.read_f32::<BigEndian>()?),
        TagKind::Double => Tag::Double(reader.read_f64::<BigEndian>()?),
        TagKind::ByteArray => {
            let length = read_length(reader, tag_kind)?;
            let mut bytes = Vec::with_capacity(length.min(PREALLOCATED_ELEMENTS_LIMIT));
            reader.by_ref().take(length as u64).read_to_end(&mut bytes)?;

            if bytes.len() != length {
                return Err(TagDecodeError::UnexpectedEof);
            }

            Tag::ByteArray(bytes.into_iter().map(|byte| byte as i8).collect())
        }
        TagKind::String => Tag::String(read_string(reader)?),
        TagKind::List => Tag::List(read_list(reader, depth)?),
        TagKind::Compound => Tag::Compound(read_compound(reader, depth)?),
        TagKind::IntArray => {
            let length = read_length(reader, tag_kind)?;
            Tag::IntArray(read_array(reader, length, |r| r.read_i32::<BigEndian>())?)
        }
        TagKind::LongArray => {
            let length = read_length(reader, tag_kind)?;
            Tag::LongArray(read_array(reader, length, |r| r.read_i64::<BigEndian>())?)
        }
    };

    Ok(tag)
}

fn read_list<R: Read>(reader: &mut R, depth: usize) -> Result<ListTag, TagDecodeError> {
    check_depth(depth)?;

    let item_kind = read_tag_kind(reader)?;
    let length = read_length(reader, TagKind::List)?;

    // End items carry no payload, so a populated End list is meaningless.
    if item_kind == TagKind::End && length > 0 {
        return Err(TagDecodeError::InvalidLength {
            tag_kind: TagKind::List,
            length: length as i32,
        });
    }

    let mut items = Vec::with_capacity(length.min(PREALLOCATED_ELEMENTS_LIMIT));

    for _ in 0..length {
        items.push(read_payload(reader, item_kind, depth + 1)?);
    }

    Ok(ListTag::from_decoded(item_kind, items))
}

fn read_compound<R: Read>(reader: &mut R, depth: usize) -> Result<CompoundTag, TagDecodeError> {
    check_depth(depth)?;

    let mut compound_tag = CompoundTag::new();

    loop {
        match read_named_tag(reader, depth + 1)? {
            (Tag::End, _) => break,
            (tag, name) => compound_tag.insert_decoded(name, tag),
        }
    }

    Ok(compound_tag)
}

fn check_depth(depth: usize) -> Result<(), TagDecodeError> {
    if depth >= MAXIMUM_DEPTH {
        return Err(TagDecodeError::DepthLimitExceeded {
            maximum_depth: MAXIMUM_DEPTH,
        });
    }

    Ok(())
}

fn read_length<R: Read>(reader: &mut R, tag_kind: TagKind) -> Result<usize, TagDecodeError> {
    let length = reader.read_i32::<BigEndian>()?;

    if length < 0 {
        return Err(TagDecodeError::InvalidLength { tag_kind, length });
    }

    Ok(length as usize)
}

fn read_array<R, T, F>(
    reader: &mut R,
    length: usize,
    mut read_value: F,
) -> Result<Vec<T>, TagDecodeError>
where
    R: Read,
    F: FnMut(&mut R) -> io::Result<T>,
{
    let mut values = Vec::with_capacity(length.min(PREALLOCATED_ELEMENTS_LIMIT));

    for _ in 0..length {
        values.push(read_value(reader)?);
    }

    Ok(values)
}

fn read_string<R: Read>(reader: &mut R) -> Result<String, TagDecodeError> {
    let length = reader.read_u16::<BigEndian>()? as usize;
    let mut bytes = vec![0; length];
    reader.read_exact(&mut bytes)?;

    String::from_utf8(bytes).map_err(|error| TagDecodeError::InvalidString {
        bytes: error.into_bytes(),
    })
}
