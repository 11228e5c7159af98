use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::GzDecoder;
use flate2::{Compression, GzBuilder};
use std::io::{self, Cursor, Read, Write};

pub const TAG_END: u8 = 0;
pub const TAG_BYTE: u8 = 1;
pub const TAG_SHORT: u8 = 2;
pub const TAG_INT: u8 = 3;
pub const TAG_LONG: u8 = 4;
pub const TAG_FLOAT: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_BYTE_ARRAY: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_LIST: u8 = 9;
pub const TAG_COMPOUND: u8 = 10;
pub const TAG_INT_ARRAY: u8 = 11;
pub const TAG_LONG_ARRAY: u8 = 12;

/// Nesting limit for lists and compounds, same as the game's reader.
const MAX_DEPTH: usize = 512;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(TagList),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

/// A list payload. The element type is kept so that an empty list read from
/// disk is written back with the same header byte.
#[derive(Debug, Clone, PartialEq)]
pub struct TagList {
    pub element_type: u8,
    pub items: Vec<Tag>,
}

/// Compound payload that keeps entries in insertion order.
///
/// Encoding is therefore a pure function of how the compound was built, and
/// a compound read from bytes encodes back to the same bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    entries: Vec<(String, Tag)>,
}

impl Compound {
    pub fn new() -> Self {
        Compound {
            entries: Vec::new(),
        }
    }

    /// Inserts or replaces `key`. A replaced entry keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, tag: Tag) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = tag,
            None => self.entries.push((key, tag)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, tag)| tag)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Tag)> for Compound {
    fn from_iter<I: IntoIterator<Item = (K, Tag)>>(iter: I) -> Self {
        let mut compound = Compound::new();
        for (key, tag) in iter {
            compound.insert(key, tag);
        }
        compound
    }
}

fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn invalid_input(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg.into())
}

fn read_length<R: Read>(reader: &mut R, what: &str) -> io::Result<usize> {
    let length = reader.read_i32::<BigEndian>()?;
    if length < 0 {
        return Err(invalid_data(format!("negative {} length: {}", what, length)));
    }
    Ok(length as usize)
}

fn read_string<R: Read>(reader: &mut R) -> io::Result<String> {
    let length = reader.read_u16::<BigEndian>()?;
    let mut bytes = vec![0u8; length as usize];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    let length = u16::try_from(value.len())
        .map_err(|_| invalid_input(format!("string of {} bytes is too long", value.len())))?;
    writer.write_u16::<BigEndian>(length)?;
    writer.write_all(value.as_bytes())
}

fn write_length<W: Write>(writer: &mut W, length: usize) -> io::Result<()> {
    let length =
        i32::try_from(length).map_err(|_| invalid_input(format!("length {} overflows", length)))?;
    writer.write_i32::<BigEndian>(length)
}

impl Tag {
    /// Builds a list, taking the element type from the first item.
    pub fn list(items: Vec<Tag>) -> Tag {
        let element_type = items.first().map(Tag::get_type_id).unwrap_or(TAG_END);
        Tag::List(TagList {
            element_type,
            items,
        })
    }

    /// Builds a possibly empty list with an explicit element type.
    pub fn typed_list(element_type: u8, items: Vec<Tag>) -> Tag {
        Tag::List(TagList {
            element_type,
            items,
        })
    }

    pub fn get_type_id(&self) -> u8 {
        match self {
            Tag::End => TAG_END,
            Tag::Byte(_) => TAG_BYTE,
            Tag::Short(_) => TAG_SHORT,
            Tag::Int(_) => TAG_INT,
            Tag::Long(_) => TAG_LONG,
            Tag::Float(_) => TAG_FLOAT,
            Tag::Double(_) => TAG_DOUBLE,
            Tag::ByteArray(_) => TAG_BYTE_ARRAY,
            Tag::String(_) => TAG_STRING,
            Tag::List(_) => TAG_LIST,
            Tag::Compound(_) => TAG_COMPOUND,
            Tag::IntArray(_) => TAG_INT_ARRAY,
            Tag::LongArray(_) => TAG_LONG_ARRAY,
        }
    }

    pub fn read<R: Read>(reader: &mut R) -> io::Result<(String, Tag)> {
        Tag::read_named(reader, 0)
    }

    fn read_named<R: Read>(reader: &mut R, depth: usize) -> io::Result<(String, Tag)> {
        let type_id = reader.read_u8()?;
        if type_id == TAG_END {
            return Ok((String::new(), Tag::End));
        }

        let name = read_string(reader)?;
        let tag = Tag::read_payload(reader, type_id, depth)?;
        Ok((name, tag))
    }

    fn read_payload<R: Read>(reader: &mut R, type_id: u8, depth: usize) -> io::Result<Tag> {
        if depth > MAX_DEPTH {
            return Err(invalid_data("tag nesting too deep"));
        }
        match type_id {
            TAG_END => Ok(Tag::End),
            TAG_BYTE => Ok(Tag::Byte(reader.read_i8()?)),
            TAG_SHORT => Ok(Tag::Short(reader.read_i16::<BigEndian>()?)),
            TAG_INT => Ok(Tag::Int(reader.read_i32::<BigEndian>()?)),
            TAG_LONG => Ok(Tag::Long(reader.read_i64::<BigEndian>()?)),
            TAG_FLOAT => Ok(Tag::Float(reader.read_f32::<BigEndian>()?)),
            TAG_DOUBLE => Ok(Tag::Double(reader.read_f64::<BigEndian>()?)),
            TAG_BYTE_ARRAY => {
                let length = read_length(reader, "byte array")?;
                let mut bytes = Vec::with_capacity(length.min(4096));
                for _ in 0..length {
                    bytes.push(reader.read_i8()?);
                }
                Ok(Tag::ByteArray(bytes))
            }
            TAG_STRING => read_string(reader).map(Tag::String),
            TAG_LIST => {
                let element_type = reader.read_u8()?;
                let length = read_length(reader, "list")?;
                if element_type == TAG_END && length > 0 {
                    return Err(invalid_data("non-empty list of TAG_End"));
                }
                let mut items = Vec::with_capacity(length.min(4096));
                for _ in 0..length {
                    items.push(Tag::read_payload(reader, element_type, depth + 1)?);
                }
                Ok(Tag::List(TagList {
                    element_type,
                    items,
                }))
            }
            TAG_COMPOUND => {
                let mut compound = Compound::new();
                loop {
                    let (name, tag) = Tag::read_named(reader, depth + 1)?;
                    if let Tag::End = tag {
                        break;
                    }
                    compound.insert(name, tag);
                }
                Ok(Tag::Compound(compound))
            }
            TAG_INT_ARRAY => {
                let length = read_length(reader, "int array")?;
                let mut ints = Vec::with_capacity(length.min(4096));
                for _ in 0..length {
                    ints.push(reader.read_i32::<BigEndian>()?);
                }
                Ok(Tag::IntArray(ints))
            }
            TAG_LONG_ARRAY => {
                let length = read_length(reader, "long array")?;
                let mut longs = Vec::with_capacity(length.min(4096));
                for _ in 0..length {
                    longs.push(reader.read_i64::<BigEndian>()?);
                }
                Ok(Tag::LongArray(longs))
            }
            _ => Err(invalid_data(format!("Invalid tag type: {}", type_id))),
        }
    }

    pub fn write<W: Write>(&self, writer: &mut W, name: &str) -> io::Result<()> {
        writer.write_u8(self.get_type_id())?;

        if !matches!(self, Tag::End) {
            write_string(writer, name)?;
        }

        self.write_payload(writer)
    }

    fn write_payload<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Tag::End => Ok(()),
            Tag::Byte(v) => writer.write_i8(*v),
            Tag::Short(v) => writer.write_i16::<BigEndian>(*v),
            Tag::Int(v) => writer.write_i32::<BigEndian>(*v),
            Tag::Long(v) => writer.write_i64::<BigEndian>(*v),
            Tag::Float(v) => writer.write_f32::<BigEndian>(*v),
            Tag::Double(v) => writer.write_f64::<BigEndian>(*v),
            Tag::ByteArray(v) => {
                write_length(writer, v.len())?;
                for &b in v {
                    writer.write_i8(b)?;
                }
                Ok(())
            }
            Tag::String(v) => write_string(writer, v),
            Tag::List(list) => {
                if let Some(item) = list
                    .items
                    .iter()
                    .find(|item| item.get_type_id() != list.element_type)
                {
                    return Err(invalid_input(format!(
                        "list of type {} holds a tag of type {}",
                        list.element_type,
                        item.get_type_id()
                    )));
                }
                writer.write_u8(list.element_type)?;
                write_length(writer, list.items.len())?;
                for tag in &list.items {
                    tag.write_payload(writer)?;
                }
                Ok(())
            }
            Tag::Compound(v) => {
                for (name, tag) in v.iter() {
                    if matches!(tag, Tag::End) {
                        return Err(invalid_input(format!("compound entry '{}' is TAG_End", name)));
                    }
                    tag.write(writer, name)?;
                }
                Tag::End.write(writer, "")?;
                Ok(())
            }
            Tag::IntArray(v) => {
                write_length(writer, v.len())?;
                for &i in v {
                    writer.write_i32::<BigEndian>(i)?;
                }
                Ok(())
            }
            Tag::LongArray(v) => {
                write_length(writer, v.len())?;
                for &l in v {
                    writer.write_i64::<BigEndian>(l)?;
                }
                Ok(())
            }
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Tag>> {
        match self {
            Tag::List(list) => Some(&list.items),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&String> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Tag::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Tag::Double(n) => Some(*n),
            _ => None,
        }
    }
}

/// A complete NBT document: one named root tag, optionally gzip-compressed.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtFile {
    pub root: Tag,
    pub name: String,
}

impl NbtFile {
    pub fn new(name: String, root: Tag) -> Self {
        NbtFile { root, name }
    }

    pub fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let (name, root) = Tag::read(reader)?;
        Ok(NbtFile { root, name })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.root.write(writer, &self.name)
    }

    pub fn read_gzip<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut decoder = GzDecoder::new(reader);
        Self::read(&mut decoder)
    }

    /// Reads either a gzip-compressed or a raw document, picked by magic bytes.
    pub fn from_bytes(bytes: &[u8]) -> io::Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let file = if bytes.starts_with(&GZIP_MAGIC) {
            Self::read_gzip(&mut cursor)?
        } else {
            let file = Self::read(&mut cursor)?;
            if (cursor.position() as usize) != bytes.len() {
                return Err(invalid_data("trailing bytes after root tag"));
            }
            file
        };
        Ok(file)
    }

    /// Gzip output with a zeroed header (no mtime, no file name), so equal
    /// documents always compress to equal bytes.
    pub fn write_gzip<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut encoder = GzBuilder::new()
            .mtime(0)
            .operating_system(255)
            .write(writer, Compression::default());
        self.write(&mut encoder)?;
        encoder.finish()?;
        Ok(())
    }

    pub fn to_gzip_bytes(&self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_gzip(&mut buffer)?;
        Ok(buffer)
    }
}
