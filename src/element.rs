//! Data elements and the element-level codec.
//!
//! An element is encoded as tag, VR, length and value. In explicit-VR mode the
//! VR travels in the stream and selects a 2- or 4-byte length field; in
//! implicit-VR mode the VR is resolved through the [`TagDictionary`] and the
//! length is always 4 bytes. Sequence (SQ) values recurse into item datasets,
//! either bounded by a declared byte length or delimited by the group `FFFE`
//! markers when the length is undefined.

use crate::dataset::Dataset;
use crate::dictionary::TagDictionary;
use crate::tag::Tag;
use crate::tags;
use crate::vr::VR;
use thiserror::Error;

pub(crate) const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

/// Errors raised while parsing or serializing a DICOM stream.
#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("not a DICOM stream: {}", .0.to_lowercase())]
    NotADicomStream(String),

    #[error("malformed element: {}", .0.to_lowercase())]
    MalformedElement(String),

    #[error("unknown VR code {0:?}")]
    UnknownVr(String),

    #[error("unsupported transfer syntax: {0}")]
    UnsupportedTransferSyntax(String),
}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// The encoding mode of a dataset, derived from its transfer syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VrMode {
    Implicit,
    Explicit,
}

/// The value of a data element: raw bytes, or nested item datasets for SQ.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Primitive(Vec<u8>),
    Sequence(Vec<Dataset>),
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Primitive(bytes)
    }
}

impl From<Vec<Dataset>> for Value {
    fn from(items: Vec<Dataset>) -> Self {
        Value::Sequence(items)
    }
}

/// One (tag, VR, value) record of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DataElement {
    tag: Tag,
    vr: VR,
    value: Value,
}

impl DataElement {
    pub fn new(tag: Tag, vr: VR, value: impl Into<Value>) -> Self {
        Self {
            tag,
            vr,
            value: value.into(),
        }
    }

    /// An element with the VR-appropriate empty value.
    pub fn empty(tag: Tag, vr: VR) -> Self {
        let value = match vr {
            VR::SQ => Value::Sequence(Vec::new()),
            _ => Value::Primitive(Vec::new()),
        };
        Self::new(tag, vr, value)
    }

    /// A text element; even-length padding is applied at serialization time.
    pub fn text(tag: Tag, vr: VR, value: &str) -> Self {
        Self::new(tag, vr, value.as_bytes().to_vec())
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn vr(&self) -> VR {
        self.vr
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        match &self.value {
            Value::Primitive(bytes) => bytes.is_empty(),
            Value::Sequence(items) => items.is_empty(),
        }
    }

    pub fn items(&self) -> Option<&[Dataset]> {
        match &self.value {
            Value::Sequence(items) => Some(items),
            Value::Primitive(_) => None,
        }
    }

    /// The textual value of a primitive element, with the trailing pad byte
    /// stripped. Sequences have no textual value.
    pub fn string_value(&self) -> Option<String> {
        match &self.value {
            Value::Primitive(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                Some(
                    text.trim_end_matches(|c| c == '\0' || c == ' ')
                        .to_string(),
                )
            }
            Value::Sequence(_) => None,
        }
    }

    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = value.into();
    }

    pub fn set_string(&mut self, value: &str) {
        self.value = Value::Primitive(value.as_bytes().to_vec());
    }
}

/// A forward-only cursor over the input byte stream.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub(crate) fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.buf.len());
        match end {
            Some(end) => {
                let slice = &self.buf[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(ParseError::MalformedElement(format!(
                "unexpected end of stream while reading {what}"
            ))),
        }
    }

    pub(crate) fn read_u16(&mut self, what: &str) -> Result<u16> {
        let bytes = self.take(2, what)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn read_u32(&mut self, what: &str) -> Result<u32> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn read_tag(&mut self) -> Result<Tag> {
        let group = self.read_u16("tag group")?;
        let element = self.read_u16("tag element")?;
        Ok(Tag(group, element))
    }

    /// The tag at the cursor, without advancing. `None` at end of stream.
    pub(crate) fn peek_tag(&self) -> Option<Tag> {
        let bytes = self.buf.get(self.pos..self.pos + 4)?;
        Some(Tag(
            u16::from_le_bytes([bytes[0], bytes[1]]),
            u16::from_le_bytes([bytes[2], bytes[3]]),
        ))
    }
}

/// Parse one data element at the cursor.
pub(crate) fn read_element(
    reader: &mut Reader<'_>,
    mode: VrMode,
    dict: &TagDictionary,
) -> Result<DataElement> {
    let tag = reader.read_tag()?;
    if tag.group() == 0xFFFE {
        return Err(ParseError::MalformedElement(format!(
            "unexpected delimitation item {tag} outside a sequence"
        )));
    }

    let (vr, length) = match mode {
        VrMode::Explicit => {
            let code = reader.take(2, "VR code")?;
            let code = [code[0], code[1]];
            let vr = VR::from_bytes(code).ok_or_else(|| {
                ParseError::UnknownVr(String::from_utf8_lossy(&code).into_owned())
            })?;
            let length = if vr.has_short_length() {
                u32::from(reader.read_u16("element length")?)
            } else {
                reader.take(2, "reserved bytes")?;
                reader.read_u32("element length")?
            };
            (vr, length)
        }
        VrMode::Implicit => {
            let vr = dict.vr_of(tag);
            let length = reader.read_u32("element length")?;
            (vr, length)
        }
    };

    let value = match vr {
        VR::SQ => Value::Sequence(read_sequence(reader, mode, dict, length)?),
        _ if length == UNDEFINED_LENGTH => {
            // undefined length is only meaningful for sequences and
            // encapsulated pixel data of compressed syntaxes, which are out
            // of scope here
            return Err(ParseError::MalformedElement(format!(
                "undefined length on non-sequence element {tag}"
            )));
        }
        _ => Value::Primitive(reader.take(length as usize, "element value")?.to_vec()),
    };

    Ok(DataElement::new(tag, vr, value))
}

/// Parse the item list of a sequence value.
fn read_sequence(
    reader: &mut Reader<'_>,
    mode: VrMode,
    dict: &TagDictionary,
    length: u32,
) -> Result<Vec<Dataset>> {
    if length == UNDEFINED_LENGTH {
        // delimited extent: items until the sequence delimitation item
        let mut items = Vec::new();
        loop {
            let tag = reader.read_tag()?;
            let item_length = reader.read_u32("item length")?;
            match tag {
                tags::SEQUENCE_DELIMITATION_ITEM => return Ok(items),
                tags::ITEM => items.push(read_item(reader, mode, dict, item_length)?),
                other => {
                    return Err(ParseError::MalformedElement(format!(
                        "expected item or sequence delimiter, found {other}"
                    )))
                }
            }
        }
    } else {
        // declared extent: items fill exactly `length` bytes
        let mut inner = Reader::new(reader.take(length as usize, "sequence value")?);
        let mut items = Vec::new();
        while !inner.is_empty() {
            let tag = inner.read_tag()?;
            let item_length = inner.read_u32("item length")?;
            if tag != tags::ITEM {
                return Err(ParseError::MalformedElement(format!(
                    "expected item header, found {tag}"
                )));
            }
            items.push(read_item(&mut inner, mode, dict, item_length)?);
        }
        Ok(items)
    }
}

/// Parse one item dataset, bounded by its length or by an item delimiter.
fn read_item(
    reader: &mut Reader<'_>,
    mode: VrMode,
    dict: &TagDictionary,
    length: u32,
) -> Result<Dataset> {
    if length == UNDEFINED_LENGTH {
        let mut dataset = Dataset::new();
        loop {
            match reader.peek_tag() {
                Some(tags::ITEM_DELIMITATION_ITEM) => {
                    reader.read_tag()?;
                    reader.read_u32("item delimiter length")?;
                    return Ok(dataset);
                }
                Some(_) => dataset.put(read_element(reader, mode, dict)?),
                None => {
                    return Err(ParseError::MalformedElement(
                        "unterminated item of undefined length".into(),
                    ))
                }
            }
        }
    } else {
        let mut inner = Reader::new(reader.take(length as usize, "item value")?);
        let mut dataset = Dataset::new();
        while !inner.is_empty() {
            dataset.put(read_element(&mut inner, mode, dict)?);
        }
        Ok(dataset)
    }
}

/// Serialize one data element, recomputing lengths from current content and
/// re-applying even-length padding.
pub(crate) fn write_element(buf: &mut Vec<u8>, elem: &DataElement, mode: VrMode) -> Result<()> {
    let value_bytes = match elem.value() {
        Value::Primitive(bytes) => {
            let mut bytes = bytes.clone();
            if bytes.len() % 2 != 0 {
                bytes.push(elem.vr().pad_byte());
            }
            bytes
        }
        Value::Sequence(items) => {
            let mut bytes = Vec::new();
            for item in items {
                let item_bytes = item.to_bytes(mode)?;
                bytes.extend_from_slice(&tags::ITEM.group().to_le_bytes());
                bytes.extend_from_slice(&tags::ITEM.element().to_le_bytes());
                bytes.extend_from_slice(&(item_bytes.len() as u32).to_le_bytes());
                bytes.extend_from_slice(&item_bytes);
            }
            bytes
        }
    };

    if value_bytes.len() as u64 >= u64::from(UNDEFINED_LENGTH) {
        return Err(ParseError::MalformedElement(format!(
            "value of {} too large to encode",
            elem.tag()
        )));
    }

    buf.extend_from_slice(&elem.tag().group().to_le_bytes());
    buf.extend_from_slice(&elem.tag().element().to_le_bytes());

    match mode {
        VrMode::Explicit => {
            buf.extend_from_slice(&elem.vr().as_bytes());
            if elem.vr().has_short_length() {
                let length = u16::try_from(value_bytes.len()).map_err(|_| {
                    ParseError::MalformedElement(format!(
                        "value of {} exceeds the 16-bit length field of VR {}",
                        elem.tag(),
                        elem.vr()
                    ))
                })?;
                buf.extend_from_slice(&length.to_le_bytes());
            } else {
                buf.extend_from_slice(&[0, 0]);
                buf.extend_from_slice(&(value_bytes.len() as u32).to_le_bytes());
            }
        }
        VrMode::Implicit => {
            buf.extend_from_slice(&(value_bytes.len() as u32).to_le_bytes());
        }
    }

    buf.extend_from_slice(&value_bytes);
    Ok(())
}
