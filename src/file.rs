//! Whole-stream parsing and serialization: preamble, `DICM` signature, the
//! group-0002 file meta block and the main dataset.

use crate::dataset::Dataset;
use crate::dictionary::TagDictionary;
use crate::element::{read_element, write_element, DataElement, ParseError, Reader, Result, VrMode};
use crate::tags;
use crate::vr::VR;
use log::debug;

const PREAMBLE_LENGTH: usize = 128;
const MAGIC: &[u8; 4] = b"DICM";

const IMPLEMENTATION_CLASS_UID: &str = "1.2.826.0.1.3680043.10.1465.1";
const IMPLEMENTATION_VERSION_NAME: &str = "DCMDEIDENT01";

/// The transfer syntaxes this codec can read and write.
///
/// Compressed and big-endian syntaxes are out of scope; streams declaring one
/// are rejected rather than mangled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSyntax {
    ImplicitVrLittleEndian,
    ExplicitVrLittleEndian,
}

impl TransferSyntax {
    pub fn uid(self) -> &'static str {
        match self {
            TransferSyntax::ImplicitVrLittleEndian => "1.2.840.10008.1.2",
            TransferSyntax::ExplicitVrLittleEndian => "1.2.840.10008.1.2.1",
        }
    }

    pub fn from_uid(uid: &str) -> Result<Self> {
        match uid {
            "1.2.840.10008.1.2" => Ok(TransferSyntax::ImplicitVrLittleEndian),
            "1.2.840.10008.1.2.1" => Ok(TransferSyntax::ExplicitVrLittleEndian),
            other => Err(ParseError::UnsupportedTransferSyntax(other.into())),
        }
    }

    pub fn vr_mode(self) -> VrMode {
        match self {
            TransferSyntax::ImplicitVrLittleEndian => VrMode::Implicit,
            TransferSyntax::ExplicitVrLittleEndian => VrMode::Explicit,
        }
    }
}

/// One parsed DICOM instance: file meta block, main dataset and the transfer
/// syntax the dataset was (and will be) encoded in.
#[derive(Debug, Clone, PartialEq)]
pub struct DicomFile {
    meta: Dataset,
    dataset: Dataset,
    syntax: TransferSyntax,
}

impl DicomFile {
    /// Build an instance around an existing dataset. The file meta block is
    /// generated from scratch on write.
    pub fn new(dataset: Dataset, syntax: TransferSyntax) -> Self {
        Self {
            meta: Dataset::new(),
            dataset,
            syntax,
        }
    }

    /// Parse a DICOM stream, requiring the 128-byte preamble and `DICM`
    /// signature.
    pub fn parse(bytes: &[u8], dict: &TagDictionary) -> Result<Self> {
        let body = match strip_signature(bytes) {
            Some(body) => body,
            None => {
                return Err(ParseError::NotADicomStream(
                    "missing DICM signature".into(),
                ))
            }
        };
        Self::parse_body(body, dict)
    }

    /// Lenient parse for real-world streams lacking the preamble: accepts the
    /// signature at offset 128 or 0, and falls back to treating the whole
    /// stream as a headerless dataset, sniffing the VR mode from the first
    /// element.
    pub fn parse_forced(bytes: &[u8], dict: &TagDictionary) -> Result<Self> {
        if let Some(body) = strip_signature(bytes) {
            return Self::parse_body(body, dict);
        }
        if let Some(body) = bytes.strip_prefix(MAGIC) {
            return Self::parse_body(body, dict);
        }

        let syntax = sniff_headerless_syntax(bytes);
        let mut reader = Reader::new(bytes);
        let dataset = Dataset::read(&mut reader, syntax.vr_mode(), dict)?;
        Ok(Self {
            meta: Dataset::new(),
            dataset,
            syntax,
        })
    }

    fn parse_body(body: &[u8], dict: &TagDictionary) -> Result<Self> {
        let mut reader = Reader::new(body);

        // the file meta group is always encoded in explicit VR little endian
        let mut meta = Dataset::new();
        while matches!(reader.peek_tag(), Some(tag) if tag.group() == 0x0002) {
            meta.put(read_element(&mut reader, VrMode::Explicit, dict)?);
        }

        let syntax = match meta.get(tags::TRANSFER_SYNTAX_UID) {
            Some(elem) => match elem.string_value() {
                Some(uid) => TransferSyntax::from_uid(&uid)?,
                None => {
                    return Err(ParseError::MalformedElement(
                        "transfer syntax UID has no textual value".into(),
                    ))
                }
            },
            // DICOM's default in the absence of a declaration
            None => TransferSyntax::ImplicitVrLittleEndian,
        };

        debug!(
            "parsed file meta group ({} elements), transfer syntax {}",
            meta.len(),
            syntax.uid()
        );

        let dataset = Dataset::read(&mut reader, syntax.vr_mode(), dict)?;
        Ok(Self {
            meta,
            dataset,
            syntax,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.dataset
    }

    pub fn transfer_syntax(&self) -> TransferSyntax {
        self.syntax
    }

    /// Serialize to a complete stream: preamble, signature, file meta group
    /// with a recomputed group length, then the dataset in the declared mode.
    ///
    /// The media storage UIDs in the meta group are refreshed from the
    /// dataset's SOPClassUID/SOPInstanceUID so the two never disagree.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let meta_bytes = self.meta_group_bytes()?;
        let dataset_bytes = self.dataset.to_bytes(self.syntax.vr_mode())?;

        let mut out = Vec::with_capacity(PREAMBLE_LENGTH + 4 + meta_bytes.len() + dataset_bytes.len());
        out.extend_from_slice(&[0u8; PREAMBLE_LENGTH]);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&meta_bytes);
        out.extend_from_slice(&dataset_bytes);
        Ok(out)
    }

    fn meta_group_bytes(&self) -> Result<Vec<u8>> {
        let mut meta = self.meta.clone();
        meta.remove(tags::FILE_META_INFORMATION_GROUP_LENGTH);

        if !meta.contains(tags::FILE_META_INFORMATION_VERSION) {
            meta.put(DataElement::new(
                tags::FILE_META_INFORMATION_VERSION,
                VR::OB,
                vec![0x00, 0x01],
            ));
        }
        if let Some(sop_class) = self.dataset.get(tags::SOP_CLASS_UID) {
            meta.put(DataElement::new(
                tags::MEDIA_STORAGE_SOP_CLASS_UID,
                VR::UI,
                sop_class.value().clone(),
            ));
        }
        if let Some(sop_instance) = self.dataset.get(tags::SOP_INSTANCE_UID) {
            meta.put(DataElement::new(
                tags::MEDIA_STORAGE_SOP_INSTANCE_UID,
                VR::UI,
                sop_instance.value().clone(),
            ));
        }
        meta.put(DataElement::text(
            tags::TRANSFER_SYNTAX_UID,
            VR::UI,
            self.syntax.uid(),
        ));
        if !meta.contains(tags::IMPLEMENTATION_CLASS_UID) {
            meta.put(DataElement::text(
                tags::IMPLEMENTATION_CLASS_UID,
                VR::UI,
                IMPLEMENTATION_CLASS_UID,
            ));
        }
        if !meta.contains(tags::IMPLEMENTATION_VERSION_NAME) {
            meta.put(DataElement::text(
                tags::IMPLEMENTATION_VERSION_NAME,
                VR::SH,
                IMPLEMENTATION_VERSION_NAME,
            ));
        }

        let group_bytes = meta.to_bytes(VrMode::Explicit)?;

        let mut out = Vec::with_capacity(12 + group_bytes.len());
        let group_length = DataElement::new(
            tags::FILE_META_INFORMATION_GROUP_LENGTH,
            VR::UL,
            (group_bytes.len() as u32).to_le_bytes().to_vec(),
        );
        write_element(&mut out, &group_length, VrMode::Explicit)?;
        out.extend_from_slice(&group_bytes);
        Ok(out)
    }
}

fn strip_signature(bytes: &[u8]) -> Option<&[u8]> {
    let rest = bytes.get(PREAMBLE_LENGTH..)?;
    rest.strip_prefix(MAGIC)
}

/// Guess the VR mode of a headerless stream: after the first 4-byte tag,
/// an explicit stream carries a readable two-letter VR code.
fn sniff_headerless_syntax(bytes: &[u8]) -> TransferSyntax {
    match bytes.get(4..6) {
        Some(code) if VR::from_bytes([code[0], code[1]]).is_some() => {
            TransferSyntax::ExplicitVrLittleEndian
        }
        _ => TransferSyntax::ImplicitVrLittleEndian,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::Tag;

    fn dict() -> TagDictionary {
        TagDictionary::new()
    }

    fn minimal_file(syntax: TransferSyntax) -> Vec<u8> {
        let mut meta = Dataset::new();
        meta.put(DataElement::text(
            tags::TRANSFER_SYNTAX_UID,
            VR::UI,
            syntax.uid(),
        ));
        let mut dataset = Dataset::new();
        dataset.put(DataElement::text(
            tags::SOP_INSTANCE_UID,
            VR::UI,
            "1.2.840.113619.2.1.1",
        ));
        dataset.put(DataElement::text(tags::PATIENT_NAME, VR::PN, "John^Doe"));
        let file = DicomFile {
            meta,
            dataset,
            syntax,
        };
        file.to_bytes().unwrap()
    }

    #[test]
    fn test_rejects_stream_without_signature() {
        let err = DicomFile::parse(&[0u8; 256], &dict()).unwrap_err();
        assert!(matches!(err, ParseError::NotADicomStream(_)));

        let err = DicomFile::parse(b"short", &dict()).unwrap_err();
        assert!(matches!(err, ParseError::NotADicomStream(_)));
    }

    #[test]
    fn test_parse_round_trip_explicit() {
        let bytes = minimal_file(TransferSyntax::ExplicitVrLittleEndian);
        let file = DicomFile::parse(&bytes, &dict()).unwrap();
        assert_eq!(file.transfer_syntax(), TransferSyntax::ExplicitVrLittleEndian);
        assert_eq!(
            file.dataset()
                .get(tags::PATIENT_NAME)
                .unwrap()
                .string_value()
                .unwrap(),
            "John^Doe"
        );

        // output re-parses to the same dataset
        let reparsed = DicomFile::parse(&file.to_bytes().unwrap(), &dict()).unwrap();
        assert_eq!(reparsed.dataset(), file.dataset());
    }

    #[test]
    fn test_parse_round_trip_implicit() {
        let bytes = minimal_file(TransferSyntax::ImplicitVrLittleEndian);
        let file = DicomFile::parse(&bytes, &dict()).unwrap();
        assert_eq!(file.transfer_syntax(), TransferSyntax::ImplicitVrLittleEndian);
        let reparsed = DicomFile::parse(&file.to_bytes().unwrap(), &dict()).unwrap();
        assert_eq!(reparsed.dataset(), file.dataset());
    }

    #[test]
    fn test_unsupported_transfer_syntax() {
        let mut meta = Dataset::new();
        // JPEG Baseline
        meta.put(DataElement::text(
            tags::TRANSFER_SYNTAX_UID,
            VR::UI,
            "1.2.840.10008.1.2.4.50",
        ));
        let file = DicomFile {
            meta,
            dataset: Dataset::new(),
            syntax: TransferSyntax::ExplicitVrLittleEndian,
        };
        let bytes = file.to_bytes().unwrap();
        // to_bytes overrides (0002,0010) with the declared syntax, so craft
        // the stream manually instead
        let mut raw = bytes[..PREAMBLE_LENGTH + 4].to_vec();
        let mut meta_only = Dataset::new();
        meta_only.put(DataElement::text(
            tags::TRANSFER_SYNTAX_UID,
            VR::UI,
            "1.2.840.10008.1.2.4.50",
        ));
        raw.extend_from_slice(&meta_only.to_bytes(VrMode::Explicit).unwrap());
        let err = DicomFile::parse(&raw, &dict()).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedTransferSyntax(_)));
    }

    #[test]
    fn test_group_length_is_recomputed() {
        let bytes = minimal_file(TransferSyntax::ExplicitVrLittleEndian);
        let file = DicomFile::parse(&bytes, &dict()).unwrap();
        let declared = file
            .meta
            .get(tags::FILE_META_INFORMATION_GROUP_LENGTH)
            .unwrap();
        let declared = match declared.value() {
            crate::element::Value::Primitive(b) => {
                u32::from_le_bytes([b[0], b[1], b[2], b[3]])
            }
            _ => panic!("group length should be primitive"),
        };
        // group length covers everything after its own value, up to the
        // first dataset element
        let meta_end = PREAMBLE_LENGTH + 4 + 12 + declared as usize;
        let tag_at_end = Tag(
            u16::from_le_bytes([bytes[meta_end], bytes[meta_end + 1]]),
            u16::from_le_bytes([bytes[meta_end + 2], bytes[meta_end + 3]]),
        );
        assert_eq!(tag_at_end, tags::SOP_INSTANCE_UID);
    }

    #[test]
    fn test_parse_forced_without_preamble() {
        let mut dataset = Dataset::new();
        dataset.put(DataElement::text(tags::PATIENT_ID, VR::LO, "12345"));
        let raw = dataset.to_bytes(VrMode::Explicit).unwrap();

        let file = DicomFile::parse_forced(&raw, &dict()).unwrap();
        assert_eq!(file.transfer_syntax(), TransferSyntax::ExplicitVrLittleEndian);
        assert_eq!(
            file.dataset().get(tags::PATIENT_ID).unwrap().string_value().unwrap(),
            "12345"
        );

        // and strict parse still rejects it
        assert!(DicomFile::parse(&raw, &dict()).is_err());
    }

    #[test]
    fn test_parse_forced_sniffs_implicit() {
        let mut dataset = Dataset::new();
        dataset.put(DataElement::text(tags::PATIENT_ID, VR::LO, "12345"));
        let raw = dataset.to_bytes(VrMode::Implicit).unwrap();

        let file = DicomFile::parse_forced(&raw, &dict()).unwrap();
        assert_eq!(file.transfer_syntax(), TransferSyntax::ImplicitVrLittleEndian);
    }
}
