//! Rule-driven de-identification of DICOM instances.
//!
//! The crate carries its own data-element codec for the little endian
//! transfer syntaxes, so no external DICOM toolkit is involved: a stream is
//! parsed into a [`Dataset`](dataset::Dataset), a named
//! [`Profile`](profile::Profile) of per-tag rules is applied, the result is
//! finalized (de-identification marker, fresh SOP instance UID) and
//! serialized back with recomputed lengths.
//!
//! ```no_run
//! use dicom_deident::profile::ProfileCatalog;
//! use dicom_deident::Anonymizer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = ProfileCatalog::from_json(&std::fs::read_to_string("profiles.json")?)?;
//! let profile = catalog.get("default")?;
//!
//! let anonymizer = Anonymizer::new(std::env::var("PERSISTENT_HASH_SECRET")?);
//! let input = std::fs::read("input.dcm")?;
//! let anonymized = anonymizer.anonymize_bytes(&input, &profile)?;
//! std::fs::write("output.dcm", anonymized.into_bytes()?)?;
//! # Ok(())
//! # }
//! ```

pub mod dataset;
pub mod dictionary;
pub mod element;
pub mod file;
pub mod hashing;
pub mod processor;
pub mod profile;
pub mod tag;
pub mod tags;
pub mod uid;
pub mod vr;

use crate::dataset::Dataset;
use crate::dictionary::TagDictionary;
use crate::element::{DataElement, ParseError};
use crate::file::DicomFile;
use crate::processor::{ApplyError, RuleEngine};
use crate::profile::Profile;
use crate::vr::VR;
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnonymizationError {
    /// The input could not be parsed as a DICOM stream.
    #[error("read error: {0}")]
    ReadError(ParseError),

    #[error("processing error: {0}")]
    ProcessingError(#[from] ApplyError),

    /// The transformed dataset could not be serialized.
    #[error("write error: {0}")]
    WriteError(ParseError),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T, E = AnonymizationError> = std::result::Result<T, E>;

/// The de-identification pipeline: parse, apply a profile, finalize,
/// serialize.
///
/// One `Anonymizer` is shared across files (and threads); the profile is
/// passed per call so one instance can serve different profiles.
#[derive(Debug, Clone)]
pub struct Anonymizer {
    dictionary: TagDictionary,
    engine: RuleEngine,
    force: bool,
}

impl Default for Anonymizer {
    fn default() -> Self {
        Self::new("")
    }
}

impl Anonymizer {
    /// Create a pipeline whose `hash_persistent` rules are salted with
    /// `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            dictionary: TagDictionary::new(),
            engine: RuleEngine::new(secret),
            force: false,
        }
    }

    /// Also accept streams without the preamble and `DICM` signature,
    /// guessing the transfer syntax from the first element.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn anonymize(&self, mut src: impl Read, profile: &Profile) -> Result<Anonymized> {
        let mut bytes = Vec::new();
        src.read_to_end(&mut bytes)?;
        self.anonymize_bytes(&bytes, profile)
    }

    /// Run the whole pipeline over one in-memory instance.
    ///
    /// On any error the input is left untouched and no output exists; there
    /// is no partially transformed result.
    pub fn anonymize_bytes(&self, bytes: &[u8], profile: &Profile) -> Result<Anonymized> {
        let mut file = if self.force {
            DicomFile::parse_forced(bytes, &self.dictionary)
        } else {
            DicomFile::parse(bytes, &self.dictionary)
        }
        .map_err(AnonymizationError::ReadError)?;

        self.engine.apply(file.dataset_mut(), profile)?;
        finalize(file.dataset_mut());
        Ok(Anonymized { file })
    }
}

/// Unconditional post-rule steps, applied regardless of profile content.
fn finalize(dataset: &mut Dataset) {
    dataset.put(DataElement::text(
        tags::PATIENT_IDENTITY_REMOVED,
        VR::CS,
        "YES",
    ));
    // the de-identified instance is a new object and must not keep the
    // original's SOP instance identity
    dataset.put(DataElement::text(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        &uid::generate_uid(),
    ));
}

/// The result of a successful pipeline run.
#[derive(Debug)]
pub struct Anonymized {
    file: DicomFile,
}

impl Anonymized {
    pub fn dataset(&self) -> &Dataset {
        self.file.dataset()
    }

    pub fn file(&self) -> &DicomFile {
        &self.file
    }

    /// Serialize to a complete DICOM stream, with the file meta group and
    /// all lengths regenerated.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        self.file
            .to_bytes()
            .map_err(AnonymizationError::WriteError)
    }

    pub fn write(&self, mut dst: impl Write) -> Result<()> {
        let bytes = self
            .file
            .to_bytes()
            .map_err(AnonymizationError::WriteError)?;
        dst.write_all(&bytes)?;
        Ok(())
    }
}
