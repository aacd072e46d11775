//! A minimal data element dictionary.
//!
//! Implicit-VR streams do not carry a VR per element, so parsing them needs a
//! tag → VR lookup. The table below covers the file meta group and the data
//! elements that de-identification profiles commonly touch; anything else
//! resolves to `UN` and is carried through opaquely.

use crate::tag::Tag;
use crate::tags;
use crate::vr::VR;
use std::collections::HashMap;

/// One dictionary record: tag, value representation and alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub tag: Tag,
    pub vr: VR,
    pub alias: &'static str,
}

macro_rules! entry {
    ($tag:expr, $vr:ident, $alias:literal) => {
        DictionaryEntry {
            tag: $tag,
            vr: VR::$vr,
            alias: $alias,
        }
    };
}

#[rustfmt::skip]
const ENTRIES: &[DictionaryEntry] = &[
    entry!(tags::FILE_META_INFORMATION_GROUP_LENGTH, UL, "FileMetaInformationGroupLength"),
    entry!(tags::FILE_META_INFORMATION_VERSION, OB, "FileMetaInformationVersion"),
    entry!(tags::MEDIA_STORAGE_SOP_CLASS_UID, UI, "MediaStorageSOPClassUID"),
    entry!(tags::MEDIA_STORAGE_SOP_INSTANCE_UID, UI, "MediaStorageSOPInstanceUID"),
    entry!(tags::TRANSFER_SYNTAX_UID, UI, "TransferSyntaxUID"),
    entry!(tags::IMPLEMENTATION_CLASS_UID, UI, "ImplementationClassUID"),
    entry!(tags::IMPLEMENTATION_VERSION_NAME, SH, "ImplementationVersionName"),
    entry!(tags::SPECIFIC_CHARACTER_SET, CS, "SpecificCharacterSet"),
    entry!(tags::IMAGE_TYPE, CS, "ImageType"),
    entry!(tags::SOP_CLASS_UID, UI, "SOPClassUID"),
    entry!(tags::SOP_INSTANCE_UID, UI, "SOPInstanceUID"),
    entry!(tags::STUDY_DATE, DA, "StudyDate"),
    entry!(tags::SERIES_DATE, DA, "SeriesDate"),
    entry!(tags::ACQUISITION_DATE, DA, "AcquisitionDate"),
    entry!(tags::CONTENT_DATE, DA, "ContentDate"),
    entry!(tags::STUDY_TIME, TM, "StudyTime"),
    entry!(tags::SERIES_TIME, TM, "SeriesTime"),
    entry!(tags::ACQUISITION_TIME, TM, "AcquisitionTime"),
    entry!(tags::CONTENT_TIME, TM, "ContentTime"),
    entry!(tags::ACCESSION_NUMBER, SH, "AccessionNumber"),
    entry!(tags::MODALITY, CS, "Modality"),
    entry!(tags::MANUFACTURER, LO, "Manufacturer"),
    entry!(tags::INSTITUTION_NAME, LO, "InstitutionName"),
    entry!(tags::INSTITUTION_ADDRESS, ST, "InstitutionAddress"),
    entry!(tags::REFERRING_PHYSICIAN_NAME, PN, "ReferringPhysicianName"),
    entry!(tags::STATION_NAME, SH, "StationName"),
    entry!(tags::STUDY_DESCRIPTION, LO, "StudyDescription"),
    entry!(tags::SERIES_DESCRIPTION, LO, "SeriesDescription"),
    entry!(tags::INSTITUTIONAL_DEPARTMENT_NAME, LO, "InstitutionalDepartmentName"),
    entry!(tags::PHYSICIANS_OF_RECORD, PN, "PhysiciansOfRecord"),
    entry!(tags::PERFORMING_PHYSICIAN_NAME, PN, "PerformingPhysicianName"),
    entry!(tags::NAME_OF_PHYSICIANS_READING_STUDY, PN, "NameOfPhysiciansReadingStudy"),
    entry!(tags::OPERATORS_NAME, PN, "OperatorsName"),
    entry!(tags::MANUFACTURER_MODEL_NAME, LO, "ManufacturerModelName"),
    entry!(tags::REFERENCED_IMAGE_SEQUENCE, SQ, "ReferencedImageSequence"),
    entry!(tags::REFERENCED_SOP_CLASS_UID, UI, "ReferencedSOPClassUID"),
    entry!(tags::REFERENCED_SOP_INSTANCE_UID, UI, "ReferencedSOPInstanceUID"),
    entry!(tags::DERIVATION_DESCRIPTION, ST, "DerivationDescription"),
    entry!(tags::PATIENT_NAME, PN, "PatientName"),
    entry!(tags::PATIENT_ID, LO, "PatientID"),
    entry!(tags::ISSUER_OF_PATIENT_ID, LO, "IssuerOfPatientID"),
    entry!(tags::PATIENT_BIRTH_DATE, DA, "PatientBirthDate"),
    entry!(tags::PATIENT_SEX, CS, "PatientSex"),
    entry!(tags::OTHER_PATIENT_IDS, LO, "OtherPatientIDs"),
    entry!(tags::OTHER_PATIENT_NAMES, PN, "OtherPatientNames"),
    entry!(tags::PATIENT_AGE, AS, "PatientAge"),
    entry!(tags::PATIENT_SIZE, DS, "PatientSize"),
    entry!(tags::PATIENT_WEIGHT, DS, "PatientWeight"),
    entry!(tags::PATIENT_ADDRESS, LO, "PatientAddress"),
    entry!(tags::PATIENT_TELEPHONE_NUMBERS, SH, "PatientTelephoneNumbers"),
    entry!(tags::ETHNIC_GROUP, SH, "EthnicGroup"),
    entry!(tags::OCCUPATION, SH, "Occupation"),
    entry!(tags::ADDITIONAL_PATIENT_HISTORY, LT, "AdditionalPatientHistory"),
    entry!(tags::PATIENT_COMMENTS, LT, "PatientComments"),
    entry!(tags::CLINICAL_TRIAL_SPONSOR_NAME, LO, "ClinicalTrialSponsorName"),
    entry!(tags::CLINICAL_TRIAL_PROTOCOL_ID, LO, "ClinicalTrialProtocolID"),
    entry!(tags::CLINICAL_TRIAL_SUBJECT_ID, LO, "ClinicalTrialSubjectID"),
    entry!(tags::PATIENT_IDENTITY_REMOVED, CS, "PatientIdentityRemoved"),
    entry!(tags::DEIDENTIFICATION_METHOD, LO, "DeidentificationMethod"),
    entry!(tags::BODY_PART_EXAMINED, CS, "BodyPartExamined"),
    entry!(tags::DEVICE_SERIAL_NUMBER, LO, "DeviceSerialNumber"),
    entry!(tags::SOFTWARE_VERSIONS, LO, "SoftwareVersions"),
    entry!(tags::PROTOCOL_NAME, LO, "ProtocolName"),
    entry!(tags::STUDY_INSTANCE_UID, UI, "StudyInstanceUID"),
    entry!(tags::SERIES_INSTANCE_UID, UI, "SeriesInstanceUID"),
    entry!(tags::STUDY_ID, SH, "StudyID"),
    entry!(tags::SERIES_NUMBER, IS, "SeriesNumber"),
    entry!(tags::INSTANCE_NUMBER, IS, "InstanceNumber"),
    entry!(tags::FRAME_OF_REFERENCE_UID, UI, "FrameOfReferenceUID"),
    entry!(tags::IMAGE_COMMENTS, LT, "ImageComments"),
    entry!(tags::SAMPLES_PER_PIXEL, US, "SamplesPerPixel"),
    entry!(tags::PHOTOMETRIC_INTERPRETATION, CS, "PhotometricInterpretation"),
    entry!(tags::ROWS, US, "Rows"),
    entry!(tags::COLUMNS, US, "Columns"),
    entry!(tags::BITS_ALLOCATED, US, "BitsAllocated"),
    entry!(tags::BITS_STORED, US, "BitsStored"),
    entry!(tags::HIGH_BIT, US, "HighBit"),
    entry!(tags::PIXEL_REPRESENTATION, US, "PixelRepresentation"),
    entry!(tags::PERFORMED_PROCEDURE_STEP_ID, SH, "PerformedProcedureStepID"),
    entry!(tags::REQUEST_ATTRIBUTES_SEQUENCE, SQ, "RequestAttributesSequence"),
    entry!(tags::PIXEL_DATA, OW, "PixelData"),
];

/// Read-only tag dictionary, built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct TagDictionary {
    by_tag: HashMap<Tag, &'static DictionaryEntry>,
}

impl TagDictionary {
    pub fn new() -> Self {
        let mut by_tag = HashMap::with_capacity(ENTRIES.len());
        for entry in ENTRIES {
            by_tag.insert(entry.tag, entry);
        }
        Self { by_tag }
    }

    pub fn entry(&self, tag: Tag) -> Option<&DictionaryEntry> {
        self.by_tag.get(&tag).copied()
    }

    /// The VR to assume for a tag in an implicit-VR stream.
    /// Tags absent from the dictionary are treated as opaque (`UN`).
    pub fn vr_of(&self, tag: Tag) -> VR {
        self.entry(tag).map(|e| e.vr).unwrap_or(VR::UN)
    }

    pub fn alias_of(&self, tag: Tag) -> Option<&'static str> {
        self.entry(tag).map(|e| e.alias)
    }
}

impl Default for TagDictionary {
    fn default() -> Self {
        Self::new()
    }
}
