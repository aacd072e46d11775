use dicom_deident::dataset::Dataset;
use dicom_deident::dictionary::TagDictionary;
use dicom_deident::element::DataElement;
use dicom_deident::file::{DicomFile, TransferSyntax};
use dicom_deident::hashing::{Hasher, Sha256Hasher};
use dicom_deident::profile::ProfileCatalog;
use dicom_deident::vr::VR;
use dicom_deident::{tags, Anonymizer};

const SECRET: &str = "integration-secret";

const CATALOG: &str = r#"
{
    "profiles": {
        "default": [
            { "tag": "(0010,0010)", "action": "remove" },
            { "tag": "(0010,0020)", "action": "hash_persistent" },
            { "tag": "(0008,0050)", "action": "replace", "value": "ANON" },
            { "tag": "(0010,0040)", "action": "empty" }
        ],
        "minimal": [
            { "tag": "(0010,0010)", "action": "remove" }
        ]
    }
}"#;

fn sample_instance(syntax: TransferSyntax) -> Vec<u8> {
    let mut dataset = Dataset::new();
    dataset.put(DataElement::text(
        tags::SOP_CLASS_UID,
        VR::UI,
        "1.2.840.10008.5.1.4.1.1.2",
    ));
    dataset.put(DataElement::text(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        "1.2.840.113619.2.1.1",
    ));
    dataset.put(DataElement::text(tags::ACCESSION_NUMBER, VR::SH, "ACC001"));
    dataset.put(DataElement::text(tags::MODALITY, VR::CS, "CT"));
    dataset.put(DataElement::text(tags::PATIENT_NAME, VR::PN, "John^Doe"));
    dataset.put(DataElement::text(tags::PATIENT_ID, VR::LO, "12345"));
    dataset.put(DataElement::text(tags::PATIENT_SEX, VR::CS, "M"));
    dataset.put(DataElement::text(
        tags::STUDY_INSTANCE_UID,
        VR::UI,
        "1.2.840.113619.2.1.2",
    ));
    dataset.put(DataElement::text(
        tags::SERIES_INSTANCE_UID,
        VR::UI,
        "1.2.840.113619.2.1.3",
    ));
    dataset.put(DataElement::new(
        tags::ROWS,
        VR::US,
        512u16.to_le_bytes().to_vec(),
    ));
    DicomFile::new(dataset, syntax).to_bytes().unwrap()
}

fn default_profile() -> dicom_deident::profile::Profile {
    ProfileCatalog::from_json(CATALOG)
        .unwrap()
        .get("default")
        .unwrap()
}

#[test]
fn full_pipeline_removes_hashes_and_finalizes() {
    let anonymizer = Anonymizer::new(SECRET);
    let input = sample_instance(TransferSyntax::ExplicitVrLittleEndian);
    let output = anonymizer
        .anonymize_bytes(&input, &default_profile())
        .unwrap()
        .into_bytes()
        .unwrap();

    let reparsed = DicomFile::parse(&output, &TagDictionary::new()).unwrap();
    let ds = reparsed.dataset();

    // removed
    assert!(!ds.contains(tags::PATIENT_NAME));

    // hashed with the persistent secret
    assert_eq!(
        ds.get(tags::PATIENT_ID).unwrap().string_value().unwrap(),
        Sha256Hasher::with_salt(SECRET).hash("12345")
    );

    // replaced and emptied
    assert_eq!(
        ds.get(tags::ACCESSION_NUMBER)
            .unwrap()
            .string_value()
            .unwrap(),
        "ANON"
    );
    assert!(ds.get(tags::PATIENT_SEX).unwrap().is_empty());

    // untouched element survives
    assert_eq!(ds.get(tags::MODALITY).unwrap().string_value().unwrap(), "CT");

    // finalization
    assert_eq!(
        ds.get(tags::PATIENT_IDENTITY_REMOVED)
            .unwrap()
            .string_value()
            .unwrap(),
        "YES"
    );
    let sop_uid = ds.get(tags::SOP_INSTANCE_UID).unwrap().string_value().unwrap();
    assert_ne!(sop_uid, "1.2.840.113619.2.1.1");
    assert!(sop_uid.starts_with("2.25."));
}

#[test]
fn output_is_a_complete_dicom_file() {
    let anonymizer = Anonymizer::new(SECRET);
    let input = sample_instance(TransferSyntax::ExplicitVrLittleEndian);
    let output = anonymizer
        .anonymize_bytes(&input, &default_profile())
        .unwrap()
        .into_bytes()
        .unwrap();

    // 128-byte preamble followed by the DICM signature
    assert!(output.len() > 132);
    assert!(output[..128].iter().all(|&b| b == 0));
    assert_eq!(&output[128..132], b"DICM");

    // strict re-parse accepts it
    assert!(DicomFile::parse(&output, &TagDictionary::new()).is_ok());
}

#[test]
fn transfer_syntax_is_preserved() {
    let anonymizer = Anonymizer::new(SECRET);
    for syntax in [
        TransferSyntax::ExplicitVrLittleEndian,
        TransferSyntax::ImplicitVrLittleEndian,
    ] {
        let input = sample_instance(syntax);
        let output = anonymizer
            .anonymize_bytes(&input, &default_profile())
            .unwrap()
            .into_bytes()
            .unwrap();
        let reparsed = DicomFile::parse(&output, &TagDictionary::new()).unwrap();
        assert_eq!(reparsed.transfer_syntax(), syntax);
    }
}

#[test]
fn pipeline_without_hash_is_idempotent_up_to_sop_uid() {
    let anonymizer = Anonymizer::new(SECRET);
    let catalog = ProfileCatalog::from_json(CATALOG).unwrap();
    let profile = catalog.get("minimal").unwrap();

    let once = anonymizer
        .anonymize_bytes(
            &sample_instance(TransferSyntax::ExplicitVrLittleEndian),
            &profile,
        )
        .unwrap()
        .into_bytes()
        .unwrap();
    let twice = anonymizer
        .anonymize_bytes(&once, &profile)
        .unwrap()
        .into_bytes()
        .unwrap();

    let dict = TagDictionary::new();
    let mut first = DicomFile::parse(&once, &dict).unwrap();
    let mut second = DicomFile::parse(&twice, &dict).unwrap();

    // each run mints a fresh SOP instance UID; everything else is stable
    first.dataset_mut().remove(tags::SOP_INSTANCE_UID);
    second.dataset_mut().remove(tags::SOP_INSTANCE_UID);
    assert_eq!(first.dataset(), second.dataset());
}

#[test]
fn sequences_pass_through_untouched() {
    let mut item = Dataset::new();
    item.put(DataElement::text(
        tags::REFERENCED_SOP_INSTANCE_UID,
        VR::UI,
        "1.2.840.113619.2.1.9",
    ));
    let mut dataset = Dataset::new();
    dataset.put(DataElement::text(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        "1.2.840.113619.2.1.1",
    ));
    dataset.put(DataElement::new(
        tags::REFERENCED_IMAGE_SEQUENCE,
        VR::SQ,
        vec![item.clone()],
    ));
    let input = DicomFile::new(dataset, TransferSyntax::ExplicitVrLittleEndian)
        .to_bytes()
        .unwrap();

    let anonymizer = Anonymizer::new(SECRET);
    let output = anonymizer
        .anonymize_bytes(&input, &default_profile())
        .unwrap()
        .into_bytes()
        .unwrap();

    let reparsed = DicomFile::parse(&output, &TagDictionary::new()).unwrap();
    let elem = reparsed
        .dataset()
        .get(tags::REFERENCED_IMAGE_SEQUENCE)
        .unwrap();
    assert_eq!(elem.items().unwrap(), &[item]);
}

#[test]
fn persistent_hash_is_stable_across_runs() {
    let input = sample_instance(TransferSyntax::ExplicitVrLittleEndian);
    let dict = TagDictionary::new();

    let hash_of_run = || {
        let anonymizer = Anonymizer::new(SECRET);
        let output = anonymizer
            .anonymize_bytes(&input, &default_profile())
            .unwrap()
            .into_bytes()
            .unwrap();
        DicomFile::parse(&output, &dict)
            .unwrap()
            .dataset()
            .get(tags::PATIENT_ID)
            .unwrap()
            .string_value()
            .unwrap()
    };
    assert_eq!(hash_of_run(), hash_of_run());
}

#[test]
fn non_dicom_input_is_rejected() {
    let anonymizer = Anonymizer::new(SECRET);
    let err = anonymizer.anonymize_bytes(b"hello world", &default_profile());
    assert!(err.is_err());

    // even a long zero-filled stream without the signature
    let err = anonymizer.anonymize_bytes(&[0u8; 4096], &default_profile());
    assert!(err.is_err());
}
