use uuid::Uuid;

const UID_MAX_LENGTH: usize = 64;

/// Generate a fresh, globally unique DICOM UID.
///
/// Uses the standard UUID-derived form: `2.25.` followed by the decimal value
/// of a random v4 UUID. The result is at most 44 characters, well within the
/// 64-character UID limit.
pub fn generate_uid() -> String {
    let uid = format!("2.25.{}", Uuid::new_v4().as_u128());
    debug_assert!(uid.len() <= UID_MAX_LENGTH);
    uid
}
