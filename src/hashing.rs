use sha2::{Digest, Sha256};

pub trait Hasher {
    fn hash(&self, input: &str) -> String;
}

/// Salted SHA-256, rendered as 64 lowercase hex characters.
///
/// The digest is computed over the UTF-8 bytes of the value followed by the
/// UTF-8 bytes of the salt. With an empty salt this is plain SHA-256 of the
/// value, so `Sha256Hasher::new().hash(v)` equals
/// `Sha256Hasher::with_salt("").hash(v)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sha256Hasher {
    salt: String,
}

impl Sha256Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_salt(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }
}

impl Hasher for Sha256Hasher {
    fn hash(&self, input: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        hasher.update(self.salt.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        let hasher = Sha256Hasher::new();
        assert_eq!(
            hasher.hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hasher.hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_salt_is_appended() {
        // hash of "12345" with salt "abc" equals hash of "12345abc"
        let salted = Sha256Hasher::with_salt("abc");
        let plain = Sha256Hasher::new();
        assert_eq!(salted.hash("12345"), plain.hash("12345abc"));
    }

    #[test]
    fn test_empty_salt_equals_unsalted() {
        let unsalted = Sha256Hasher::new();
        let empty_salt = Sha256Hasher::with_salt("");
        assert_eq!(unsalted.hash("12345"), empty_salt.hash("12345"));
    }

    #[test]
    fn test_output_shape() {
        let hasher = Sha256Hasher::with_salt("secret");
        let digest = hasher.hash("PatientName");
        assert_eq!(digest.len(), 64);
        assert!(digest
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_deterministic() {
        let hasher = Sha256Hasher::with_salt("secret");
        assert_eq!(hasher.hash("12345"), hasher.hash("12345"));
    }

    #[test]
    fn test_different_salts_differ() {
        assert_ne!(
            Sha256Hasher::with_salt("a").hash("12345"),
            Sha256Hasher::with_salt("b").hash("12345")
        );
    }
}
