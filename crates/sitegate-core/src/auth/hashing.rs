use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

/// Digest primitives the verifier can hash with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha256,
}

impl DigestAlgorithm {
    /// Look up a primitive by name. Unknown names mean hashing is unavailable.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().replace('_', "-").as_str() {
            "SHA-256" | "SHA256" => Some(Self::Sha256),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-256",
        }
    }

    /// Lowercase hex digest of `input` followed by `salt`
    pub fn digest(&self, input: &str, salt: &str) -> String {
        match self {
            Self::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(input.as_bytes());
                hasher.update(salt.as_bytes());
                format!("{:x}", hasher.finalize())
            }
        }
    }
}

/// Salted SHA-256 of `input`, as 64 lowercase hex characters.
pub fn hash(input: &str, salt: &str) -> String {
    DigestAlgorithm::Sha256.digest(input, salt)
}
