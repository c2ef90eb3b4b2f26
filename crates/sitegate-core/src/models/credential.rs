//! Domain models for credential records.
//!
//! These types represent the credential sheet in a clean domain format,
//! decoupled from the spreadsheet response structures.

use serde::{Deserialize, Serialize};

/// Role assigned when the sheet leaves the role column blank.
pub const DEFAULT_ROLE: &str = "user";

/// One row of the credential sheet.
///
/// Both hashes are hex digests of the salted username and password. They are
/// stored trimmed and lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub username_hash: String,
    pub password_hash: String,
    pub role: String,
}

impl CredentialRecord {
    pub fn new(
        username_hash: impl AsRef<str>,
        password_hash: impl AsRef<str>,
        role: impl AsRef<str>,
    ) -> Self {
        let role = role.as_ref().trim();
        Self {
            username_hash: username_hash.as_ref().trim().to_ascii_lowercase(),
            password_hash: password_hash.as_ref().trim().to_ascii_lowercase(),
            role: if role.is_empty() {
                DEFAULT_ROLE.to_string()
            } else {
                role.to_string()
            },
        }
    }

    /// Check both digests against this record.
    pub fn matches(&self, username_hash: &str, password_hash: &str) -> bool {
        self.username_hash.eq_ignore_ascii_case(username_hash)
            && self.password_hash.eq_ignore_ascii_case(password_hash)
    }
}

/// Read-only snapshot of the credential sheet, in sheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialTable {
    records: Vec<CredentialRecord>,
}

impl CredentialTable {
    pub const fn empty() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn new(records: Vec<CredentialRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CredentialRecord] {
        &self.records
    }

    /// First record in sheet order whose digests both match.
    /// Duplicate username hashes are not deduplicated; earlier rows win.
    pub fn find_match(&self, username_hash: &str, password_hash: &str) -> Option<&CredentialRecord> {
        self.records
            .iter()
            .find(|r| r.matches(username_hash, password_hash))
    }
}

impl FromIterator<CredentialRecord> for CredentialTable {
    fn from_iter<I: IntoIterator<Item = CredentialRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_new_normalizes() {
        let record = CredentialRecord::new("  ABCDEF ", "0123AB\n", "");
        assert_eq!(record.username_hash, "abcdef");
        assert_eq!(record.password_hash, "0123ab");
        assert_eq!(record.role, DEFAULT_ROLE);

        let admin = CredentialRecord::new("aa", "bb", " admin ");
        assert_eq!(admin.role, "admin");
    }

    #[test]
    fn test_record_matches_requires_both() {
        let record = CredentialRecord::new("aa11", "bb22", "admin");
        assert!(record.matches("aa11", "bb22"));
        assert!(record.matches("AA11", "BB22")); // Hex case is irrelevant
        assert!(!record.matches("aa11", "cc33"));
        assert!(!record.matches("cc33", "bb22"));
    }

    #[test]
    fn test_find_match_first_wins() {
        let table: CredentialTable = vec![
            CredentialRecord::new("u1", "p1", "admin"),
            CredentialRecord::new("u1", "p1", "user"),
            CredentialRecord::new("u1", "p2", "editor"),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.len(), 3);
        assert_eq!(table.find_match("u1", "p1").map(|r| r.role.as_str()), Some("admin"));
        assert_eq!(table.find_match("u1", "p2").map(|r| r.role.as_str()), Some("editor"));
        assert!(table.find_match("u2", "p1").is_none());
    }

    #[test]
    fn test_empty_table() {
        let table = CredentialTable::empty();
        assert!(table.is_empty());
        assert!(table.find_match("", "").is_none());
    }
}
