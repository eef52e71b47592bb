use crate::storage::StorageError;
use serde::{Deserialize, Serialize};

/// A parsed, not-yet-persisted registry row
///
/// `name` and `crime` are plain strings because every row carries those
/// columns, but the parser does not guarantee `crime` is non-empty; the
/// store checks both with [`CandidateRecord::validate`] before writing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,

    /// Registered permanent address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parents: Option<String>,

    pub crime: String,

    /// Number and date of the wanted-person decision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_number: Option<String>,

    /// Unit that issued the decision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuing_unit: Option<String>,
}

impl CandidateRecord {
    /// Creates a candidate with only the required fields set
    pub fn new(name: impl Into<String>, crime: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            crime: crime.into(),
            ..Self::default()
        }
    }

    /// Checks the invariants every stored entity must satisfy
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.name.trim().is_empty() {
            return Err(StorageError::InvalidRecord("name is empty".to_string()));
        }
        if self.crime.trim().is_empty() {
            return Err(StorageError::InvalidRecord(format!(
                "crime is empty for '{}'",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_required_fields_only() {
        let candidate = CandidateRecord::new("NGUYỄN VĂN A", "Giết người");
        assert_eq!(candidate.name, "NGUYỄN VĂN A");
        assert_eq!(candidate.crime, "Giết người");
        assert_eq!(candidate.birth_year, None);
        assert_eq!(candidate.decision_number, None);
    }

    #[test]
    fn test_validate_accepts_complete_record() {
        assert!(CandidateRecord::new("A", "B").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let result = CandidateRecord::new("   ", "Cướp tài sản").validate();
        assert!(matches!(result, Err(StorageError::InvalidRecord(_))));
    }

    #[test]
    fn test_validate_rejects_empty_crime() {
        let result = CandidateRecord::new("TRẦN VĂN B", "").validate();
        assert!(matches!(result, Err(StorageError::InvalidRecord(_))));
    }

    #[test]
    fn test_serializes_camel_case_without_absent_fields() {
        let mut candidate = CandidateRecord::new("A", "B");
        candidate.birth_year = Some(1990);

        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["birthYear"], 1990);
        assert!(json.get("decisionNumber").is_none());
    }
}
