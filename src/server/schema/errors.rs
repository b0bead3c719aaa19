use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

/// Why a single field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Missing,
    TooShort,
    NotInSet,
    MalformedUrl,
    WrongType,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::Missing => "missing",
            Reason::TooShort => "too_short",
            Reason::NotInSet => "not_in_set",
            Reason::MalformedUrl => "malformed_url",
            Reason::WrongType => "wrong_type",
        }
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[error("{field}: {message}")]
pub struct ValidationError {
    #[serde(skip)]
    pub field: String,
    pub reason: Reason,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: Reason, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason,
            message: message.into(),
        }
    }
}

/// Every field error found in one validation pass.
///
/// Serializes as a map of field name to its list of `{reason, message}`
/// entries, which is the shape the pages and the JSON API both consume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Errors for one field, in the order they were found.
    pub fn field(&self, name: &str) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.field == name).collect()
    }

    pub fn reason_for(&self, name: &str) -> Option<Reason> {
        self.errors.iter().find(|e| e.field == name).map(|e| e.reason)
    }

    /// First message per field, for rendering inline under form inputs.
    pub fn messages(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for error in &self.errors {
            out.entry(error.field.clone())
                .or_insert_with(|| error.message.clone());
        }
        out
    }

    fn grouped(&self) -> BTreeMap<&str, Vec<&ValidationError>> {
        let mut grouped: BTreeMap<&str, Vec<&ValidationError>> = BTreeMap::new();
        for error in &self.errors {
            grouped.entry(error.field.as_str()).or_default().push(error);
        }
        grouped
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let grouped = self.grouped();
        let mut map = serializer.serialize_map(Some(grouped.len()))?;
        for (field, errors) in grouped {
            map.serialize_entry(field, &errors)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_grouped_by_field() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::new("molecule", Reason::TooShort, "Molecule name is required."));
        errors.push(ValidationError::new("disease", Reason::Missing, "Disease name is required."));

        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            value,
            json!({
                "disease": [{"reason": "missing", "message": "Disease name is required."}],
                "molecule": [{"reason": "too_short", "message": "Molecule name is required."}],
            })
        );
    }

    #[test]
    fn messages_keep_first_per_field() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::new("a", Reason::Missing, "first"));
        errors.push(ValidationError::new("a", Reason::TooShort, "second"));
        assert_eq!(errors.messages().get("a").map(String::as_str), Some("first"));
        assert_eq!(errors.len(), 2);
    }
}
