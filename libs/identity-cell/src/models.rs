use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==============================================================================
// VALIDATION RESULTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PasswordStrength {
    #[serde(rename = "debil")]
    Weak,
    #[serde(rename = "media")]
    Medium,
    #[serde(rename = "fuerte")]
    Strong,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordRequirements {
    pub min_length: bool,
    pub has_uppercase: bool,
    pub has_lowercase: bool,
    pub has_digit: bool,
    pub has_special: bool,
}

impl PasswordRequirements {
    pub fn satisfied_count(&self) -> usize {
        [
            self.min_length,
            self.has_uppercase,
            self.has_lowercase,
            self.has_digit,
            self.has_special,
        ]
        .iter()
        .filter(|met| **met)
        .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<PasswordStrength>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub requirements: PasswordRequirements,
    pub satisfied: usize,
}

// ==============================================================================
// RULES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneRules {
    pub prefix: String,
    pub subscriber_digits: usize,
}

impl PhoneRules {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn expected_length(&self) -> usize {
        self.prefix.chars().count() + self.subscriber_digits
    }
}

impl Default for PhoneRules {
    fn default() -> Self {
        Self {
            prefix: "+56".to_string(),
            subscriber_digits: 9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRules {
    pub max_size_mb: u64,
    /// Exact MIME types or `type/*` wildcards. Empty accepts any type.
    pub allowed_types: Vec<String>,
    pub field_label: String,
}

impl Default for FileRules {
    fn default() -> Self {
        Self {
            max_size_mb: 10,
            allowed_types: Vec::new(),
            field_label: "File".to_string(),
        }
    }
}

// ==============================================================================
// REQUEST / RESPONSE BODIES
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct ValueRequest {
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct BirthDateRequest {
    pub birth_date: String,
    /// IANA zone name, e.g. `America/Santiago`.
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FileValidationRequest {
    pub file: Option<FileDescriptor>,
    pub max_size_mb: Option<u64>,
    #[serde(default)]
    pub allowed_types: Vec<String>,
    pub field_label: Option<String>,
}

impl FileValidationRequest {
    pub fn rules(&self) -> FileRules {
        let defaults = FileRules::default();
        FileRules {
            max_size_mb: self.max_size_mb.unwrap_or(defaults.max_size_mb),
            allowed_types: self.allowed_types.clone(),
            field_label: self.field_label.clone().unwrap_or(defaults.field_label),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileValidation {
    #[serde(flatten)]
    pub result: ValidationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FormattedNationalId {
    pub formatted: String,
    pub cleaned: String,
}

#[derive(Debug, Serialize)]
pub struct PhoneValidation {
    #[serde(flatten)]
    pub result: ValidationResult,
    pub normalized: String,
}

#[derive(Debug, Serialize)]
pub struct AgeValidation {
    #[serde(flatten)]
    pub result: ValidationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
}
