use crate::models::{FileDescriptor, FileRules, ValidationResult};

const BYTES_PER_UNIT: f64 = 1024.0;
const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

fn type_allowed(mime_type: &str, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }

    allowed.iter().any(|pattern| match pattern.strip_suffix("/*") {
        Some(family) => mime_type
            .split_once('/')
            .is_some_and(|(prefix, _)| prefix.eq_ignore_ascii_case(family)),
        None => pattern.eq_ignore_ascii_case(mime_type),
    })
}

pub fn validate_file(file: Option<&FileDescriptor>, rules: &FileRules) -> ValidationResult {
    let Some(file) = file else {
        return ValidationResult::invalid(format!("{} is required", rules.field_label));
    };

    let max_bytes = rules.max_size_mb.saturating_mul(1024 * 1024);
    if file.size_bytes > max_bytes {
        return ValidationResult::invalid(format!(
            "{} must not exceed {} MB",
            rules.field_label, rules.max_size_mb
        ));
    }

    if !type_allowed(&file.mime_type, &rules.allowed_types) {
        return ValidationResult::invalid(format!(
            "{} type is not allowed. Allowed types: {}",
            rules.field_label,
            rules.allowed_types.join(", ")
        ));
    }

    ValidationResult::ok()
}

/// Human readable size with at most two decimals, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= BYTES_PER_UNIT && unit < UNITS.len() - 1 {
        value /= BYTES_PER_UNIT;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(size_bytes: u64) -> FileDescriptor {
        FileDescriptor {
            name: "foto.png".to_string(),
            size_bytes,
            mime_type: "image/png".to_string(),
        }
    }

    #[test]
    fn test_size_limit() {
        let rules = FileRules {
            max_size_mb: 2,
            ..FileRules::default()
        };
        assert!(validate_file(Some(&image(2 * 1024 * 1024)), &rules).valid);
        assert!(!validate_file(Some(&image(2 * 1024 * 1024 + 1)), &rules).valid);
    }

    #[test]
    fn test_wildcard_types() {
        let rules = FileRules {
            allowed_types: vec!["image/*".to_string(), "application/pdf".to_string()],
            field_label: "Profile photo".to_string(),
            ..FileRules::default()
        };
        assert!(validate_file(Some(&image(10)), &rules).valid);

        let text = FileDescriptor {
            name: "notes.txt".to_string(),
            size_bytes: 10,
            mime_type: "text/plain".to_string(),
        };
        let result = validate_file(Some(&text), &rules);
        assert!(!result.valid);
        assert!(result.message.unwrap().starts_with("Profile photo type is not allowed"));
    }

    #[test]
    fn test_missing_file() {
        assert!(!validate_file(None, &FileRules::default()).valid);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2_621_440), "2.5 MB");
        assert_eq!(format_file_size(1024 * 1024 * 1024), "1 GB");
    }
}
