use std::collections::BTreeMap;

use super::ValidationError;

/// Raw form submission: field name to submitted string value.
pub type FormData = BTreeMap<String, String>;

/// Optional form field. Missing, empty and whitespace-only values are absent.
pub fn optional(form: &FormData, field: &str) -> Option<String> {
    form.get(field)
        .filter(|value| !value.trim().is_empty())
        .cloned()
}

/// Required form field, passed through verbatim.
pub fn required(form: &FormData, field: &'static str) -> Result<String, ValidationError> {
    form.get(field)
        .cloned()
        .ok_or(ValidationError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_optional_blank_is_absent() {
        let form = form(&[("a", ""), ("b", "   "), ("c", "value")]);
        assert_eq!(optional(&form, "a"), None);
        assert_eq!(optional(&form, "b"), None);
        assert_eq!(optional(&form, "missing"), None);
        assert_eq!(optional(&form, "c").as_deref(), Some("value"));
    }

    #[test]
    fn test_optional_preserves_value_exactly() {
        let form = form(&[("prefix", " dicom-web ")]);
        assert_eq!(optional(&form, "prefix").as_deref(), Some(" dicom-web "));
    }

    #[test]
    fn test_required_passes_through_verbatim() {
        let form = form(&[("url", "")]);
        assert_eq!(required(&form, "url").unwrap(), "");
        assert!(matches!(
            required(&form, "other"),
            Err(ValidationError::MissingField("other"))
        ));
    }
}
