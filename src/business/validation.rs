use crate::domain::{ChallengeFields, CHALLENGE_FIELD_KEYS};
use std::fmt;

/// One or more required partner fields were blank or absent.
///
/// The message names the first missing field; `missing` lists all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub missing: Vec<String>,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.missing.first().map(String::as_str).unwrap_or("field");
        write!(f, "{} is required.", first)
    }
}

impl std::error::Error for FieldError {}

impl FieldError {
    pub fn new(missing: Vec<String>) -> Self {
        Self { missing }
    }
}

/// Validates and sanitizes the four partner fields on order writes
#[derive(Debug, Default)]
pub struct OrderFieldValidator;

impl OrderFieldValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check that every partner field is present and non-blank once
    /// sanitized. `fields` must be given in `CHALLENGE_FIELD_KEYS` order.
    pub fn validate(
        &self,
        fields: [(&'static str, Option<&str>); 4],
    ) -> Result<ChallengeFields, FieldError> {
        let mut missing = Vec::new();
        let mut values: [String; 4] = Default::default();

        for (slot, (name, raw)) in fields.into_iter().enumerate() {
            debug_assert_eq!(name, CHALLENGE_FIELD_KEYS[slot]);
            let cleaned = raw.map(sanitize_text_field).unwrap_or_default();
            if cleaned.is_empty() {
                missing.push(name.to_string());
            }
            values[slot] = cleaned;
        }

        if !missing.is_empty() {
            return Err(FieldError::new(missing));
        }

        let [challenge_pricing_id, stage_id, user_email, brand_id] = values;
        Ok(ChallengeFields {
            challenge_pricing_id,
            stage_id,
            user_email,
            brand_id,
        })
    }
}

/// Strip markup, fold tabs and line breaks into spaces, collapse whitespace
/// runs and trim.
pub fn sanitize_text_field(input: &str) -> String {
    let mut stripped = String::with_capacity(input.len());
    let mut in_tag = false;

    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            c if c.is_control() => stripped.push(' '),
            c => stripped.push(c),
        }
    }

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
