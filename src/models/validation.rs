//! Input validation for wallet and transaction fields.

use bigdecimal::BigDecimal;

use super::decimal::parse_amount;

/// Maximum length of a wallet label or transaction id.
pub const MAX_TEXT_LENGTH: usize = 255;

/// Key used for errors that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// A validation failure attached to one input field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// An error that concerns the request as a whole.
    pub fn non_field(message: impl Into<String>) -> Self {
        Self::new(NON_FIELD_ERRORS, message)
    }
}

fn required_text(field: &str, value: Option<&str>) -> Result<String, FieldError> {
    let value = value.ok_or_else(|| FieldError::new(field, "This field is required."))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::new(field, "This field may not be blank."));
    }
    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(FieldError::new(
            field,
            format!("Ensure this field has no more than {} characters.", MAX_TEXT_LENGTH),
        ));
    }
    Ok(value.to_string())
}

/// Validate a wallet label.
pub fn validate_label(label: Option<&str>) -> Result<String, FieldError> {
    required_text("label", label)
}

/// Validate an external transaction id.
pub fn validate_txid(txid: Option<&str>) -> Result<String, FieldError> {
    required_text("txid", txid)
}

/// Validate and normalise a transaction amount.
pub fn validate_amount(amount: Option<&str>) -> Result<BigDecimal, FieldError> {
    let raw = amount.ok_or_else(|| FieldError::new("amount", "This field is required."))?;
    parse_amount(raw).map_err(|e| FieldError::new("amount", e.to_string()))
}
