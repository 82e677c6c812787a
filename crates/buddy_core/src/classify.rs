use crate::{Mode, Quantity, ScanConfig};

/// Semantic meaning of a normalized scan.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    ControlCode(Mode),
    QuantityModifier(Quantity),
    Empty,
    ChoreCode(String),
    ProductCandidate(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("Illegal input! {value} needs to be a number")]
    InvalidInput { value: String },
}

/// Uppercases and trims a raw scan so it compares against configured codes.
pub fn normalize_scan(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Classifies a normalized scan. First match wins: control codes in
/// [`Mode::ALL`] order, quantity prefix, empty scan, chore mapping, product.
///
/// `is_chore` is only consulted when none of the configured literals match.
pub fn classify<F, E>(scan: &str, config: &ScanConfig, is_chore: F) -> Result<Classification, E>
where
    F: FnOnce(&str) -> Result<bool, E>,
    E: From<ClassifyError>,
{
    if let Some(mode) = Mode::ALL.into_iter().find(|mode| {
        let code = config.codes.code_for(*mode);
        !code.is_empty() && code == scan
    }) {
        return Ok(Classification::ControlCode(mode));
    }

    if !config.quantity_prefix.is_empty() {
        if let Some(rest) = scan.strip_prefix(config.quantity_prefix.as_str()) {
            return Ok(Classification::QuantityModifier(parse_quantity(rest)?));
        }
    }

    if scan.is_empty() {
        return Ok(Classification::Empty);
    }

    if is_chore(scan)? {
        return Ok(Classification::ChoreCode(scan.to_string()));
    }

    Ok(Classification::ProductCandidate(scan.to_string()))
}

/// Parses a non-negative, finite quantity such as `3` or `1.5`.
pub fn parse_quantity(text: &str) -> Result<Quantity, ClassifyError> {
    text.trim()
        .parse::<Quantity>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount >= 0.0)
        .ok_or_else(|| ClassifyError::InvalidInput {
            value: text.to_string(),
        })
}
