//! Serving-size parsing and per-100 g scaling.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use super::repo_types::QuantityUnit;
use crate::error::ValidationError;

lazy_static! {
    static ref QUANTITY_RE: Regex =
        Regex::new(r"(?i)([\d]+(?:[.,]\d+)?)\s*(ml|g)\b").expect("quantity regex compiles");
}

/// Reads serving sizes such as `"330 ml"`, `"1,5 g"` or `"Can (330ml)"`.
pub fn parse_quantity(input: &str) -> Result<(f64, QuantityUnit), ValidationError> {
    let unreadable = || ValidationError::UnreadableQuantity(input.to_string());
    let caps = QUANTITY_RE.captures(input).ok_or_else(unreadable)?;

    let value: f64 = caps[1].replace(',', ".").parse().map_err(|_| unreadable())?;
    let unit = if caps[2].eq_ignore_ascii_case("g") {
        QuantityUnit::Grams
    } else {
        QuantityUnit::Milliliters
    };
    Ok((value, unit))
}

/// Nutrient content per 100 g (or 100 ml, assuming a density of 1).
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Per100g {
    pub sugar: Option<f64>,
    pub caffeine: Option<f64>,
    pub calories: Option<f64>,
}

pub fn scale(per_100g: Option<f64>, quantity: f64) -> f64 {
    match per_100g {
        Some(v) if v.is_finite() && v > 0.0 => v * quantity / 100.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_serving_sizes() {
        assert_eq!(parse_quantity("330 ml").unwrap(), (330.0, QuantityUnit::Milliliters));
        assert_eq!(parse_quantity("1,5 g").unwrap(), (1.5, QuantityUnit::Grams));
        assert_eq!(parse_quantity("Can (250ML)").unwrap(), (250.0, QuantityUnit::Milliliters));
    }

    #[test]
    fn rejects_text_without_amount() {
        let err = parse_quantity("a can").unwrap_err();
        assert_eq!(err, ValidationError::UnreadableQuantity("a can".into()));
        assert!(parse_quantity("330 cl").is_err());
    }

    #[test]
    fn scales_per_100g_values() {
        assert_eq!(scale(Some(10.0), 330.0), 33.0);
        assert_eq!(scale(None, 330.0), 0.0);
        assert_eq!(scale(Some(f64::NAN), 330.0), 0.0);
    }
}
