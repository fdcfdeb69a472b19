// src/ctc/amount.rs

use crate::utils::error::ExtractError;

/// Converts one raw monetary token into its numeric value, deciding per
/// value which of `.`/`,` is the decimal separator.
///
/// The rule is last-separator-wins. When both characters are present, the
/// one occurring closer to the end of the string is the decimal separator
/// and every occurrence of the other is stripped as grouping:
///
/// * `1,031.87` → `1031.87` (point decimal)
/// * `2.258,31` → `2258.31` (comma decimal)
///
/// With a single separator kind present, it is taken as the decimal
/// separator; with none, the token is an integer-valued amount. This is a
/// heuristic, not a locale detector: a document mixing both conventions is
/// resolved per value, with no cross-record consistency check.
///
/// Returns [`ExtractError::ValueConversion`] carrying the raw input when
/// the cleaned-up string is not a valid number. Unreachable for tokens
/// produced by the record pattern, but this function accepts arbitrary
/// strings.
pub fn parse_amount(raw: &str) -> Result<f64, ExtractError> {
    let value = raw.trim();

    let cleaned = match (value.rfind('.'), value.rfind(',')) {
        // Both separators present: the later one is decimal.
        (Some(point), Some(comma)) if point > comma => value.replace(',', ""),
        (Some(_), Some(_)) => value.replace('.', "").replace(',', "."),
        // Comma only: pure decimal substitution, nothing to strip.
        (None, Some(_)) => value.replace(',', "."),
        // Point only, or bare digits: already in parseable form.
        (Some(_), None) | (None, None) => value.to_string(),
    };

    cleaned
        .parse::<f64>()
        .map_err(|_| ExtractError::ValueConversion {
            raw: raw.to_string(),
        })
}
