// src/ctc/records.rs

// --- Imports ---
use crate::ctc::amount::parse_amount;
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use regex::{CaptureMatches, Regex};

// --- Regex Pattern (Lazy Static) ---
// Compound pattern: a competência token followed by whitespace and an amount
// token.
//   Period: exactly two digits, a slash, exactly four digits. The month is
//   not range-checked; the token is captured verbatim and passed through.
//   Amount: integer digits, zero or more (separator + 3 digits) grouping
//   blocks, then a final separator + 2 fractional digits. Each separator is
//   independently `.` or `,`; which one is the decimal separator is decided
//   per value by the normalizer.
static RECORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}/\d{4})\s+(\d+(?:[.,]\d{3})*[.,]\d{2})")
        .expect("Failed to compile RECORD_RE")
});

// --- Data Structures ---
/// One extracted record: the competência token (kept verbatim, never parsed
/// into a date) and its normalized amount.
#[derive(Debug, Clone, PartialEq)]
pub struct CtcRecord {
    pub period: String,
    pub amount: f64,
}

/// A single raw match before normalization. Both fields borrow from the
/// document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMatch<'t> {
    pub period: &'t str,
    pub raw_amount: &'t str,
}

/// Lazy iterator over the raw (period, amount) pairs of one document, in
/// left-to-right match order. Consumed once; matches carry no state between
/// each other.
pub struct RawMatches<'t> {
    inner: CaptureMatches<'static, 't>,
}

impl<'t> Iterator for RawMatches<'t> {
    type Item = RawMatch<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let caps = self.inner.next()?;
        Some(RawMatch {
            period: caps.get(1).map(|m| m.as_str()).unwrap_or_default(),
            raw_amount: caps.get(2).map(|m| m.as_str()).unwrap_or_default(),
        })
    }
}

// --- Extraction ---
/// Scans the document for non-overlapping `<period><whitespace><amount>`
/// occurrences. A period with no trailing amount (or vice versa) yields no
/// match for that occurrence. Pure function of the input text.
pub fn raw_matches(text: &str) -> RawMatches<'_> {
    RawMatches {
        inner: RECORD_RE.captures_iter(text),
    }
}

/// Extracts and normalizes every record of the document, preserving the
/// order of appearance in the source text. Zero matches is not an error:
/// the result is an empty `Vec`.
///
/// A raw amount that fails normalization aborts the whole document and
/// surfaces as [`ExtractError::ValueConversion`]. The pattern above only
/// emits normalizable amounts, so that path is defensive; callers that want
/// skip-and-continue semantics instead can drive [`raw_matches`] and
/// [`parse_amount`] directly.
pub fn extract_records(text: &str) -> Result<Vec<CtcRecord>, ExtractError> {
    let mut records = Vec::new();

    for m in raw_matches(text) {
        records.push(CtcRecord {
            period: m.period.to_string(),
            amount: parse_amount(m.raw_amount)?,
        });
    }

    Ok(records)
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_old_format_document() {
        let text = "01/2020 732,47\n02/2020 2.258,31";
        let records = extract_records(text).unwrap();

        assert_eq!(
            records,
            vec![
                CtcRecord {
                    period: "01/2020".to_string(),
                    amount: 732.47,
                },
                CtcRecord {
                    period: "02/2020".to_string(),
                    amount: 2258.31,
                },
            ]
        );
    }

    #[test]
    fn test_new_format_document() {
        let records = extract_records("03/2021 1,031.87").unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].period, "03/2021");
        assert_eq!(records[0].amount, 1031.87);
    }

    #[test]
    fn test_mixed_conventions_in_one_document() {
        // Each amount is resolved independently.
        let text = "05/2019 1.500,00 e depois 06/2019 1,500.00";
        let records = extract_records(text).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].amount, 1500.0);
        assert_eq!(records[1].amount, 1500.0);
    }

    #[test]
    fn test_no_matches_is_empty_not_error() {
        let text = "Certidão emitida em conformidade com a legislação vigente.";
        assert_eq!(extract_records(text).unwrap(), vec![]);
        assert_eq!(extract_records("").unwrap(), vec![]);
    }

    #[test]
    fn test_order_follows_source_text() {
        // Output order is appearance order, not period order.
        let text = "12/2021 30,00 01/1999 10,00 07/2010 20,00";
        let periods: Vec<String> = extract_records(text)
            .unwrap()
            .into_iter()
            .map(|r| r.period)
            .collect();

        assert_eq!(periods, vec!["12/2021", "01/1999", "07/2010"]);
    }

    #[test]
    fn test_period_without_amount_is_skipped() {
        let text = "03/2020 sem valor informado\n04/2020 105,90";
        let records = extract_records(text).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].period, "04/2020");
    }

    #[test]
    fn test_amount_without_period_is_skipped() {
        let records = extract_records("valor avulso 1.234,56").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_amount_requires_two_fractional_digits() {
        // Bare integers and one-digit fractions do not match the pattern.
        assert!(extract_records("01/2020 1000").unwrap().is_empty());
        assert!(extract_records("01/2020 10,1").unwrap().is_empty());
    }

    #[test]
    fn test_month_token_is_not_range_checked() {
        let records = extract_records("13/2020 10,00").unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].period, "13/2020");
    }

    #[test]
    fn test_raw_matches_is_lazy_and_ordered() {
        let text = "01/2020 732,47 02/2020 2.258,31 03/2020 99,99";
        let mut matches = raw_matches(text);

        let first = matches.next().unwrap();
        assert_eq!(first.period, "01/2020");
        assert_eq!(first.raw_amount, "732,47");

        let second = matches.next().unwrap();
        assert_eq!(second.raw_amount, "2.258,31");

        assert_eq!(matches.count(), 1);
    }

    #[test]
    fn test_multiline_real_world_shape() {
        let text = "\
            PERÍODO DE CONTRIBUIÇÃO\n\
            07/1994    582,86\n\
            08/1994    582,86\n\
            09/1994    1.031,87\n\
            TOTAL 2.197,59\n";
        let records = extract_records(text).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[2].amount, 1031.87);
    }
}
