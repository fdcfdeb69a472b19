// src/ctc/mod.rs
pub mod amount;
pub mod records;

// Re-export key extraction types for convenience
#[allow(unused_imports)]
pub use amount::parse_amount;
#[allow(unused_imports)]
pub use records::{extract_records, raw_matches, CtcRecord, RawMatch, RawMatches};
