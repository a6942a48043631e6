//! Values that exist in only one of the two representations.
//!
//! - age at service, computed for the table
//! - lot number and content hash, synthesized for the XML

use chrono::{DateTime, TimeZone};
use md5::{Digest, Md5};

use crate::dates;
use crate::xml::charset;

/// Whole years between birth and service, both `DD/MM/YYYY`.
///
/// Counts 365-day years, rounding toward negative infinity. Returns `None`
/// if either date is missing or does not parse.
pub fn age_at_service(birth: Option<&str>, service: Option<&str>) -> Option<i64> {
    let birth = dates::parse_table(birth?)?;
    let service = dates::parse_table(service?)?;
    let days = (service - birth).num_days();
    Some(days.div_euclid(365))
}

/// Lot number for a generated document.
///
/// A six-digit competency (`YYYYMM`) is kept, otherwise the current year and
/// month stand in for it. The current minute and second are appended, so two
/// lots for the same competency differ unless built within the same second.
pub fn lot_number<Tz>(competency: Option<&str>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let suffix = now.format("%M%S");
    match competency.map(str::trim) {
        Some(c) if is_competency(c) => format!("{c}{suffix}"),
        _ => format!("{}{suffix}", now.format("%Y%m")),
    }
}

/// Exactly six ASCII digits.
pub fn is_competency(value: &str) -> bool {
    value.len() == 6 && value.bytes().all(|b| b.is_ascii_digit())
}

/// Lowercase hex MD5 of `content` encoded as Latin-1.
///
/// Characters above U+00FF count as their `&#N;` reference, the same bytes
/// the document carries.
///
/// This is the fingerprint TISS consumers check in the epilogue, not an
/// integrity guarantee.
pub fn content_hash(content: &str) -> String {
    let bytes = charset::encode(content);
    hex::encode(Md5::digest(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    #[test]
    fn test_age_whole_years() {
        assert_eq!(age_at_service(Some("01/01/2000"), Some("01/01/2020")), Some(20));
        assert_eq!(age_at_service(Some("15/06/1990"), Some("14/06/1991")), Some(0));
    }

    #[test]
    fn test_age_missing_or_bad_dates() {
        assert_eq!(age_at_service(None, Some("01/01/2020")), None);
        assert_eq!(age_at_service(Some("01/01/2000"), None), None);
        assert_eq!(age_at_service(Some("2000-01-01"), Some("01/01/2020")), None);
        assert_eq!(age_at_service(Some(""), Some("")), None);
    }

    #[test]
    fn test_age_service_before_birth_floors() {
        assert_eq!(age_at_service(Some("02/01/2020"), Some("01/01/2020")), Some(-1));
    }

    #[test]
    fn test_lot_number_keeps_competency() {
        let now = at("2025-04-10T14:07:09-03:00");
        assert_eq!(lot_number(Some("202503"), &now), "2025030709");
    }

    #[test]
    fn test_lot_number_falls_back_to_current_month() {
        let now = at("2025-04-10T14:07:09-03:00");
        assert_eq!(lot_number(None, &now), "2025040709");
        assert_eq!(lot_number(Some("2025-03"), &now), "2025040709");
        assert_eq!(lot_number(Some("20253"), &now), "2025040709");
    }

    #[test]
    fn test_content_hash_known_value() {
        // md5("") and md5("abc")
        assert_eq!(content_hash(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(content_hash("abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_content_hash_uses_latin1_bytes() {
        // "é" is one byte (0xE9) in Latin-1; the hash must match md5([0xE9])
        let expected = hex::encode(Md5::digest([0xE9u8]));
        assert_eq!(content_hash("é"), expected);
    }

    #[test]
    fn test_content_hash_of_non_latin1_matches_written_reference() {
        let expected = hex::encode(Md5::digest(b"&#8212;"));
        assert_eq!(content_hash("\u{2014}"), expected);
    }
}
