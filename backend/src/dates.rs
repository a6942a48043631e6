//! Date conversion between the XML and table conventions.
//!
//! XML carries `YYYY-MM-DD`, the table carries `DD/MM/YYYY`. Both directions
//! ignore a trailing time part and hand back the input unchanged when it does
//! not parse, so malformed dates stay visible instead of turning into nulls.

use chrono::NaiveDate;

/// Date format used inside TISS XML.
pub const XML_FORMAT: &str = "%Y-%m-%d";

/// Date format used in the flat table.
pub const TABLE_FORMAT: &str = "%d/%m/%Y";

/// `YYYY-MM-DD[Thh:mm:ss | hh:mm:ss]` -> `DD/MM/YYYY`.
pub fn to_table(xml_date: &str) -> String {
    match parse_xml(xml_date) {
        Some(date) => date.format(TABLE_FORMAT).to_string(),
        None => xml_date.to_string(),
    }
}

/// `DD/MM/YYYY[ hh:mm:ss]` -> `YYYY-MM-DD`.
pub fn to_xml(table_date: &str) -> String {
    match parse_table(table_date) {
        Some(date) => date.format(XML_FORMAT).to_string(),
        None => table_date.to_string(),
    }
}

/// Parse an XML-convention date, discarding any time suffix.
pub fn parse_xml(value: &str) -> Option<NaiveDate> {
    let date_part = value
        .trim()
        .split(|c: char| c == 'T' || c.is_whitespace())
        .next()?;
    NaiveDate::parse_from_str(date_part, XML_FORMAT).ok()
}

/// Parse a table-convention date, discarding any time suffix.
pub fn parse_table(value: &str) -> Option<NaiveDate> {
    let date_part = value.trim().split_whitespace().next()?;
    NaiveDate::parse_from_str(date_part, TABLE_FORMAT).ok()
}
