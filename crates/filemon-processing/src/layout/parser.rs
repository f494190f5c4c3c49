use std::borrow::Cow;

use chrono::NaiveDate;
use filemon_core::models::{period_sentinel, RecordType, TransactionRecord};

use super::{slice, validate, FieldName, Layout, LayoutViolation, TYPE0};
use crate::error::ParseError;

const BOM: char = '\u{feff}';

/// Collapse decoded text into the single logical line the validator expects.
///
/// Line breaks are removed. A line starting with the Type0 discriminator that
/// is shorter than the Type0 width is right-padded with spaces.
pub fn normalize_line(text: &str) -> Cow<'_, str> {
    let mut line = if text.contains(['\r', '\n']) {
        Cow::Owned(text.chars().filter(|c| *c != '\r' && *c != '\n').collect())
    } else {
        Cow::Borrowed(text)
    };

    if line.starts_with(TYPE0.record_type.discriminator()) {
        let len = line.chars().count();
        if len < TYPE0.width {
            line.to_mut().extend(std::iter::repeat(' ').take(TYPE0.width - len));
        }
    }

    line
}

/// Extract a record from a validated line.
///
/// Field widths are trusted. Dates are still checked against the calendar.
pub fn parse(line: &str) -> Result<TransactionRecord, ParseError> {
    let discriminator = line.chars().next().ok_or(LayoutViolation::EmptyLine)?;
    let record_type = RecordType::from_discriminator(discriminator)
        .ok_or(LayoutViolation::UnknownRecordType(discriminator))?;
    let layout = Layout::for_record_type(record_type);

    let text = |name: FieldName| -> String {
        layout
            .field(name)
            .map(|spec| slice(line, spec).trim().to_string())
            .unwrap_or_default()
    };
    let date = |name: FieldName| -> Result<NaiveDate, ParseError> {
        match layout.field(name) {
            Some(spec) => parse_date(slice(line, spec)),
            None => Ok(period_sentinel()),
        }
    };

    Ok(TransactionRecord {
        record_type,
        establishment: text(FieldName::Establishment),
        processing_date: date(FieldName::ProcessingDate)?,
        period_start: date(FieldName::PeriodStart)?,
        period_end: date(FieldName::PeriodEnd)?,
        sequence: text(FieldName::Sequence),
        company: text(FieldName::Company),
    })
}

/// Decode, normalize, validate and parse a whole settlement file.
///
/// A file holds exactly one record, so success always yields one element.
pub fn parse_file(data: &[u8]) -> Result<Vec<TransactionRecord>, ParseError> {
    let decoded = String::from_utf8_lossy(data);
    let trimmed = decoded.trim_start_matches(BOM).trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let line = normalize_line(trimmed);
    let record_type = validate(&line)?;
    let record = parse(&line)?;

    tracing::debug!(
        record_type = ?record_type,
        establishment = %record.establishment,
        "Parsed settlement line"
    );

    Ok(vec![record])
}

fn parse_date(raw: &str) -> Result<NaiveDate, ParseError> {
    let format_error = || ParseError::Format {
        value: raw.trim().to_string(),
    };

    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format_error());
    }

    let year: i32 = raw[0..4].parse().map_err(|_| format_error())?;
    let month: u32 = raw[4..6].parse().map_err(|_| format_error())?;
    let day: u32 = raw[6..8].parse().map_err(|_| format_error())?;

    if year < 1 {
        return Err(format_error());
    }
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(format_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPE0_LINE: &str = "012345678902023010120230101202301310000001UfCard  ";
    const TYPE1_LINE: &str = "12023010112345678FagammonCard0000002";

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_type0_fields() {
        let record = parse(TYPE0_LINE).unwrap();
        assert_eq!(record.record_type, RecordType::Type0);
        assert_eq!(record.establishment, "1234567890");
        assert_eq!(record.processing_date, ymd(2023, 1, 1));
        assert_eq!(record.period_start, ymd(2023, 1, 1));
        assert_eq!(record.period_end, ymd(2023, 1, 31));
        assert_eq!(record.sequence, "0000001");
        assert_eq!(record.company, "UfCard");
    }

    #[test]
    fn parses_type1_with_sentinel_period() {
        let record = parse(TYPE1_LINE).unwrap();
        assert_eq!(record.record_type, RecordType::Type1);
        assert_eq!(record.processing_date, ymd(2023, 1, 1));
        assert_eq!(record.establishment, "12345678");
        assert_eq!(record.company, "FagammonCard");
        assert_eq!(record.sequence, "0000002");
        assert_eq!(record.period_start, period_sentinel());
        assert_eq!(record.period_end, period_sentinel());
    }

    #[test]
    fn impossible_date_is_a_format_error() {
        let line = TYPE0_LINE.replacen("20230131", "20230132", 1);
        assert!(validate(&line).is_ok());
        assert_eq!(
            parse(&line).unwrap_err(),
            ParseError::Format {
                value: "20230132".to_string()
            }
        );

        assert!(parse_date("20230229").is_err());
        assert!(parse_date("20240229").is_ok());
        assert!(parse_date("00000101").is_err());
        assert!(parse_date("20231301").is_err());
    }

    #[test]
    fn parse_file_returns_exactly_one_record() {
        let records = parse_file(TYPE1_LINE.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence, "0000002");
    }

    #[test]
    fn parse_file_strips_line_endings_and_outer_whitespace() {
        let content = format!("\r\n  {}\r\n\r\n", TYPE1_LINE);
        let records = parse_file(content.as_bytes()).unwrap();
        assert_eq!(records[0].record_type, RecordType::Type1);

        let content = format!("\u{feff}{}\n", TYPE0_LINE);
        assert!(parse_file(content.as_bytes()).is_ok());
    }

    #[test]
    fn parse_file_empty_is_distinct_from_layout() {
        assert_eq!(parse_file(b""), Err(ParseError::Empty));
        assert_eq!(parse_file(b"  \r\n\t "), Err(ParseError::Empty));
        assert!(matches!(parse_file(b"x"), Err(ParseError::Layout(_))));
    }

    #[test]
    fn type0_is_padded_after_trim() {
        // Trailing spaces of the company field are lost to the outer trim.
        let content = TYPE0_LINE.trim_end();
        assert_eq!(content.len(), 48);
        let records = parse_file(content.as_bytes()).unwrap();
        assert_eq!(records[0].company, "UfCard");
    }

    #[test]
    fn type1_is_never_padded() {
        let content = &TYPE1_LINE[..30];
        let err = parse_file(content.as_bytes()).unwrap_err();
        assert_eq!(
            err,
            ParseError::Layout(LayoutViolation::WrongLength {
                discriminator: '1',
                acquirer: filemon_core::models::AcquirerType::FagammonCard,
                required: 36,
                actual: 30,
            })
        );
    }

    #[test]
    fn normalize_joins_lines() {
        assert_eq!(normalize_line("1ab\r\ncd"), "1abcd");
        assert_eq!(normalize_line("0").chars().count(), 50);
        assert!(matches!(normalize_line("1abc"), Cow::Borrowed(_)));
    }

    #[test]
    fn field_violation_surfaces_as_layout_error() {
        let line = TYPE0_LINE.replacen("UfCard", "VsCard", 1);
        let err = parse_file(line.as_bytes()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid layout (UfCard): field 'company' must be 'UfCard'."
        );
    }
}
