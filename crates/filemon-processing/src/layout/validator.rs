use filemon_core::models::{AcquirerType, RecordType};

use super::{slice, FieldKind, FieldName, FieldSpec, Layout};

/// The first check a line failed. `Display` is the human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutViolation {
    #[error("Invalid layout: the file line is empty.")]
    EmptyLine,

    #[error(
        "Invalid layout: type '{discriminator}' ({acquirer}) must be {required} characters long, but {actual} were found."
    )]
    WrongLength {
        discriminator: char,
        acquirer: AcquirerType,
        required: usize,
        actual: usize,
    },

    #[error("Invalid layout ({acquirer}): field '{field}' must be numeric.")]
    NotNumeric {
        acquirer: AcquirerType,
        field: FieldName,
    },

    #[error("Invalid layout ({acquirer}): field '{field}' must be numeric in YYYYMMDD format.")]
    NotDate {
        acquirer: AcquirerType,
        field: FieldName,
    },

    #[error("Invalid layout ({acquirer}): field '{field}' must be '{expected}'.")]
    CompanyMismatch {
        acquirer: AcquirerType,
        field: FieldName,
        expected: &'static str,
    },

    #[error("Invalid layout: record type '{0}' is unknown. Valid types are '0' and '1'.")]
    UnknownRecordType(char),
}

impl LayoutViolation {
    /// Name of the failing field, for field-level violations.
    pub fn field(&self) -> Option<FieldName> {
        match self {
            LayoutViolation::NotNumeric { field, .. }
            | LayoutViolation::NotDate { field, .. }
            | LayoutViolation::CompanyMismatch { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// Check a normalized line against the layout its first character selects.
///
/// Checks run in a fixed order and stop at the first failure: emptiness, the
/// record type discriminator, the total width, then each field in table order.
pub fn validate(line: &str) -> Result<RecordType, LayoutViolation> {
    let Some(discriminator) = line.chars().next().filter(|_| !line.trim().is_empty()) else {
        return Err(LayoutViolation::EmptyLine);
    };

    let record_type = RecordType::from_discriminator(discriminator)
        .ok_or(LayoutViolation::UnknownRecordType(discriminator))?;
    let layout = Layout::for_record_type(record_type);

    let actual = line.chars().count();
    if actual != layout.width {
        return Err(LayoutViolation::WrongLength {
            discriminator,
            acquirer: layout.acquirer,
            required: layout.width,
            actual,
        });
    }

    for spec in layout.fields {
        check_field(layout, spec, slice(line, spec))?;
    }

    Ok(record_type)
}

fn check_field(layout: &Layout, spec: &FieldSpec, value: &str) -> Result<(), LayoutViolation> {
    let all_digits = !value.is_empty() && value.chars().all(|c| c.is_ascii_digit());

    match spec.kind {
        FieldKind::Digits if !all_digits => Err(LayoutViolation::NotNumeric {
            acquirer: layout.acquirer,
            field: spec.name,
        }),
        FieldKind::Date if !all_digits => Err(LayoutViolation::NotDate {
            acquirer: layout.acquirer,
            field: spec.name,
        }),
        FieldKind::Company(expected) if !value.trim().eq_ignore_ascii_case(expected) => {
            Err(LayoutViolation::CompanyMismatch {
                acquirer: layout.acquirer,
                field: spec.name,
                expected,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPE0_LINE: &str = "012345678902023010120230101202301310000001UfCard  ";
    const TYPE1_LINE: &str = "12023010112345678FagammonCard0000002";

    fn replace_at(line: &str, offset: usize, with: &str) -> String {
        let mut out = String::new();
        out.push_str(&line[..offset]);
        out.push_str(with);
        out.push_str(&line[offset + with.len()..]);
        out
    }

    #[test]
    fn accepts_reference_lines() {
        assert_eq!(TYPE0_LINE.len(), 50);
        assert_eq!(TYPE1_LINE.len(), 36);
        assert_eq!(validate(TYPE0_LINE), Ok(RecordType::Type0));
        assert_eq!(validate(TYPE1_LINE), Ok(RecordType::Type1));
    }

    #[test]
    fn empty_and_blank_lines() {
        assert_eq!(validate(""), Err(LayoutViolation::EmptyLine));
        assert_eq!(validate("    "), Err(LayoutViolation::EmptyLine));
        assert_eq!(
            LayoutViolation::EmptyLine.to_string(),
            "Invalid layout: the file line is empty."
        );
    }

    #[test]
    fn unknown_discriminator_names_the_character() {
        let line = replace_at(TYPE1_LINE, 0, "2");
        let err = validate(&line).unwrap_err();
        assert_eq!(err, LayoutViolation::UnknownRecordType('2'));
        assert_eq!(
            err.to_string(),
            "Invalid layout: record type '2' is unknown. Valid types are '0' and '1'."
        );
    }

    #[test]
    fn wrong_length_reports_required_and_actual() {
        let err = validate("0123456789").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid layout: type '0' (UfCard) must be 50 characters long, but 10 were found."
        );

        let err = validate(&format!("{}X", TYPE1_LINE)).unwrap_err();
        assert_eq!(
            err,
            LayoutViolation::WrongLength {
                discriminator: '1',
                acquirer: AcquirerType::FagammonCard,
                required: 36,
                actual: 37,
            }
        );
    }

    #[test]
    fn reports_the_specific_type0_field() {
        let cases = [
            (1, "12345A7890", FieldName::Establishment),
            (11, "2023O101", FieldName::ProcessingDate),
            (19, "2023-1-1", FieldName::PeriodStart),
            (27, "        ", FieldName::PeriodEnd),
            (35, "00000X1", FieldName::Sequence),
            (42, "Visa    ", FieldName::Company),
        ];
        for (offset, bad, field) in cases {
            let line = replace_at(TYPE0_LINE, offset, bad);
            let err = validate(&line).unwrap_err();
            assert_eq!(err.field(), Some(field), "{line}");
        }
    }

    #[test]
    fn reports_the_specific_type1_field() {
        let cases = [
            (1, "2023010X", FieldName::ProcessingDate),
            (9, "1234 678", FieldName::Establishment),
            (17, "UfCard      ", FieldName::Company),
            (29, "000000-", FieldName::Sequence),
        ];
        for (offset, bad, field) in cases {
            let line = replace_at(TYPE1_LINE, offset, bad);
            let err = validate(&line).unwrap_err();
            assert_eq!(err.field(), Some(field), "{line}");
        }
    }

    #[test]
    fn field_messages() {
        let line = replace_at(TYPE0_LINE, 1, "ABCDEFGHIJ");
        assert_eq!(
            validate(&line).unwrap_err().to_string(),
            "Invalid layout (UfCard): field 'establishment' must be numeric."
        );

        let line = replace_at(TYPE1_LINE, 1, "ABCDEFGH");
        assert_eq!(
            validate(&line).unwrap_err().to_string(),
            "Invalid layout (FagammonCard): field 'processing_date' must be numeric in YYYYMMDD format."
        );

        let line = replace_at(TYPE0_LINE, 42, "Other   ");
        assert_eq!(
            validate(&line).unwrap_err().to_string(),
            "Invalid layout (UfCard): field 'company' must be 'UfCard'."
        );
    }

    #[test]
    fn company_is_trimmed_and_case_insensitive() {
        let line = replace_at(TYPE0_LINE, 42, "  UFCARD");
        assert_eq!(validate(&line), Ok(RecordType::Type0));

        let line = replace_at(TYPE1_LINE, 17, "fagammoncard");
        assert_eq!(validate(&line), Ok(RecordType::Type1));
    }

    #[test]
    fn first_failing_check_wins() {
        // Bad establishment and bad company: establishment comes first.
        let line = replace_at(&replace_at(TYPE0_LINE, 1, "X234567890"), 42, "Nope    ");
        assert_eq!(validate(&line).unwrap_err().field(), Some(FieldName::Establishment));

        // Bad sequence and bad company in Type1: company precedes sequence.
        let line = replace_at(&replace_at(TYPE1_LINE, 29, "XXXXXXX"), 17, "Nope        ");
        assert_eq!(validate(&line).unwrap_err().field(), Some(FieldName::Company));

        // Wrong width hides every field failure.
        let err = validate("0ABC").unwrap_err();
        assert!(matches!(err, LayoutViolation::WrongLength { actual: 4, .. }));
    }

    #[test]
    fn digits_must_be_ascii() {
        let line = TYPE0_LINE.replacen("1234567890", "١٢٣٤٥٦٧٨٩٠", 1);
        assert_eq!(line.chars().count(), 50);
        assert_eq!(validate(&line).unwrap_err().field(), Some(FieldName::Establishment));
    }
}
