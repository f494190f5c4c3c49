use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which fixed-width layout produced a transaction, keyed by the line's first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "record_type", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Type0,
    Type1,
}

impl RecordType {
    pub const ALL: [RecordType; 2] = [RecordType::Type0, RecordType::Type1];

    pub fn discriminator(&self) -> char {
        match self {
            RecordType::Type0 => '0',
            RecordType::Type1 => '1',
        }
    }

    pub fn from_discriminator(c: char) -> Option<Self> {
        RecordType::ALL
            .into_iter()
            .find(|record_type| record_type.discriminator() == c)
    }
}

/// Value carried by `period_start`/`period_end` for layouts that encode no period.
pub fn period_sentinel() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// One structured record extracted from a file's fixed-width line. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub record_type: RecordType,
    pub establishment: String,
    pub processing_date: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub sequence: String,
    pub company: String,
}
