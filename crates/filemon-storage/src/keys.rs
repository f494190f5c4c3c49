//! Shared key generation for backup backends.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

pub const BACKUP_PREFIX: &str = "backups";

const FALLBACK_NAME: &str = "file";

/// Longest file name most filesystems accept, in bytes.
const MAX_SEGMENT_BYTES: usize = 255;

/// Bytes taken by the `{YYYYMMDD_HHMMSS}_{8 hex}_` stamp ahead of the name.
const STAMP_BYTES: usize = 25;

/// Longest sanitized name that still fits one path segment after the stamp.
pub const MAX_NAME_BYTES: usize = MAX_SEGMENT_BYTES - STAMP_BYTES;

/// Extensions longer than this are truncated with the rest of the name.
const MAX_EXTENSION_BYTES: usize = 16;

/// Generate a backup key for a file received at `now`.
pub fn generate_backup_key(file_name: &str, now: DateTime<Utc>) -> String {
    let unique = Uuid::new_v4().simple().to_string();
    format!(
        "{}/{}_{}_{}",
        BACKUP_PREFIX,
        now.format("%Y%m%d_%H%M%S"),
        &unique[..8],
        sanitize_file_name(file_name)
    )
}

/// Reduce a client-supplied name to a single safe path segment.
///
/// Separators, reserved and control characters become `_`; dot runs collapse
/// so the result can never contain `..`. Names over [`MAX_NAME_BYTES`] are cut
/// on a char boundary, keeping a short extension.
pub fn sanitize_file_name(file_name: &str) -> String {
    let mut name: String = file_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_control() || filemon_core::validation::RESERVED_FILE_NAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    while name.contains("..") {
        name = name.replace("..", ".");
    }

    let name = name.trim_matches('.');
    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        fit_to_segment(name)
    }
}

fn fit_to_segment(name: &str) -> String {
    if name.len() <= MAX_NAME_BYTES {
        return name.to_string();
    }

    let extension = name
        .rfind('.')
        .filter(|&dot| dot > 0 && name.len() - dot <= MAX_EXTENSION_BYTES)
        .map(|dot| &name[dot..])
        .unwrap_or("");
    let stem = &name[..name.len() - extension.len()];

    let stem = truncate_on_char_boundary(stem, MAX_NAME_BYTES - extension.len()).trim_end_matches('.');
    if stem.is_empty() {
        return truncate_on_char_boundary(name, MAX_NAME_BYTES).to_string();
    }
    format!("{}{}", stem, extension)
}

fn truncate_on_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Reject keys that could escape the backend root.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty()
        || storage_key.contains("..")
        || storage_key.starts_with('/')
        || storage_key.starts_with('\\')
    {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn key_layout() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
        let key = generate_backup_key("settlement.txt", now);
        assert!(key.starts_with("backups/20240301_090507_"), "{key}");
        assert!(key.ends_with("_settlement.txt"), "{key}");
        assert_eq!(key.len(), "backups/20240301_090507_".len() + 8 + "_settlement.txt".len());
    }

    #[test]
    fn same_name_same_second_gets_distinct_keys() {
        let now = Utc::now();
        assert_ne!(
            generate_backup_key("a.txt", now),
            generate_backup_key("a.txt", now)
        );
    }

    #[test]
    fn sanitizes_hostile_names() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "_._etc_passwd");
        assert_eq!(sanitize_file_name("a\\b:c.txt"), "a_b_c.txt");
        assert_eq!(sanitize_file_name("line\nbreak"), "line_break");
        assert_eq!(sanitize_file_name(" .. "), "file");
        assert_eq!(sanitize_file_name(""), "file");
        assert!(validate_key(&generate_backup_key("../../x", Utc::now())).is_ok());
    }

    #[test]
    fn long_names_fit_one_path_segment() {
        let name = format!("{}.txt", "a".repeat(240));
        let sanitized = sanitize_file_name(&name);
        assert_eq!(sanitized.len(), MAX_NAME_BYTES);
        assert!(sanitized.ends_with(".txt"));

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
        let key = generate_backup_key(&name, now);
        let segment = key.strip_prefix("backups/").unwrap();
        assert_eq!(segment.len(), MAX_SEGMENT_BYTES);
    }

    #[test]
    fn multibyte_names_are_cut_on_char_boundaries() {
        let name = format!("{}.csv", "é".repeat(200));
        let sanitized = sanitize_file_name(&name);
        assert!(sanitized.len() <= MAX_NAME_BYTES);
        assert!(sanitized.ends_with(".csv"));
        assert!(sanitized.trim_end_matches(".csv").chars().all(|c| c == 'é'));
    }

    #[test]
    fn overlong_extension_is_truncated_with_the_name() {
        let name = format!("report.{}", "x".repeat(300));
        let sanitized = sanitize_file_name(&name);
        assert_eq!(sanitized.len(), MAX_NAME_BYTES);
        assert!(sanitized.starts_with("report."));
        assert_eq!(sanitize_file_name("short.txt"), "short.txt");
    }

    #[test]
    fn rejects_traversal_keys() {
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key("backups/ok.txt").is_ok());
    }
}
