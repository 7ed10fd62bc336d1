//! Naming of uploaded receipt objects.
//!
//! Objects live at `receipts/<public id>/<timestamp>-<filename>`. The
//! timestamp keeps names unique per terminal and sorts chronologically; the
//! filename is whatever the agent sent, reduced to a safe alphabet.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::TerminalPublicId;

/// Filename used when the agent does not send one.
pub const DEFAULT_FILENAME: &str = "receipt.pdf";

/// Top-level folder for every receipt object.
pub const RECEIPTS_PREFIX: &str = "receipts";

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
///
/// A missing or empty hint becomes [`DEFAULT_FILENAME`].
#[must_use]
pub fn sanitize_filename(hint: Option<&str>) -> String {
    let name = hint.filter(|h| !h.is_empty()).unwrap_or(DEFAULT_FILENAME);
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Millisecond UTC timestamp with `:` and `.` swapped for `-`.
#[must_use]
pub fn path_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Full object path for a receipt uploaded at `at`.
#[must_use]
pub fn receipt_blob_path(
    terminal: &TerminalPublicId,
    at: DateTime<Utc>,
    filename_hint: Option<&str>,
) -> String {
    format!(
        "{RECEIPTS_PREFIX}/{terminal}/{}-{}",
        path_timestamp(at),
        sanitize_filename(filename_hint)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
            + chrono::TimeDelta::milliseconds(589)
    }

    #[test]
    fn test_sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_filename(Some("sale_0042-v2.pdf")), "sale_0042-v2.pdf");
    }

    #[test]
    fn test_sanitize_replaces_unsafe_characters() {
        assert_eq!(
            sanitize_filename(Some("../Joe's receipt #1.pdf")),
            ".._Joe_s_receipt__1.pdf"
        );
        assert_eq!(sanitize_filename(Some("reçu.pdf")), "re_u.pdf");
    }

    #[test]
    fn test_sanitize_defaults() {
        assert_eq!(sanitize_filename(None), DEFAULT_FILENAME);
        assert_eq!(sanitize_filename(Some("")), DEFAULT_FILENAME);
    }

    #[test]
    fn test_path_timestamp_has_no_colons_or_dots() {
        assert_eq!(path_timestamp(fixed_instant()), "2026-03-14T09-26-53-589Z");
    }

    #[test]
    fn test_receipt_blob_path() {
        let terminal = TerminalPublicId::parse("JOE-CBD-1").unwrap();
        assert_eq!(
            receipt_blob_path(&terminal, fixed_instant(), Some("sale 17.pdf")),
            "receipts/JOE-CBD-1/2026-03-14T09-26-53-589Z-sale_17.pdf"
        );
    }
}
