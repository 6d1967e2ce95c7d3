//! Run metadata: the date token and publisher shared by every batch.
//!
//! Both values are pure functions of their inputs. The date comes from the
//! source filename (falling back to the run date); the publisher comes from
//! the first page whose text carries a known publisher marker.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static DATE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{1,2}) ([A-Z]+)").expect("valid regex"));

/// Ordered publisher markers: `(substring, publisher label)`.
///
/// Matching is case-sensitive. When one page carries several markers the
/// earliest entry wins.
pub const PUBLISHER_MARKERS: [(&str, &str); 3] = [
    ("IMAN PUBLICATION", "IMAN"),
    ("PTS BOOKCAFE", "PTSBOOKCAFE"),
    ("Buku Fixi", "BukuFixi"),
];

/// Metadata computed once per document and reused by all of its batches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Date token used in directory and file names, e.g. `29_Sept` or `20261018`.
    pub date: String,
    /// True when the filename carried no date and the run date was used.
    pub date_defaulted: bool,
    /// Publisher label detected from page text, if any.
    pub publisher: Option<String>,
    /// Run timestamp token (`%Y%m%d_%H%M%S`) shared by every batch filename.
    pub timestamp: String,
}

impl RunMetadata {
    /// Build metadata for a run starting at `now`.
    ///
    /// `publisher` is supplied by the caller because it depends on page text,
    /// which only per-page routing reads.
    pub fn new(filename: &str, publisher: Option<String>, now: NaiveDateTime) -> Self {
        let parsed = date_token_from_filename(filename);
        let date_defaulted = parsed.is_none();
        Self {
            date: parsed.unwrap_or_else(|| fallback_date_token(now.date())),
            date_defaulted,
            publisher,
            timestamp: timestamp_token(now),
        }
    }
}

/// The filename without directories or its final extension.
pub fn filename_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
}

/// Find a `<day> <month-word>` token such as "29 SEPT" and normalise it to
/// `29_Sept`. Matching ignores case and looks only at the filename stem.
pub fn date_token_from_filename(filename: &str) -> Option<String> {
    let upper = filename_stem(filename).to_ascii_uppercase();
    let caps = DATE_TOKEN.captures(&upper)?;
    let day = &caps[1];
    let month = &caps[2];
    let mut chars = month.chars();
    let first = chars.next()?;
    Some(format!(
        "{}_{}{}",
        day,
        first,
        chars.as_str().to_ascii_lowercase()
    ))
}

/// Compact numeric date token (`YYYYMMDD`) used when the filename has none.
pub fn fallback_date_token(today: NaiveDate) -> String {
    today.format("%Y%m%d").to_string()
}

/// Timestamp token with seconds, e.g. `20260929_142501`.
pub fn timestamp_token(now: NaiveDateTime) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Publisher label for one page's text, if it carries a known marker.
pub fn publisher_in_text(text: &str) -> Option<&'static str> {
    PUBLISHER_MARKERS
        .iter()
        .find(|(marker, _)| text.contains(marker))
        .map(|(_, label)| *label)
}

/// Accumulates the run publisher while pages are scanned in order.
///
/// The first page that yields a publisher fixes it; later pages are not
/// inspected.
#[derive(Debug, Default)]
pub struct PublisherScan {
    found: Option<&'static str>,
}

impl PublisherScan {
    pub fn observe(&mut self, text: &str) {
        if self.found.is_none() {
            self.found = publisher_in_text(text);
        }
    }

    pub fn is_settled(&self) -> bool {
        self.found.is_some()
    }

    pub fn finish(self) -> Option<String> {
        self.found.map(str::to_string)
    }
}

/// Scan page texts in page order and return the run publisher.
pub fn publisher_from_pages<'a, I>(texts: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut scan = PublisherScan::default();
    for text in texts.into_iter().flatten() {
        scan.observe(text);
        if scan.is_settled() {
            break;
        }
    }
    scan.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, ss)
            .unwrap()
    }

    #[test]
    fn date_from_filename_title_cased() {
        assert_eq!(
            date_token_from_filename("Shipment 29 SEPT Final.pdf").as_deref(),
            Some("29_Sept")
        );
        assert_eq!(
            date_token_from_filename("awb 3 oct.pdf").as_deref(),
            Some("3_Oct")
        );
    }

    #[test]
    fn date_match_is_unanchored() {
        assert_eq!(
            date_token_from_filename("export 2024 SEPT.pdf").as_deref(),
            Some("24_Sept")
        );
    }

    #[test]
    fn extension_is_not_part_of_the_search() {
        assert_eq!(date_token_from_filename("shipment_final.pdf"), None);
        assert_eq!(date_token_from_filename("batch 7.pdf"), None);
    }

    #[test]
    fn directories_are_ignored() {
        assert_eq!(
            date_token_from_filename("/uploads/12 JAN/awb.pdf"),
            None,
            "only the file stem is searched"
        );
    }

    #[test]
    fn missing_date_falls_back_to_run_date() {
        let meta = RunMetadata::new("shipment_final.pdf", None, at(2026, 10, 18, 9, 5, 7));
        assert_eq!(meta.date, "20261018");
        assert!(meta.date_defaulted);
        assert_eq!(meta.timestamp, "20261018_090507");
    }

    #[test]
    fn parsed_date_is_not_defaulted() {
        let meta = RunMetadata::new(
            "Shipment 29 SEPT Final.pdf",
            Some("IMAN".into()),
            at(2026, 10, 18, 23, 59, 59),
        );
        assert_eq!(meta.date, "29_Sept");
        assert!(!meta.date_defaulted);
        assert_eq!(meta.publisher.as_deref(), Some("IMAN"));
    }

    #[test]
    fn publisher_markers_are_case_sensitive() {
        assert_eq!(publisher_in_text("From IMAN PUBLICATION SDN BHD"), Some("IMAN"));
        assert_eq!(publisher_in_text("iman publication"), None);
        assert_eq!(publisher_in_text("Sender: Buku Fixi"), Some("BukuFixi"));
    }

    #[test]
    fn earlier_marker_wins_on_the_same_page() {
        assert_eq!(
            publisher_in_text("PTS BOOKCAFE c/o IMAN PUBLICATION"),
            Some("IMAN")
        );
    }

    #[test]
    fn first_page_with_a_publisher_sticks() {
        let mut pages: Vec<Option<&str>> = vec![Some("DHL ID 1"); 12];
        pages[2] = Some("IMAN PUBLICATION");
        pages[5] = None;
        pages[9] = Some("PTS BOOKCAFE");
        assert_eq!(publisher_from_pages(pages).as_deref(), Some("IMAN"));
    }

    #[test]
    fn no_marker_means_no_publisher() {
        let pages = vec![Some("DHL"), None, Some("gdex")];
        assert_eq!(publisher_from_pages(pages), None);
    }
}
