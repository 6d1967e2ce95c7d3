//! Courier classification: map page text (or a filename) to a [`Courier`].
//!
//! Per-page routing is an ordered rule table evaluated top to bottom; the
//! first matching rule decides the courier. A page that mentions several
//! couriers therefore lands in exactly one bucket, never split or flagged.
//! Pages with no text, or text that matches no rule, go to
//! [`Courier::Others`].
//!
//! Whole-document routing is decided from the filename alone: a name
//! containing "pos laju" sends every page to [`Courier::PosLaju`] without
//! reading any page text.

use crate::pipeline::metadata::filename_stem;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of courier labels a page can be filed under.
///
/// Declaration order is the order couriers appear in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Courier {
    #[serde(rename = "DHL")]
    Dhl,
    #[serde(rename = "NINJA_VAN")]
    NinjaVan,
    #[serde(rename = "GDEX")]
    Gdex,
    #[serde(rename = "POSLAJU")]
    PosLaju,
    #[serde(rename = "OTHERS")]
    Others,
}

impl Courier {
    pub const ALL: [Courier; 5] = [
        Courier::Dhl,
        Courier::NinjaVan,
        Courier::Gdex,
        Courier::PosLaju,
        Courier::Others,
    ];

    /// Canonical upper-snake label, as used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Courier::Dhl => "DHL",
            Courier::NinjaVan => "NINJA_VAN",
            Courier::Gdex => "GDEX",
            Courier::PosLaju => "POSLAJU",
            Courier::Others => "OTHERS",
        }
    }

    /// Directory under the output root holding this courier's batches.
    pub fn dir_name(self) -> &'static str {
        match self {
            Courier::Dhl => "dhl",
            Courier::NinjaVan => "ninja",
            Courier::Gdex => "gdex",
            Courier::PosLaju => "poslaju",
            Courier::Others => "others",
        }
    }

    /// Name used in output filenames when no publisher was detected.
    pub fn display_name(self) -> &'static str {
        match self {
            Courier::Dhl => "DHL",
            Courier::NinjaVan => "Ninja",
            Courier::Gdex => "Gdex",
            Courier::PosLaju => "PosLaju",
            Courier::Others => "Others",
        }
    }
}

impl fmt::Display for Courier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the pages of a document are routed to couriers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    /// Every page goes to [`Courier::PosLaju`]; page text is never read.
    WholeDocument,
    /// Each page is classified from its own text.
    PerPage,
}

static DHL_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bDHL ID\b").expect("valid regex"));
static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("valid regex"));

/// One entry of the per-page rule table.
pub struct CourierRule {
    pub courier: Courier,
    /// Receives the original text and its lowercased copy.
    pub matches: fn(original: &str, lower: &str) -> bool,
}

/// Per-page rules, highest priority first.
///
/// The DHL rule keeps both the case-insensitive substring check and the
/// case-sensitive `DHL ID` word check.
pub static COURIER_RULES: [CourierRule; 3] = [
    CourierRule {
        courier: Courier::Dhl,
        matches: is_dhl,
    },
    CourierRule {
        courier: Courier::NinjaVan,
        matches: is_ninja_van,
    },
    CourierRule {
        courier: Courier::Gdex,
        matches: is_gdex,
    },
];

fn is_dhl(original: &str, lower: &str) -> bool {
    lower.contains("dhl") || DHL_ID.is_match(original)
}

fn is_ninja_van(_original: &str, lower: &str) -> bool {
    lower.contains("ninja") || lower.contains("d3lyv1")
}

fn is_gdex(_original: &str, lower: &str) -> bool {
    lower.contains("gdex")
}

/// Classify one page from its extracted text.
///
/// `None` (no text layer) and unmatched text both yield [`Courier::Others`].
pub fn classify_page(text: Option<&str>) -> Courier {
    let Some(original) = text else {
        return Courier::Others;
    };
    let lower = original.to_lowercase();
    COURIER_RULES
        .iter()
        .find(|rule| (rule.matches)(original, &lower))
        .map(|rule| rule.courier)
        .unwrap_or(Courier::Others)
}

/// Decide the routing mode from the document's original filename.
///
/// Only the stem counts (directories and extension are dropped, as for the
/// date token). It is lowercased and runs of spaces are collapsed before
/// looking for "pos laju", so `"AWB Pos  Laju batch.pdf"` qualifies.
pub fn routing_mode(filename: &str) -> RoutingMode {
    let lower = filename_stem(filename).to_lowercase();
    let collapsed = SPACE_RUNS.replace_all(&lower, " ");
    if collapsed.contains("pos laju") {
        RoutingMode::WholeDocument
    } else {
        RoutingMode::PerPage
    }
}
