use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const MIN_VALID_YEAR: i32 = 1970;

/// One anchor from the listings page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorLink {
    pub text: String,
    pub href: String,
}

impl AnchorLink {
    pub fn new(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: href.into(),
        }
    }
}

/// Inclusive bounds a four character window must fall in to count as a model year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearBounds {
    pub min: i32,
    pub max: i32,
}

impl YearBounds {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// `[1970, current calendar year]`, evaluated when called.
    pub fn current() -> Self {
        Self::new(MIN_VALID_YEAR, Local::now().year())
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.min..=self.max).contains(&year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum YearSpan {
    Single { year: i32 },
    Range { start: i32, end: i32 },
}

impl YearSpan {
    pub fn start(&self) -> i32 {
        match self {
            YearSpan::Single { year } => *year,
            YearSpan::Range { start, .. } => *start,
        }
    }

    pub fn end(&self) -> i32 {
        match self {
            YearSpan::Single { year } => *year,
            YearSpan::Range { end, .. } => *end,
        }
    }

    /// Every calendar year covered, in ascending order. Empty for an inverted range.
    pub fn years(&self) -> RangeInclusive<i32> {
        self.start()..=self.end()
    }

    /// The one or two year values as they appeared in the listing.
    pub fn as_vec(&self) -> Vec<i32> {
        match self {
            YearSpan::Single { year } => vec![*year],
            YearSpan::Range { start, end } => vec![*start, *end],
        }
    }
}

/// Year information found at the tail of a listing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearInfo {
    pub span: YearSpan,
    /// Character offset where the year text begins.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub brand: String,
    pub model: String,
    pub years: YearSpan,
    pub source_href: String,
}

impl CatalogEntry {
    pub fn label(&self) -> String {
        match self.years {
            YearSpan::Single { year } => format!("{} {} {year}", self.brand, self.model),
            YearSpan::Range { start, end } => {
                format!("{} {} {start}-{end}", self.brand, self.model)
            }
        }
    }

    /// Why this entry cannot be stored, if it breaks a catalog entry invariant.
    pub fn invalid_reason(&self) -> Option<String> {
        if self.brand.trim().is_empty() {
            return Some("brand is empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Some("model is empty".to_string());
        }
        if let YearSpan::Range { start, end } = self.years
            && start > end
        {
            return Some(format!("year range {start}-{end} is inverted"));
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistFailure {
    pub brand: String,
    pub model: String,
    pub source_href: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    pub entries_processed: usize,
    pub brands_inserted: usize,
    pub models_inserted: usize,
    pub years_inserted: usize,
    pub failures: Vec<PersistFailure>,
}

impl PersistReport {
    pub fn rows_inserted(&self) -> usize {
        self.brands_inserted + self.models_inserted + self.years_inserted
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlReport {
    pub source_key: String,
    pub anchors_seen: usize,
    pub anchors_ignored: usize,
    pub entries_extracted: usize,
    pub persist: PersistReport,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub brands: usize,
    pub models: usize,
    pub years: usize,
}
