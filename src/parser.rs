use crate::config::{BrandMatchPolicy, VocabularyConfig};
use crate::model::{AnchorLink, CatalogEntry, YearSpan};
use crate::year::YearExtractor;
use anyhow::{Result, anyhow};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::{debug, info};

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex must be valid"));

/// Double-escaped arrow some listing titles carry after the brand.
const ENTITY_ARTIFACT: &str = "-&gt";

/// Every `a` element with an `href`, in document order.
pub fn collect_anchors(html: &str) -> Result<Vec<AnchorLink>> {
    let parsed = Html::parse_document(html);
    let selector =
        Selector::parse("a").map_err(|err| anyhow!("invalid anchor selector: {err:?}"))?;

    let mut anchors = Vec::new();
    for element in parsed.select(&selector) {
        let text = element.text().collect::<String>();
        let Some(href) = element.value().attr("href") else {
            debug!(text = %text.trim(), "anchor without href skipped");
            continue;
        };
        anchors.push(AnchorLink::new(text, href));
    }

    Ok(anchors)
}

pub fn normalize_listing_text(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// Why an anchor did not produce a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NoBrand,
    NoYear { brand: String },
    EmptyModel { brand: String },
    InvertedRange { brand: String, start: i32, end: i32 },
}

#[derive(Debug, Default)]
struct ListingDraft {
    brand: Option<String>,
    model: Option<String>,
    years: Option<YearSpan>,
    href: Option<String>,
}

impl ListingDraft {
    fn into_entry(self) -> Result<CatalogEntry, Rejection> {
        let Some(brand) = self.brand.filter(|brand| !brand.is_empty()) else {
            return Err(Rejection::NoBrand);
        };
        let (Some(years), Some(model), Some(source_href)) = (self.years, self.model, self.href)
        else {
            return Err(Rejection::NoYear { brand });
        };
        if model.is_empty() {
            return Err(Rejection::EmptyModel { brand });
        }
        if let YearSpan::Range { start, end } = years
            && start > end
        {
            return Err(Rejection::InvertedRange { brand, start, end });
        }

        Ok(CatalogEntry {
            brand,
            model,
            years,
            source_href,
        })
    }
}

/// Turns one anchor into a catalog entry by brand vocabulary lookup and year extraction.
#[derive(Debug, Clone)]
pub struct ListingParser {
    brands: Vec<String>,
    policy: BrandMatchPolicy,
    years: YearExtractor,
}

impl ListingParser {
    /// Blank vocabulary entries are dropped; they would match every listing.
    pub fn new(mut brands: Vec<String>, policy: BrandMatchPolicy, years: YearExtractor) -> Self {
        brands.retain(|brand| !brand.trim().is_empty());
        Self {
            brands,
            policy,
            years,
        }
    }

    pub fn parse(&self, anchor: &AnchorLink) -> Option<CatalogEntry> {
        match self.evaluate(anchor) {
            Ok(entry) => Some(entry),
            Err(rejection) => {
                debug!(
                    text = %anchor.text.trim(),
                    href = %anchor.href,
                    ?rejection,
                    "listing rejected"
                );
                None
            }
        }
    }

    /// Brands are matched case-insensitively but removed case-sensitively.
    ///
    /// Under [`BrandMatchPolicy::LastWins`] each matching brand overwrites the
    /// brand of the draft, while model, years and href only change when that
    /// brand's residual text yields a year.
    pub fn evaluate(&self, anchor: &AnchorLink) -> Result<CatalogEntry, Rejection> {
        let listing = normalize_listing_text(&anchor.text);
        let lowered = listing.to_lowercase();
        let mut draft = ListingDraft::default();

        for brand in &self.brands {
            if !lowered.contains(&brand.to_lowercase()) {
                continue;
            }
            draft.brand = Some(brand.clone());

            let residual = listing.replace(brand.as_str(), "").replace(ENTITY_ARTIFACT, "");
            if let Some(found) = self.years.extract(&residual) {
                let model = residual.chars().take(found.offset).collect::<String>();
                draft.model = Some(model.trim().to_string());
                draft.years = Some(found.span);
                draft.href = Some(anchor.href.clone());
            }

            if self.policy == BrandMatchPolicy::FirstWins {
                break;
            }
        }

        draft.into_entry()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub entries: Vec<CatalogEntry>,
    pub anchors_seen: usize,
    pub anchors_ignored: usize,
    pub rejected: usize,
}

/// Applies a [`ListingParser`] to every anchor whose href is not on the ignore list.
#[derive(Debug, Clone)]
pub struct CatalogBatchExtractor {
    parser: ListingParser,
    ignored_hrefs: BTreeSet<String>,
}

impl CatalogBatchExtractor {
    pub fn new(parser: ListingParser, ignored_hrefs: BTreeSet<String>) -> Self {
        Self {
            parser,
            ignored_hrefs,
        }
    }

    pub fn from_config(catalog: &VocabularyConfig) -> Self {
        let parser = ListingParser::new(
            catalog.brands.clone(),
            catalog.brand_match,
            YearExtractor::new(catalog.year_bounds()),
        );
        Self::new(parser, catalog.ignored_hrefs.clone())
    }

    /// Entries come out in anchor order; duplicates are left for the store to absorb.
    pub fn extract_all(&self, anchors: &[AnchorLink]) -> Extraction {
        let mut extraction = Extraction {
            anchors_seen: anchors.len(),
            ..Extraction::default()
        };

        for anchor in anchors {
            if self.ignored_hrefs.contains(&anchor.href) {
                extraction.anchors_ignored += 1;
                continue;
            }

            match self.parser.parse(anchor) {
                Some(entry) => {
                    info!(
                        brand = %entry.brand,
                        model = %entry.model,
                        years = ?entry.years.as_vec(),
                        href = %entry.source_href,
                        "listing accepted"
                    );
                    extraction.entries.push(entry);
                }
                None => extraction.rejected += 1,
            }
        }

        info!(
            anchors = extraction.anchors_seen,
            ignored = extraction.anchors_ignored,
            rejected = extraction.rejected,
            entries = extraction.entries.len(),
            "listing extraction complete"
        );

        extraction
    }
}
