use chrono::{Datelike, Local};
use motocat::model::{YearBounds, YearInfo, YearSpan};
use motocat::year::YearExtractor;

fn extractor() -> YearExtractor {
    YearExtractor::new(YearBounds::new(1970, 2024))
}

#[test]
fn validity_bounds_follow_current_year() {
    let years = YearExtractor::new(YearBounds::current());
    let current = Local::now().year();

    assert!(!years.is_valid_year("1969"));
    assert!(!years.is_valid_year("2999"));
    assert!(years.is_valid_year("1970"));
    assert!(years.is_valid_year(&current.to_string()));
    assert!(!years.is_valid_year(&(current + 1).to_string()));
    assert!(!years.is_valid_year("19x0"));
    assert!(!years.is_valid_year(""));
}

#[test]
fn hyphenated_range_wins_over_trailing_year() {
    let found = extractor().extract("Model X 2010-2012");
    assert_eq!(
        found,
        Some(YearInfo {
            span: YearSpan::Range {
                start: 2010,
                end: 2012
            },
            offset: 8,
        })
    );
}

#[test]
fn trailing_year_without_hyphen() {
    let found = extractor().extract("Model X 2010");
    assert_eq!(
        found,
        Some(YearInfo {
            span: YearSpan::Single { year: 2010 },
            offset: 8,
        })
    );
}

#[test]
fn range_may_be_followed_by_more_text() {
    let found = extractor().extract("Z 750 2005-2008 osat");
    assert_eq!(
        found.map(|info| (info.span, info.offset)),
        Some((
            YearSpan::Range {
                start: 2005,
                end: 2008
            },
            6
        ))
    );
}

#[test]
fn invalid_range_falls_back_to_trailing_year() {
    let found = extractor().extract("CR 250 1990-99 2001");
    assert_eq!(
        found,
        Some(YearInfo {
            span: YearSpan::Single { year: 2001 },
            offset: 15,
        })
    );

    let hyphen_in_name = extractor().extract("Super-Tenere 1990");
    assert_eq!(
        hyphen_in_name.map(|info| info.span),
        Some(YearSpan::Single { year: 1990 })
    );
}

#[test]
fn range_with_out_of_bounds_end_and_no_trailing_year_is_rejected() {
    assert_eq!(extractor().extract("XR 600 1985-1969"), None);
    assert_eq!(extractor().extract("XR 600 1985-2031"), None);
}

#[test]
fn hyphen_too_close_to_start_only_checks_tail() {
    let found = extractor().extract("1990-1995");
    assert_eq!(
        found,
        Some(YearInfo {
            span: YearSpan::Single { year: 1995 },
            offset: 5,
        })
    );
}

#[test]
fn hyphen_without_room_for_a_year_only_checks_tail() {
    assert_eq!(extractor().extract("CBR 600 F-199"), None);
    assert_eq!(
        extractor().extract("CBR 600 F 1999-").map(|info| info.span),
        None
    );
}

#[test]
fn no_year_found() {
    assert_eq!(extractor().extract("Model X"), None);
    assert_eq!(extractor().extract("99"), None);
    assert_eq!(extractor().extract(""), None);
}

#[test]
fn offsets_count_characters_not_bytes() {
    let found = extractor().extract("Mönkijä 2004");
    assert_eq!(found.map(|info| info.offset), Some(8));
}

#[test]
fn range_expands_inclusively() {
    let span = YearSpan::Range {
        start: 2005,
        end: 2008,
    };
    assert_eq!(span.years().collect::<Vec<_>>(), vec![2005, 2006, 2007, 2008]);
    assert_eq!(YearSpan::Single { year: 2001 }.years().count(), 1);
}
