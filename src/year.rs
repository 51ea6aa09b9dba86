use crate::model::{YearBounds, YearInfo, YearSpan};

const YEAR_WIDTH: usize = 4;

/// Finds a trailing model year or a hyphenated year range in listing text.
///
/// Works on fixed four character windows rather than on a date grammar, so
/// whatever precedes the year (model names, engine sizes, stray punctuation)
/// never has to be understood.
#[derive(Debug, Clone, Copy)]
pub struct YearExtractor {
    bounds: YearBounds,
}

impl YearExtractor {
    pub fn new(bounds: YearBounds) -> Self {
        Self { bounds }
    }

    /// Returns the year span found in `text` and the character offset where it
    /// starts, or `None` when neither a range nor a trailing year validates.
    ///
    /// A range around the rightmost hyphen wins over the trailing year. When the
    /// hyphen is not flanked by two valid years the trailing four characters are
    /// still tried.
    pub fn extract(&self, text: &str) -> Option<YearInfo> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();

        let tail_offset = len.saturating_sub(YEAR_WIDTH);
        let trailing = self
            .parse_window(&chars[tail_offset..])
            .map(|year| YearInfo {
                span: YearSpan::Single { year },
                offset: tail_offset,
            });

        let hyphen = chars.iter().rposition(|c| *c == '-');
        match hyphen {
            Some(h) if h > YEAR_WIDTH && len >= h + YEAR_WIDTH + 1 => {
                let left = self.parse_window(&chars[h - YEAR_WIDTH..h]);
                let right = self.parse_window(&chars[h + 1..h + 1 + YEAR_WIDTH]);
                if let (Some(start), Some(end)) = (left, right) {
                    return Some(YearInfo {
                        span: YearSpan::Range { start, end },
                        offset: h - YEAR_WIDTH,
                    });
                }
                trailing
            }
            _ => trailing,
        }
    }

    pub fn is_valid_year(&self, candidate: &str) -> bool {
        let chars: Vec<char> = candidate.chars().collect();
        self.parse_window(&chars).is_some()
    }

    fn parse_window(&self, window: &[char]) -> Option<i32> {
        window
            .iter()
            .collect::<String>()
            .parse::<i32>()
            .ok()
            .filter(|year| self.bounds.contains(*year))
    }
}
