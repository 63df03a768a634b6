use std::fmt;
use std::ops::Deref;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("Please enter a page range")]
    EmptyExpression,

    #[error("Invalid page number or range: {term}")]
    MalformedTerm { term: String },

    #[error("Invalid range: {term}. Pages must be between 1 and {total_pages}")]
    OutOfRange { term: String, total_pages: u32 },

    #[error("No valid pages selected")]
    EmptySelection,
}

/// One term of a page range expression: a single page or an inclusive span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl PageRange {
    /// Parse a single term like "5" or "1-5". Whitespace around the hyphen is ignored.
    pub fn parse(s: &str) -> Result<Self, RangeError> {
        let s = s.trim();
        let malformed = || RangeError::MalformedTerm {
            term: s.to_string(),
        };

        let mut bounds = s.split('-');
        let start = bounds.next().ok_or_else(malformed)?;
        let end = bounds.next();
        if bounds.next().is_some() {
            return Err(malformed());
        }

        let start = parse_page_number(start).ok_or_else(malformed)?;
        let end = match end {
            Some(end) => Some(parse_page_number(end).ok_or_else(malformed)?),
            None => None,
        };

        Ok(PageRange { start, end })
    }

    /// Expand this term into 1-based page numbers, ascending.
    pub fn expand(&self, total_pages: u32) -> Result<Vec<u32>, RangeError> {
        let end = self.end.unwrap_or(self.start);
        let total = u64::from(total_pages);

        if self.start < 1 || end > total || self.start > end {
            return Err(RangeError::OutOfRange {
                term: self.to_string(),
                total_pages,
            });
        }

        // Both bounds are <= total_pages here, so they fit in u32.
        Ok((self.start as u32..=end as u32).collect())
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}", self.start),
        }
    }
}

/// Unsigned decimal literal. Literals too large for u64 saturate so that they
/// are reported as out of range rather than malformed.
fn parse_page_number(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(s.parse::<u64>().unwrap_or(u64::MAX))
}

/// Ordered list of 1-based page numbers, duplicates kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection(Vec<u32>);

impl PageSelection {
    pub fn into_vec(self) -> Vec<u32> {
        self.0
    }
}

impl Deref for PageSelection {
    type Target = [u32];

    fn deref(&self) -> &[u32] {
        &self.0
    }
}

/// Parse a comma-separated list of page ranges like "1-5,10"
pub fn parse_page_ranges(s: &str) -> Result<Vec<PageRange>, RangeError> {
    if s.trim().is_empty() {
        return Err(RangeError::EmptyExpression);
    }
    s.split(',').map(PageRange::parse).collect()
}

/// Parse an expression and expand it against a document of `total_pages` pages.
///
/// Terms are expanded left to right and concatenated, so "3,1-2" yields
/// `[3, 1, 2]` and "1,1-2" yields `[1, 1, 2]`.
pub fn parse(expression: &str, total_pages: u32) -> Result<PageSelection, RangeError> {
    let ranges = parse_page_ranges(expression)?;
    let mut pages = Vec::new();
    for range in ranges {
        pages.extend(range.expand(total_pages)?);
    }

    if pages.is_empty() {
        return Err(RangeError::EmptySelection);
    }

    Ok(PageSelection(pages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pages(expr: &str, total: u32) -> Vec<u32> {
        parse(expr, total).unwrap().into_vec()
    }

    #[test]
    fn test_single_pages() {
        assert_eq!(pages("1,3,5", 10), vec![1, 3, 5]);
    }

    #[test]
    fn test_page_range() {
        assert_eq!(pages("1-3", 10), vec![1, 2, 3]);
    }

    #[test]
    fn test_comma_separated() {
        assert_eq!(pages("1-3,7,9-10", 10), vec![1, 2, 3, 7, 9, 10]);
    }

    #[test]
    fn test_whitespace_ignored() {
        assert_eq!(pages("  1 - 3 ,  7 ", 10), vec![1, 2, 3, 7]);
    }

    #[test]
    fn test_input_order_and_duplicates_kept() {
        assert_eq!(pages("1,1-2", 10), vec![1, 1, 2]);
        assert_eq!(pages("9,2-3,2", 10), vec![9, 2, 3, 2]);
    }

    #[test]
    fn test_single_page_range() {
        assert_eq!(pages("4-4", 10), vec![4]);
    }

    #[test]
    fn test_zero_start_out_of_range() {
        assert_eq!(
            parse("0-3", 10),
            Err(RangeError::OutOfRange {
                term: "0-3".to_string(),
                total_pages: 10
            })
        );
        assert!(matches!(parse("0", 10), Err(RangeError::OutOfRange { .. })));
    }

    #[test]
    fn test_reverse_range_out_of_range() {
        assert!(matches!(parse("5-2", 10), Err(RangeError::OutOfRange { .. })));
    }

    #[test]
    fn test_page_exceeds_total() {
        assert!(matches!(parse("11", 10), Err(RangeError::OutOfRange { .. })));
        assert!(matches!(parse("8-11", 10), Err(RangeError::OutOfRange { .. })));
        assert!(matches!(
            parse("99999999999999999999999", 10),
            Err(RangeError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(parse("", 10), Err(RangeError::EmptyExpression));
        assert_eq!(parse("   ", 10), Err(RangeError::EmptyExpression));
    }

    #[test]
    fn test_malformed_terms() {
        for expr in ["abc", "1-", "-3", "1-2-3", "1,,2", "2a", "+3", "1.5", "1-x"] {
            assert!(
                matches!(parse(expr, 10), Err(RangeError::MalformedTerm { .. })),
                "{expr} should be malformed"
            );
        }
    }

    #[test]
    fn test_first_failing_term_reported() {
        assert_eq!(
            parse("1,abc,50", 10),
            Err(RangeError::MalformedTerm {
                term: "abc".to_string()
            })
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            parse("5-2", 10).unwrap_err().to_string(),
            "Invalid range: 5-2. Pages must be between 1 and 10"
        );
        assert_eq!(
            parse("", 10).unwrap_err().to_string(),
            "Please enter a page range"
        );
    }

    #[test]
    fn test_all_pages_within_bounds() {
        let exprs = ["1", "1-7", "7", "2-5,1,7", "3-3,3", "1-7,1-7"];
        for total in 7..=9 {
            for expr in exprs {
                let selection = parse(expr, total).unwrap();
                assert!(!selection.is_empty());
                assert!(selection.iter().all(|&p| p >= 1 && p <= total));
            }
        }
    }

    #[test]
    fn test_zero_page_document_rejects_everything() {
        assert!(matches!(parse("1", 0), Err(RangeError::OutOfRange { .. })));
    }
}
