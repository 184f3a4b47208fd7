//! Query Filter Module
//!
//! Request-scoped line filter and the line equivalence rules.

use crate::feed::Scalar;

// == Query Filter ==
/// Target lines plus the slim flag for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    /// Line identifiers to keep, already trimmed
    pub targets: Vec<String>,
    /// Drop speed and timestamp from the output
    pub slim: bool,
}

impl QueryFilter {
    // == Constructor ==
    pub fn new<I, S>(targets: I, slim: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            targets: targets
                .into_iter()
                .map(|t| t.as_ref().trim().to_string())
                .collect(),
            slim,
        }
    }

    /// Parses a comma-separated line list such as `"485, 343"`.
    ///
    /// An empty list yields no targets. Otherwise every piece is kept, so
    /// `"485,"` also targets the empty line and matches records without one.
    pub fn parse(lines: &str, slim: bool) -> Self {
        if lines.is_empty() {
            return Self::new(Vec::<&str>::new(), slim);
        }
        Self::new(lines.split(','), slim)
    }

    /// True when no target lines were given.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    // == Matches ==
    /// Checks a record's line against every target.
    ///
    /// A missing line is compared as the empty string.
    pub fn matches(&self, line: Option<&Scalar>) -> bool {
        let line = line.map(|l| l.as_text()).unwrap_or_default();
        self.targets.iter().any(|target| line_matches(&line, target))
    }
}

// == Line Equivalence ==
/// Compares a record line with one target.
///
/// Three tests, any of which is enough: equality once a trailing `.0` is
/// removed from both sides, raw string equality, and numeric equality of the
/// leading float each side starts with (`"485A"` reads as 485). The tests overlap; all three are kept because
/// feed rows carry lines as `"485"`, `485`, or `"485.0"` depending on the row.
pub fn line_matches(line: &str, target: &str) -> bool {
    if strip_decimal_zero(line) == strip_decimal_zero(target) {
        return true;
    }
    if line == target {
        return true;
    }
    match (parse_number(line), parse_number(target)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn strip_decimal_zero(value: &str) -> &str {
    value.strip_suffix(".0").unwrap_or(value)
}

/// Reads the longest float literal at the start of `value`, after leading
/// whitespace. Only the exact word `Infinity` reads as infinite; anything
/// without a leading number reads as None.
fn parse_number(value: &str) -> Option<f64> {
    let text = value.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    if text[end..].starts_with("Infinity") {
        return Some(if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let digits_from = |mut at: usize| {
        while bytes.get(at).is_some_and(u8::is_ascii_digit) {
            at += 1;
        }
        at
    };

    let int_end = digits_from(end);
    let mut mantissa_end = int_end;
    let mut has_digits = int_end > end;
    if bytes.get(int_end) == Some(&b'.') {
        let frac_end = digits_from(int_end + 1);
        has_digits |= frac_end > int_end + 1;
        mantissa_end = frac_end;
    }
    if !has_digits {
        return None;
    }

    end = mantissa_end;
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+') | Some(b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    text[..end].parse().ok()
}
