//! How well a JSON value fits a target type.

use std::fmt;

/// A totally ordered fit score; lower is better.
///
/// [`MatchScore::OKAY`] is a perfect fit. Scores are aggregated over a value
/// tree with [`MatchScore::combine`], which keeps the worse of the two, so a
/// container scores no better than its worst child.
///
/// ```
/// use json_bridge::MatchScore;
///
/// assert!(MatchScore::OKAY < MatchScore::SIMILAR);
/// assert!(MatchScore::ROUGHLY_SIMILAR < MatchScore::mismatch(1));
/// assert_eq!(
///     MatchScore::OKAY.combine(MatchScore::mismatch(2)),
///     MatchScore::mismatch(2)
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchScore(u32);

impl MatchScore {
    /// Exact fit.
    pub const OKAY: MatchScore = MatchScore(0);
    /// JSON `null` for a nullable target.
    pub const NULL: MatchScore = MatchScore(1);
    /// Convertible with a small loss of confidence.
    pub const SIMILAR: MatchScore = MatchScore(1);
    /// Convertible, but the value looks like it was meant for another type.
    pub const ROUGHLY_SIMILAR: MatchScore = MatchScore(2);

    /// A structural mismatch of `n` members. Every mismatch ranks below
    /// [`MatchScore::ROUGHLY_SIMILAR`], and more mismatches rank lower.
    pub fn mismatch(n: u32) -> MatchScore {
        MatchScore(Self::ROUGHLY_SIMILAR.0.saturating_add(n))
    }

    /// The worse of two scores.
    pub fn combine(self, other: MatchScore) -> MatchScore {
        self.max(other)
    }

    pub fn is_okay(self) -> bool {
        self == Self::OKAY
    }
}

impl Default for MatchScore {
    fn default() -> Self {
        Self::OKAY
    }
}

impl fmt::Display for MatchScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => f.write_str("okay"),
            1 => f.write_str("similar"),
            2 => f.write_str("roughly similar"),
            n => write!(f, "mismatch({})", n - Self::ROUGHLY_SIMILAR.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        let mut scores = vec![
            MatchScore::mismatch(3),
            MatchScore::ROUGHLY_SIMILAR,
            MatchScore::OKAY,
            MatchScore::mismatch(1),
            MatchScore::SIMILAR,
        ];
        scores.sort();
        assert_eq!(
            scores,
            vec![
                MatchScore::OKAY,
                MatchScore::SIMILAR,
                MatchScore::ROUGHLY_SIMILAR,
                MatchScore::mismatch(1),
                MatchScore::mismatch(3),
            ]
        );
    }

    #[test]
    fn test_null_ranks_with_similar() {
        assert_eq!(MatchScore::NULL, MatchScore::SIMILAR);
        assert!(MatchScore::NULL > MatchScore::OKAY);
    }

    #[test]
    fn test_combine_keeps_worse() {
        assert_eq!(
            MatchScore::SIMILAR.combine(MatchScore::OKAY),
            MatchScore::SIMILAR
        );
        assert_eq!(
            MatchScore::mismatch(1).combine(MatchScore::mismatch(4)),
            MatchScore::mismatch(4)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(MatchScore::OKAY.to_string(), "okay");
        assert_eq!(MatchScore::mismatch(2).to_string(), "mismatch(2)");
    }
}
