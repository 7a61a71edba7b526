//! Near-miss hints for literals that were not found.
//!
//! When a needle or anchor is absent, the usual cause is drift in the target
//! file: an indentation change, an edited attribute, a renamed identifier.
//! Pointing at the most similar line makes that drift easy to spot. Hints are
//! informational only; matching stays exact.

use serde::Serialize;
use std::fmt;

/// Below this normalized similarity a line is not worth reporting.
const MIN_SIMILARITY: f64 = 0.6;

/// The document line that most resembles a missing literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearMiss {
    /// 1-based line number in the searched document
    pub line: usize,
    /// Normalized Levenshtein similarity in `[0, 1]`
    pub similarity: f64,
    pub text: String,
}

impl fmt::Display for NearMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "closest line {} ({:.0}% similar): {}",
            self.line,
            self.similarity * 100.0,
            self.text.trim()
        )
    }
}

/// Find the line of `document` most similar to the first non-blank line of
/// `literal`. Leading and trailing whitespace is ignored on both sides.
pub fn closest_line(document: &str, literal: &str) -> Option<NearMiss> {
    let probe = literal.lines().map(str::trim).find(|l| !l.is_empty())?;

    let mut best: Option<NearMiss> = None;
    for (idx, line) in document.lines().enumerate() {
        let candidate = line.trim();
        if candidate.is_empty() {
            continue;
        }
        let similarity = strsim::normalized_levenshtein(probe, candidate);
        if similarity < MIN_SIMILARITY {
            continue;
        }
        if best.as_ref().map_or(true, |b| similarity > b.similarity) {
            best = Some(NearMiss {
                line: idx + 1,
                similarity,
                text: line.to_string(),
            });
        }
    }
    best
}
