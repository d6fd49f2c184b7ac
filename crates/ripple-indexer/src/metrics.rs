//! Confidence and complexity heuristics for analyzed files

use ripple_core::ParseMode;

use crate::extractor::Extraction;

const BASE_CONFIDENCE: f64 = 0.3;

/// How much the extractor trusts its own output, in [0, 1].
///
/// Richer extractions score higher; the total is scaled down when the
/// regex fallback or a pattern-only extractor produced the data.
pub fn confidence(extraction: &Extraction, dependency_count: usize, line_count: u32) -> f64 {
    let mut score = BASE_CONFIDENCE;
    score += (dependency_count as f64 * 0.02).min(0.2);
    score += (extraction.functions.len() as f64 * 0.03).min(0.2);
    score += (extraction.classes.len() as f64 * 0.05).min(0.15);
    if line_count > 10 {
        score += (f64::from(line_count) / 1000.0).min(0.1);
    }
    if extraction.has_docstring {
        score += 0.05;
    }

    let factor = match extraction.parse_mode {
        ParseMode::Ast => 1.0,
        ParseMode::Pattern => 0.9,
        ParseMode::Fallback => 0.6,
    };
    round2((score * factor).clamp(0.0, 1.0))
}

/// Structural complexity in [0, 10] from size, classes, callables and
/// dependency count.
pub fn complexity(extraction: &Extraction, dependency_count: usize, line_count: u32) -> u8 {
    let mut score: u32 = match line_count {
        0..50 => 0,
        50..200 => 2,
        200..500 => 4,
        500..1000 => 6,
        _ => 8,
    };

    score += extraction.classes.len().min(3) as u32;

    let callables = extraction.functions.len()
        + extraction
            .classes
            .iter()
            .map(|c| c.methods.len())
            .sum::<usize>();
    score += match callables {
        c if c > 20 => 3,
        c if c > 10 => 2,
        c if c > 5 => 1,
        _ => 0,
    };

    score += match dependency_count {
        d if d > 10 => 2,
        d if d > 5 => 1,
        _ => 0,
    };

    score.min(10) as u8
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
