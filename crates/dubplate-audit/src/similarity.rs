//! Pairwise text similarity scoring.
//!
//! Three tiers, evaluated in order: exact normalized equality, substring
//! containment, and a Jaccard ratio over the remaining word tokens. The
//! tiers trade recall for O(1)-per-pair cost, which matters because the
//! duplicate scan is pairwise over the whole bucket.

use std::collections::HashSet;

use crate::text::normalize;

/// Tokens this short are filler ("a", "of", "vs") and only add noise to
/// the Jaccard tier.
const MIN_TOKEN_CHARS: usize = 3;

/// Score how likely two strings name the same thing, in `[0.0, 1.0]`.
///
/// Symmetric and reflexive: `similarity(x, x) == 1.0` for every `x`.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let na = normalize(a);
    let nb = normalize(b);

    if na == nb {
        return 1.0;
    }

    // Partial containment rewards near-prefix/suffix matches such as a
    // title carrying an extra parenthetical.
    if na.contains(&nb) || nb.contains(&na) {
        let len_a = na.chars().count();
        let len_b = nb.chars().count();
        let (shorter, longer) = if len_a < len_b { (len_a, len_b) } else { (len_b, len_a) };
        return shorter as f64 / longer as f64;
    }

    let tokens_a = token_set(&na);
    let tokens_b = token_set(&nb);

    let union = tokens_a.union(&tokens_b).count();
    if union == 0 {
        // Both sides were effectively empty after filtering.
        return 1.0;
    }
    let intersection = tokens_a.intersection(&tokens_b).count();

    intersection as f64 / union as f64
}

fn token_set(normalized: &str) -> HashSet<&str> {
    normalized
        .split_whitespace()
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .collect()
}
