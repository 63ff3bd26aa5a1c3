// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Finding normalization (§4.6): the clustering key is file + category +
//! line window + (rule fingerprint OR title similarity).

use std::collections::HashSet;

/// No cross-tool rule-id translation table is wired into this engine — none
/// of the external contracts supply one, so every rule fingerprint is just
/// the raw rule id.
pub fn rule_fingerprint(rule_id: &str) -> &str {
    rule_id
}

/// Lowercased, punctuation-stripped word tokens for the title-similarity
/// metric. Order doesn't matter — only set membership does.
pub fn title_tokens(title: &str) -> HashSet<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|tok| !tok.is_empty())
        .map(|tok| tok.to_lowercase())
        .collect()
}

/// Jaccard similarity over token sets: `|intersection| / |union|`. Two empty
/// titles are considered identical (similarity 1.0) rather than undefined.
pub fn title_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
