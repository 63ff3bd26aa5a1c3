// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transitive-closure-free clustering (§4.6): each finding is matched
//! against a fixed anchor per existing cluster, never against other members
//! transitively, so clustering never chains through a line window.

use std::collections::HashSet;

use secscan_core::Finding;

use crate::normalize::{rule_fingerprint, title_similarity, title_tokens};

/// One cluster under construction: an anchor (the first finding assigned to
/// it) plus every member, including the anchor itself.
pub struct Cluster {
    pub id: u64,
    anchor_file: String,
    anchor_category: String,
    anchor_line: u32,
    anchor_fingerprint: String,
    anchor_title_tokens: HashSet<String>,
    pub members: Vec<Finding>,
}

impl Cluster {
    fn matches(&self, finding: &Finding, line_window: u32, title_threshold: f64) -> bool {
        if finding.canonical_file() != self.anchor_file || finding.category != self.anchor_category {
            return false;
        }
        if finding.line.abs_diff(self.anchor_line) > line_window {
            return false;
        }
        if rule_fingerprint(&finding.rule_id) == self.anchor_fingerprint {
            return true;
        }
        title_similarity(&title_tokens(&finding.title), &self.anchor_title_tokens) >= title_threshold
    }
}

/// Clusters findings in the deterministic order the caller supplies (§4.6
/// requires sort by file, line, tool name before this is called — enforced
/// by [`crate::sorted_for_clustering`], not repeated here).
///
/// When more than one existing cluster matches a finding, it joins the
/// largest; ties broken by the lower (earlier-created) cluster id.
pub fn cluster_findings(findings: Vec<Finding>, line_window: u32, title_threshold: f64) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();
    let mut next_id = 0u64;

    for finding in findings {
        let candidate = clusters
            .iter()
            .enumerate()
            .filter(|(_, c)| c.matches(&finding, line_window, title_threshold))
            .max_by(|(_, a), (_, b)| a.members.len().cmp(&b.members.len()).then(b.id.cmp(&a.id)))
            .map(|(idx, _)| idx);

        match candidate {
            Some(idx) => clusters[idx].members.push(finding),
            None => {
                let fingerprint = rule_fingerprint(&finding.rule_id).to_string();
                let tokens = title_tokens(&finding.title);
                clusters.push(Cluster {
                    id: next_id,
                    anchor_file: finding.canonical_file(),
                    anchor_category: finding.category.clone(),
                    anchor_line: finding.line,
                    anchor_fingerprint: fingerprint,
                    anchor_title_tokens: tokens,
                    members: vec![finding],
                });
                next_id += 1;
            }
        }
    }

    clusters
}

#[cfg(test)]
#[path = "cluster_tests.rs"]
mod tests;
