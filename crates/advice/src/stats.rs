//! Caller statistics over the callee → callers map.
//!
//! Used to spot the callees that drag the most functions into
//! instrumentation, and which namespaces they live in.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerStats {
    /// `(callee, caller count)`, ascending by count, then by name.
    pub counts: Vec<(String, usize)>,
    /// Leading `::` segment → callees in that namespace.
    pub namespaces: BTreeMap<String, Vec<String>>,
    /// Total caller/callee edges.
    pub edges: usize,
}

impl CallerStats {
    pub fn from_callees(callees: &BTreeMap<String, Vec<String>>) -> Self {
        let mut stats = CallerStats::default();

        for (callee, callers) in callees {
            stats.edges += callers.len();
            stats.counts.push((callee.clone(), callers.len()));
            // TODO: names whose only class appears in the parameter list land under their return type.
            if let Some((namespace, _)) = callee.split_once("::") {
                stats
                    .namespaces
                    .entry(namespace.to_string())
                    .or_default()
                    .push(callee.clone());
            }
        }
        stats
            .counts
            .sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        stats
    }

    /// The `n` callees with the most callers, busiest first.
    pub fn top(&self, n: usize) -> impl Iterator<Item = &(String, usize)> {
        self.counts.iter().rev().take(n)
    }
}
