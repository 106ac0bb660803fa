//! Merging and deduplication of per-anchor system batches.
//!
//! Anchors are processed in input order. A system is attributed to the
//! first anchor that returned it; later anchors that also returned it are
//! recorded as overlaps, never as errors.

use crate::models::{AnchorSystem, SystemRecord};
use std::collections::HashMap;
use tracing::{debug, info};

/// A system returned by more than one anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub name: String,
    /// Anchor the system is attributed to.
    pub claimed_by: String,
    /// Later anchors that also returned it, in processing order.
    pub also_in: Vec<String>,
}

impl Overlap {
    /// Every anchor the system appeared in, claimer first.
    pub fn anchors(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.claimed_by.as_str()).chain(self.also_in.iter().map(String::as_str))
    }
}

/// Counts for one merged batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub added: usize,
    pub already_claimed: usize,
}

/// The merged dataset.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Unique systems in first-seen order.
    pub systems: Vec<SystemRecord>,
    /// Systems that fell inside more than one anchor's radius.
    pub overlaps: Vec<Overlap>,
    /// Number of records received before deduplication.
    pub total_before_dedup: usize,
}

impl MergeOutcome {
    pub fn duplicates_removed(&self) -> usize {
        self.total_before_dedup - self.systems.len()
    }
}

/// Incremental first-anchor-wins merger.
#[derive(Debug, Default)]
pub struct Merger {
    /// System name to the anchor that claimed it.
    claimed: HashMap<String, String>,
    /// System name to its index in `outcome.overlaps`.
    overlap_index: HashMap<String, usize>,
    outcome: MergeOutcome,
}

impl Merger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one anchor's systems, tagging the unseen ones with the anchor.
    pub fn add_batch(&mut self, anchor: &AnchorSystem, systems: Vec<SystemRecord>) -> BatchStats {
        let mut stats = BatchStats::default();
        self.outcome.total_before_dedup += systems.len();

        for mut system in systems {
            match self.claimed.get(&system.name) {
                None => {
                    system.tag(anchor);
                    self.claimed
                        .insert(system.name.clone(), anchor.name.clone());
                    self.outcome.systems.push(system);
                    stats.added += 1;
                }
                Some(owner) => {
                    stats.already_claimed += 1;
                    if owner == &anchor.name {
                        debug!("{} returned twice for {}", system.name, anchor.name);
                        continue;
                    }
                    let owner = owner.clone();
                    self.record_overlap(system.name, owner, &anchor.name);
                }
            }
        }

        debug!(
            "Merged batch for {}: {} added, {} already claimed",
            anchor.name, stats.added, stats.already_claimed
        );

        stats
    }

    fn record_overlap(&mut self, name: String, owner: String, anchor_name: &str) {
        match self.overlap_index.get(&name) {
            Some(&index) => {
                let overlap = &mut self.outcome.overlaps[index];
                if !overlap.also_in.iter().any(|a| a == anchor_name) {
                    overlap.also_in.push(anchor_name.to_string());
                }
            }
            None => {
                self.overlap_index
                    .insert(name.clone(), self.outcome.overlaps.len());
                self.outcome.overlaps.push(Overlap {
                    name,
                    claimed_by: owner,
                    also_in: vec![anchor_name.to_string()],
                });
            }
        }
    }

    pub fn finish(self) -> MergeOutcome {
        info!(
            "Deduplication complete: {} systems before, {} after, {} in multiple anchor regions",
            self.outcome.total_before_dedup,
            self.outcome.systems.len(),
            self.outcome.overlaps.len()
        );
        self.outcome
    }
}

/// Merge already-fetched batches in the given order.
pub fn merge_anchor_batches<'a, I>(batches: I) -> MergeOutcome
where
    I: IntoIterator<Item = (&'a AnchorSystem, Vec<SystemRecord>)>,
{
    let mut merger = Merger::new();
    for (anchor, systems) in batches {
        merger.add_batch(anchor, systems);
    }
    merger.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn anchor(name: &str) -> AnchorSystem {
        AnchorSystem {
            name: name.to_string(),
            radius_ly: 20.0,
            description: format!("{name} region"),
        }
    }

    fn systems(names: &[&str]) -> Vec<SystemRecord> {
        names
            .iter()
            .map(|n| SystemRecord::from_value(json!({"name": n, "id": n.len()})).unwrap())
            .collect()
    }

    #[test]
    fn test_disjoint_batches_are_concatenated() {
        let sol = anchor("Sol");
        let colonia = anchor("Colonia");

        let outcome = merge_anchor_batches([
            (&sol, systems(&["Sol", "Barnard's Star"])),
            (&colonia, systems(&["Colonia", "Ratraii"])),
        ]);

        let names: Vec<_> = outcome.systems.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Sol", "Barnard's Star", "Colonia", "Ratraii"]);
        assert!(outcome.overlaps.is_empty());
        assert_eq!(outcome.duplicates_removed(), 0);
    }

    #[test]
    fn test_first_anchor_wins() {
        let a = anchor("Alpha");
        let b = anchor("Beta");

        let outcome = merge_anchor_batches([
            (&a, systems(&["Shared", "OnlyA"])),
            (&b, systems(&["OnlyB", "Shared"])),
        ]);

        let shared = outcome.systems.iter().find(|s| s.name == "Shared").unwrap();
        assert_eq!(shared.anchor_system.as_deref(), Some("Alpha"));
        assert_eq!(shared.anchor_description.as_deref(), Some("Alpha region"));

        let only_b = outcome.systems.iter().find(|s| s.name == "OnlyB").unwrap();
        assert_eq!(only_b.anchor_system.as_deref(), Some("Beta"));

        assert_eq!(
            outcome.overlaps,
            vec![Overlap {
                name: "Shared".to_string(),
                claimed_by: "Alpha".to_string(),
                also_in: vec!["Beta".to_string()],
            }]
        );
        assert_eq!(outcome.total_before_dedup, 4);
        assert_eq!(outcome.duplicates_removed(), 1);
    }

    #[test]
    fn test_attribution_follows_input_order_not_name_order() {
        let zeta = anchor("Zeta");
        let alpha = anchor("Alpha");

        let outcome = merge_anchor_batches([
            (&zeta, systems(&["Shared"])),
            (&alpha, systems(&["Shared"])),
        ]);

        assert_eq!(outcome.systems[0].anchor_system.as_deref(), Some("Zeta"));
    }

    #[test]
    fn test_overlap_across_three_anchors() {
        let a = anchor("A");
        let b = anchor("B");
        let c = anchor("C");

        let outcome = merge_anchor_batches([
            (&a, systems(&["X"])),
            (&b, systems(&["X", "X"])),
            (&c, systems(&["X"])),
        ]);

        assert_eq!(outcome.systems.len(), 1);
        assert_eq!(outcome.overlaps.len(), 1);
        let anchors: Vec<_> = outcome.overlaps[0].anchors().collect();
        assert_eq!(anchors, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_duplicates_within_one_batch() {
        let a = anchor("A");
        let mut merger = Merger::new();

        let stats = merger.add_batch(&a, systems(&["X", "Y", "X"]));
        assert_eq!(stats, BatchStats { added: 2, already_claimed: 1 });

        let outcome = merger.finish();
        assert_eq!(outcome.systems.len(), 2);
        assert!(outcome.overlaps.is_empty());
    }

    #[test]
    fn test_never_emits_duplicate_names() {
        let anchors: Vec<AnchorSystem> = (0..6).map(|i| anchor(&format!("A{i}"))).collect();
        let batches = anchors.iter().enumerate().map(|(i, a)| {
            // Overlapping windows of names: each batch shares names with its neighbours.
            let names: Vec<String> = (i * 3..i * 3 + 7).map(|n| format!("S{}", n % 15)).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            (a, systems(&refs))
        });

        let outcome = merge_anchor_batches(batches);

        let unique: HashSet<_> = outcome.systems.iter().map(|s| &s.name).collect();
        assert_eq!(unique.len(), outcome.systems.len());
        assert_eq!(outcome.systems.len(), 15);
        assert!(outcome
            .systems
            .iter()
            .all(|s| s.anchor_system.is_some() && s.anchor_description.is_some()));
    }

    #[test]
    fn test_empty_input() {
        let outcome = merge_anchor_batches(std::iter::empty());
        assert!(outcome.systems.is_empty());
        assert_eq!(outcome.total_before_dedup, 0);
    }
}
