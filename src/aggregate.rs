//! Count and percentage aggregation over tidy records.
//!
//! Records are grouped by the full partition-key tuple. The percentage
//! denominator is load-bearing: normally it is the total of the partition
//! defined by all keys but the last (share within that partition), but
//! parent-gender-anchored questions report a single global distribution, so
//! their denominator is the grand total. A zero-total partition yields 0%,
//! never NaN.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub keys: Vec<String>,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denominator {
    /// Sum over all buckets sharing every key but the last.
    WithinPartition,
    /// Grand total across all buckets.
    Global,
}

pub fn aggregate(entries: &[(Vec<String>, u64)], denominator: Denominator) -> Vec<Bucket> {
    let mut counts: BTreeMap<Vec<String>, u64> = BTreeMap::new();
    for (keys, count) in entries {
        *counts.entry(keys.clone()).or_insert(0) += count;
    }

    let grand_total: u64 = counts.values().sum();
    let mut partition_totals: BTreeMap<Vec<String>, u64> = BTreeMap::new();
    for (keys, count) in &counts {
        let prefix = keys[..keys.len().saturating_sub(1)].to_vec();
        *partition_totals.entry(prefix).or_insert(0) += count;
    }

    counts
        .into_iter()
        .map(|(keys, count)| {
            let total = match denominator {
                Denominator::Global => grand_total,
                Denominator::WithinPartition => {
                    let prefix = keys[..keys.len().saturating_sub(1)].to_vec();
                    partition_totals.get(&prefix).copied().unwrap_or(0)
                }
            };
            let percentage = if total == 0 {
                0.0
            } else {
                100.0 * count as f64 / total as f64
            };
            Bucket {
                keys,
                count,
                percentage,
            }
        })
        .collect()
}
