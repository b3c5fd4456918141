//! Splits a total document count across tiers according to a weight table.
//!
//! Every tier except the last receives `floor(total * weight / sum)`; the last
//! tier absorbs the rounding remainder, so the plan always sums to the
//! requested total. The result therefore depends on tier order.

use schemars::JsonSchema;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DistributionError {
    #[error("weight table is empty")]
    Empty,

    #[error("weight for tier '{tier}' must be finite and non-negative, got {weight}")]
    InvalidWeight { tier: String, weight: f64 },

    #[error("weights sum to zero")]
    ZeroSum,

    #[error("tier '{0}' appears more than once in the weight table")]
    DuplicateTier(String),
}

/// Target document count for one tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct TierAllocation {
    pub tier: String,
    pub count: u64,
}

/// Ordered tier → count mapping computed once per request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct DistributionPlan {
    allocations: Vec<TierAllocation>,
}

impl DistributionPlan {
    /// Sum of all tier counts
    pub fn total(&self) -> u64 {
        self.allocations.iter().map(|a| a.count).sum()
    }

    pub fn get(&self, tier: &str) -> Option<u64> {
        self.allocations
            .iter()
            .find(|a| a.tier == tier)
            .map(|a| a.count)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TierAllocation> {
        self.allocations.iter()
    }

    pub fn tiers(&self) -> impl Iterator<Item = &str> {
        self.allocations.iter().map(|a| a.tier.as_str())
    }

    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// Number of batches needed to produce every tier with the given batch size
    pub fn batch_count(&self, batch_size: usize) -> u64 {
        let batch_size = batch_size.max(1) as u64;
        self.allocations
            .iter()
            .map(|a| a.count.div_ceil(batch_size))
            .sum()
    }
}

impl<'a> IntoIterator for &'a DistributionPlan {
    type Item = &'a TierAllocation;
    type IntoIter = std::slice::Iter<'a, TierAllocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.allocations.iter()
    }
}

/// Check a weight table and return its sum.
pub fn validate_weights(weights: &[(String, f64)]) -> Result<f64, DistributionError> {
    if weights.is_empty() {
        return Err(DistributionError::Empty);
    }

    let mut sum = 0.0;
    for (i, (tier, weight)) in weights.iter().enumerate() {
        if !weight.is_finite() || *weight < 0.0 {
            return Err(DistributionError::InvalidWeight {
                tier: tier.clone(),
                weight: *weight,
            });
        }
        if weights[..i].iter().any(|(other, _)| other == tier) {
            return Err(DistributionError::DuplicateTier(tier.clone()));
        }
        sum += weight;
    }

    if sum <= 0.0 {
        return Err(DistributionError::ZeroSum);
    }
    Ok(sum)
}

/// Allocate `total` documents across the tiers of `weights`.
///
/// Weights need not sum to 1. A single-tier table yields `{tier: total}`.
pub fn allocate(
    total: u64,
    weights: &[(String, f64)],
) -> Result<DistributionPlan, DistributionError> {
    let sum = validate_weights(weights)?;

    let mut allocations = Vec::with_capacity(weights.len());
    let mut allocated = 0u64;
    let last = weights.len() - 1;

    for (i, (tier, weight)) in weights.iter().enumerate() {
        let count = if i == last {
            total - allocated
        } else {
            let share = (total as f64 * weight / sum).floor() as u64;
            share.min(total - allocated)
        };
        allocated += count;
        allocations.push(TierAllocation {
            tier: tier.clone(),
            count,
        });
    }

    Ok(DistributionPlan { allocations })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, f64)]) -> Vec<(String, f64)> {
        entries.iter().map(|(t, w)| (t.to_string(), *w)).collect()
    }

    #[test]
    fn test_worked_example() {
        let weights = table(&[("a", 0.4), ("b", 0.35), ("c", 0.2), ("d", 0.05)]);
        let plan = allocate(10, &weights).unwrap();
        let counts: Vec<u64> = plan.iter().map(|a| a.count).collect();
        assert_eq!(counts, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_conservation_for_awkward_totals() {
        let weights = table(&[("small", 0.4), ("medium", 0.35), ("large", 0.2), ("huge", 0.05)]);
        for total in [0, 1, 3, 7, 99, 1001, 12_345, 1_000_003] {
            let plan = allocate(total, &weights).unwrap();
            assert_eq!(plan.total(), total, "total {}", total);
            assert_eq!(plan.len(), 4);
        }
    }

    #[test]
    fn test_unnormalized_weights() {
        let plan = allocate(9, &table(&[("x", 2.0), ("y", 1.0)])).unwrap();
        assert_eq!(plan.get("x"), Some(6));
        assert_eq!(plan.get("y"), Some(3));
    }

    #[test]
    fn test_single_tier_is_identity() {
        let plan = allocate(12_345, &table(&[("medium", 0.35)])).unwrap();
        assert_eq!(plan.get("medium"), Some(12_345));
    }

    #[test]
    fn test_last_tier_absorbs_remainder() {
        let plan = allocate(5, &table(&[("a", 1.0), ("b", 1.0), ("c", 1.0)])).unwrap();
        let counts: Vec<u64> = plan.iter().map(|a| a.count).collect();
        assert_eq!(counts, vec![1, 1, 3]);

        let plan = allocate(4, &table(&[("a", 1.0), ("b", 0.0)])).unwrap();
        assert_eq!(plan.get("a"), Some(4));
        assert_eq!(plan.get("b"), Some(0));
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert_eq!(allocate(1, &[]), Err(DistributionError::Empty));
        assert_eq!(
            allocate(1, &table(&[("a", 0.0), ("b", 0.0)])),
            Err(DistributionError::ZeroSum)
        );
        assert!(matches!(
            allocate(1, &table(&[("a", -1.0)])),
            Err(DistributionError::InvalidWeight { .. })
        ));
        assert!(matches!(
            allocate(1, &table(&[("a", f64::NAN)])),
            Err(DistributionError::InvalidWeight { .. })
        ));
        assert_eq!(
            allocate(1, &table(&[("a", 1.0), ("a", 2.0)])),
            Err(DistributionError::DuplicateTier("a".to_string()))
        );
    }

    #[test]
    fn test_batch_count() {
        let plan = allocate(2500, &table(&[("a", 0.5), ("b", 0.5)])).unwrap();
        assert_eq!(plan.batch_count(1000), 4);
        assert_eq!(plan.batch_count(5000), 2);
        assert_eq!(allocate(0, &table(&[("a", 1.0)])).unwrap().batch_count(10), 0);
    }
}
