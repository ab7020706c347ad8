//! The fixed monthly spend bucket set. Unknown buckets are not representable:
//! every engine computation goes through `SpendProfile::buckets()`.

use serde::{Deserialize, Serialize};

/// Monthly spend per bucket, in AED. All amounts are non-negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpendProfile {
    #[serde(default)]
    pub travel: f64,
    #[serde(default)]
    pub retail: f64,
    #[serde(default)]
    pub utilities: f64,
    #[serde(default)]
    pub food_groceries: f64,
    #[serde(default)]
    pub fuel: f64,
    #[serde(default)]
    pub transportation: f64,
    #[serde(default)]
    pub real_estate: f64,
    #[serde(default)]
    pub foreign: f64,
}

impl SpendProfile {
    /// Iterates the fixed bucket set as (name, monthly amount) pairs.
    pub fn buckets(&self) -> [(&'static str, f64); 8] {
        [
            ("travel", self.travel),
            ("retail", self.retail),
            ("utilities", self.utilities),
            ("food_groceries", self.food_groceries),
            ("fuel", self.fuel),
            ("transportation", self.transportation),
            ("real_estate", self.real_estate),
            ("foreign", self.foreign),
        ]
    }

    /// Total monthly spend across every bucket.
    pub fn total(&self) -> f64 {
        self.buckets().iter().map(|(_, amount)| amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_sums_all_buckets() {
        let spend = SpendProfile {
            travel: 1000.0,
            retail: 500.0,
            foreign: 250.0,
            ..SpendProfile::default()
        };
        assert_eq!(spend.total(), 1750.0);
    }

    #[test]
    fn test_deserializes_partial_payload_with_zero_defaults() {
        let spend: SpendProfile =
            serde_json::from_str(r#"{"travel": 1200, "fuel": 300}"#).unwrap();
        assert_eq!(spend.travel, 1200.0);
        assert_eq!(spend.fuel, 300.0);
        assert_eq!(spend.retail, 0.0);
        assert_eq!(spend.buckets().len(), 8);
    }

    #[test]
    fn test_unknown_bucket_is_rejected_by_strictness_of_fields() {
        // Extra keys are ignored by serde, but never become buckets.
        let spend: SpendProfile =
            serde_json::from_str(r#"{"travel": 100, "crypto": 9999}"#).unwrap();
        assert_eq!(spend.total(), 100.0);
    }
}
