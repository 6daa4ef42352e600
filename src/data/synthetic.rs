//! Deterministic synthetic housing rows.
//!
//! Produces California-housing-shaped records from a seed so that splitting and
//! feature properties can be exercised without the real dataset. Median income
//! is log-normal; `income_skew` is its log-scale standard deviation.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{LogNormal, Normal};

use crate::domain::RawRecord;
use crate::error::{HousingError, Result};

/// Ocean-proximity levels with roughly the real dataset's frequencies.
const OCEAN_LEVELS: [(&str, f64); 5] = [
    ("<1H OCEAN", 0.44),
    ("INLAND", 0.32),
    ("NEAR OCEAN", 0.13),
    ("NEAR BAY", 0.11),
    ("ISLAND", 0.0005),
];

#[derive(Debug, Clone)]
pub struct SyntheticOptions {
    /// Log-scale standard deviation of median income.
    pub income_skew: f64,
    /// Probability that `total_bedrooms` is blank.
    pub missing_bedrooms_rate: f64,
    /// Probability that `households` is zero.
    pub zero_households_rate: f64,
}

impl Default for SyntheticOptions {
    fn default() -> Self {
        Self {
            income_skew: 0.5,
            missing_bedrooms_rate: 0.01,
            zero_households_rate: 0.0,
        }
    }
}

pub fn generate_housing(n: usize, seed: u64, opts: &SyntheticOptions) -> Result<Vec<RawRecord>> {
    if !(opts.income_skew.is_finite() && opts.income_skew > 0.0) {
        return Err(HousingError::Config("income skew must be finite and > 0".to_string()));
    }
    for (name, p) in [
        ("missing bedrooms rate", opts.missing_bedrooms_rate),
        ("zero households rate", opts.zero_households_rate),
    ] {
        if !(0.0..=1.0).contains(&p) {
            return Err(HousingError::Config(format!("{name} must be in [0, 1], got {p}")));
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let income = LogNormal::new(3.5f64.ln(), opts.income_skew)
        .map_err(|e| HousingError::Config(format!("income distribution error: {e}")))?;
    let households_dist = LogNormal::new(400f64.ln(), 0.5)
        .map_err(|e| HousingError::Config(format!("households distribution error: {e}")))?;
    let noise = Normal::new(0.0f64, 1.0)
        .map_err(|e| HousingError::Config(format!("noise distribution error: {e}")))?;
    let ocean = WeightedIndex::new(OCEAN_LEVELS.iter().map(|(_, w)| *w))
        .map_err(|e| HousingError::Config(format!("ocean proximity weights error: {e}")))?;

    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let median_income = income.sample(&mut rng).clamp(0.4999, 15.0001);

        let mut households = households_dist.sample(&mut rng).round().max(1.0);
        let total_rooms = (households * (5.3 + noise.sample(&mut rng)).max(1.0)).round();
        let total_bedrooms = (total_rooms * rng.gen_range(0.15..0.25)).round();
        let population = (households * (2.9 + 0.6 * noise.sample(&mut rng)).max(0.5)).round();
        if rng.gen_bool(opts.zero_households_rate) {
            households = 0.0;
        }

        let (level, _) = OCEAN_LEVELS[ocean.sample(&mut rng)];
        let premium = match level {
            "INLAND" => -60_000.0,
            "NEAR BAY" | "NEAR OCEAN" => 30_000.0,
            "ISLAND" => 150_000.0,
            _ => 0.0,
        };
        let value = (40_000.0 * median_income + premium + 30_000.0 * noise.sample(&mut rng))
            .clamp(14_999.0, 500_001.0);

        out.push(RawRecord {
            longitude: Some(rng.gen_range(-124.35..-114.31)),
            latitude: Some(rng.gen_range(32.54..41.95)),
            housing_median_age: Some(rng.gen_range(1..=52) as f64),
            total_rooms: Some(total_rooms),
            total_bedrooms: (!rng.gen_bool(opts.missing_bedrooms_rate)).then_some(total_bedrooms),
            population: Some(population),
            households: Some(households),
            median_income: Some(median_income),
            median_house_value: value.round(),
            ocean_proximity: level.to_string(),
        });
    }
    Ok(out)
}
