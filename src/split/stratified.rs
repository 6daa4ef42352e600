//! Stratified train/test split on the income category.
//!
//! Each income bucket contributes to the test partition in proportion to its
//! share of the full dataset (largest-remainder allocation), then rows inside a
//! bucket are drawn with a seeded RNG. The same seed also drives an
//! unstratified baseline split used only for the proportion comparison.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::domain::{IncomeCategory, RawRecord};
use crate::error::{HousingError, Result};

/// Single stratified shuffle split.
#[derive(Debug, Clone, Copy)]
pub struct StratifiedSplitter {
    pub test_size: f64,
    pub seed: u64,
}

impl Default for StratifiedSplitter {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
        }
    }
}

/// Disjoint, exhaustive row-id partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Per-category share in the full set, the stratified test set and a random test set.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryProportion {
    pub category: IncomeCategory,
    pub overall: f64,
    pub stratified: f64,
    pub random: f64,
}

impl CategoryProportion {
    /// Relative error of the random test share against the full set, in percent.
    pub fn random_error_pct(&self) -> f64 {
        100.0 * self.random / self.overall - 100.0
    }

    /// Relative error of the stratified test share against the full set, in percent.
    pub fn stratified_error_pct(&self) -> f64 {
        100.0 * self.stratified / self.overall - 100.0
    }
}

/// Output of `StratifiedSplitter::split`.
#[derive(Debug, Clone)]
pub struct StratifiedSplit {
    pub partition: Partition,
    /// Unstratified split of the same size, kept for comparison only.
    pub random_baseline: Partition,
    pub proportions: Vec<CategoryProportion>,
}

impl StratifiedSplit {
    /// Largest absolute deviation of a test share from the full-set share.
    pub fn max_stratified_deviation(&self) -> f64 {
        self.proportions
            .iter()
            .map(|p| (p.stratified - p.overall).abs())
            .fold(0.0, f64::max)
    }

    pub fn max_random_deviation(&self) -> f64 {
        self.proportions
            .iter()
            .map(|p| (p.random - p.overall).abs())
            .fold(0.0, f64::max)
    }
}

impl StratifiedSplitter {
    pub fn new(test_size: f64, seed: u64) -> Self {
        Self { test_size, seed }
    }

    /// Split `records` without touching them; only row ids are returned.
    pub fn split(&self, records: &[RawRecord]) -> Result<StratifiedSplit> {
        let n = records.len();
        let n_test = test_count(self.test_size, n)?;

        let categories = categorize(records)?;
        let mut by_category: [Vec<usize>; 5] = Default::default();
        for (row, cat) in categories.iter().enumerate() {
            by_category[cat.index()].push(row);
        }
        if let Some(empty) = IncomeCategory::ALL
            .iter()
            .find(|c| by_category[c.index()].is_empty())
        {
            return Err(HousingError::Stratification(format!(
                "income category {} has no rows",
                empty.label()
            )));
        }

        let counts: Vec<usize> = by_category.iter().map(Vec::len).collect();
        let allocation = allocate(&counts, n_test);
        debug!(?counts, ?allocation, "test rows allocated per income category");

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut train = Vec::with_capacity(n - n_test);
        let mut test = Vec::with_capacity(n_test);
        for (rows, take) in by_category.iter_mut().zip(&allocation) {
            rows.shuffle(&mut rng);
            let (t, r) = rows.split_at(*take);
            test.extend_from_slice(t);
            train.extend_from_slice(r);
        }
        train.shuffle(&mut rng);
        test.shuffle(&mut rng);

        let partition = Partition { train, test };
        let random_baseline = random_split(n, n_test, self.seed);
        let proportions = compare_proportions(&categories, &partition.test, &random_baseline.test);

        info!(
            rows = n,
            train = partition.train.len(),
            test = partition.test.len(),
            seed = self.seed,
            "stratified split complete"
        );

        Ok(StratifiedSplit {
            partition,
            random_baseline,
            proportions,
        })
    }
}

/// Unstratified split: a seeded permutation, first `n_test` rows go to test.
pub fn random_split(n: usize, n_test: usize, seed: u64) -> Partition {
    let mut rows: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    rows.shuffle(&mut rng);
    let train = rows.split_off(n_test.min(n));
    Partition { train, test: rows }
}

/// Number of test rows for `test_size` (fraction) of `n` rows, rounded up.
fn test_count(test_size: f64, n: usize) -> Result<usize> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(HousingError::Config(format!(
            "test size must be in (0, 1), got {test_size}"
        )));
    }
    let raw = test_size * n as f64;
    // Absorb representation error so 0.2 * 20000 is exactly 4000.
    let rounded = if (raw - raw.round()).abs() < 1e-9 {
        raw.round()
    } else {
        raw.ceil()
    };
    let n_test = rounded as usize;

    if n_test == 0 || n_test >= n {
        return Err(HousingError::Config(format!(
            "test size {test_size} leaves an empty partition for {n} rows"
        )));
    }
    Ok(n_test)
}

fn categorize(records: &[RawRecord]) -> Result<Vec<IncomeCategory>> {
    records
        .iter()
        .enumerate()
        .map(|(row, r)| {
            r.median_income
                .and_then(IncomeCategory::from_income)
                .ok_or_else(|| {
                    HousingError::Stratification(format!(
                        "row {row} has no income category (median_income = {:?})",
                        r.median_income
                    ))
                })
        })
        .collect()
}

/// Largest-remainder allocation of `total` across buckets proportional to `counts`.
fn allocate(counts: &[usize], total: usize) -> Vec<usize> {
    let n: usize = counts.iter().sum();
    let exact: Vec<f64> = counts
        .iter()
        .map(|&c| total as f64 * c as f64 / n as f64)
        .collect();
    let mut alloc: Vec<usize> = exact.iter().map(|x| x.floor() as usize).collect();

    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(counts[b].cmp(&counts[a])).then(a.cmp(&b))
    });

    let mut remaining = total - alloc.iter().sum::<usize>();
    for idx in order.into_iter().cycle() {
        if remaining == 0 {
            break;
        }
        if alloc[idx] < counts[idx] {
            alloc[idx] += 1;
            remaining -= 1;
        }
    }
    alloc
}

fn compare_proportions(categories: &[IncomeCategory], strat_test: &[usize], random_test: &[usize]) -> Vec<CategoryProportion> {
    let overall = shares(categories.iter().copied());
    let stratified = shares(strat_test.iter().map(|&i| categories[i]));
    let random = shares(random_test.iter().map(|&i| categories[i]));

    IncomeCategory::ALL
        .iter()
        .map(|&c| CategoryProportion {
            category: c,
            overall: overall[c.index()],
            stratified: stratified[c.index()],
            random: random[c.index()],
        })
        .collect()
}

fn shares(cats: impl Iterator<Item = IncomeCategory>) -> [f64; 5] {
    let mut counts = [0usize; 5];
    let mut total = 0usize;
    for c in cats {
        counts[c.index()] += 1;
        total += 1;
    }
    let mut out = [0.0; 5];
    if total > 0 {
        for (o, c) in out.iter_mut().zip(counts) {
            *o = c as f64 / total as f64;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::data::synthetic::{SyntheticOptions, generate_housing};
    use proptest::prelude::*;

    fn rows_with_income(incomes: &[f64]) -> Vec<RawRecord> {
        let opts = SyntheticOptions::default();
        let mut rows = generate_housing(incomes.len(), 1, &opts).unwrap();
        for (r, inc) in rows.iter_mut().zip(incomes) {
            r.median_income = Some(*inc);
        }
        rows
    }

    #[test]
    fn twenty_thousand_rows_split_into_exact_sizes() {
        let rows = generate_housing(20_000, 7, &SyntheticOptions::default()).unwrap();
        let split = StratifiedSplitter::new(0.2, 42).split(&rows).unwrap();
        assert_eq!(split.partition.train.len(), 16_000);
        assert_eq!(split.partition.test.len(), 4_000);
    }

    #[test]
    fn split_does_not_mutate_source() {
        let rows = generate_housing(500, 3, &SyntheticOptions::default()).unwrap();
        let before = rows.clone();
        StratifiedSplitter::default().split(&rows).unwrap();
        assert_eq!(rows, before);
    }

    #[test]
    fn same_seed_gives_same_partition() {
        let rows = generate_housing(1_000, 3, &SyntheticOptions::default()).unwrap();
        let a = StratifiedSplitter::new(0.2, 9).split(&rows).unwrap();
        let b = StratifiedSplitter::new(0.2, 9).split(&rows).unwrap();
        assert_eq!(a.partition, b.partition);
    }

    #[test]
    fn proportion_errors_are_relative_percentages() {
        let p = CategoryProportion {
            category: IncomeCategory::C3,
            overall: 0.4,
            stratified: 0.4,
            random: 0.42,
        };
        assert!(p.stratified_error_pct().abs() < 1e-12);
        assert!((p.random_error_pct() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn empty_income_bin_is_a_stratification_error() {
        // Nothing above 6.0, so category 5 is empty.
        let rows = rows_with_income(&[1.0, 2.0, 3.5, 5.0, 1.2, 2.2, 4.0, 5.5, 0.7, 2.9]);
        let err = StratifiedSplitter::default().split(&rows).unwrap_err();
        assert!(matches!(err, HousingError::Stratification(ref m) if m.contains("category 5")));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn missing_income_is_a_stratification_error() {
        let mut rows = generate_housing(100, 5, &SyntheticOptions::default()).unwrap();
        rows[17].median_income = None;
        let err = StratifiedSplitter::default().split(&rows).unwrap_err();
        assert!(err.to_string().contains("row 17"));
    }

    #[test]
    fn invalid_test_size_is_a_config_error() {
        let rows = generate_housing(100, 5, &SyntheticOptions::default()).unwrap();
        for bad in [0.0, 1.0, -0.1, f64::NAN] {
            let err = StratifiedSplitter::new(bad, 1).split(&rows).unwrap_err();
            assert!(matches!(err, HousingError::Config(_)), "{bad}");
        }
    }

    #[test]
    fn allocation_sums_to_total_and_respects_counts() {
        let alloc = allocate(&[3, 3, 3, 1, 10], 4);
        assert_eq!(alloc.iter().sum::<usize>(), 4);
        assert!(alloc.iter().zip([3, 3, 3, 1, 10]).all(|(a, c)| *a <= c));
        assert_eq!(alloc[4], 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn stratified_beats_random_on_skewed_incomes(data_seed in any::<u64>(), split_seed in any::<u64>()) {
            let opts = SyntheticOptions {
                income_skew: 2.0,
                ..SyntheticOptions::default()
            };
            let rows = generate_housing(5_000, data_seed, &opts).unwrap();
            let split = StratifiedSplitter::new(0.2, split_seed).split(&rows).unwrap();
            prop_assert!(
                split.max_stratified_deviation() < split.max_random_deviation(),
                "strat {} vs random {}",
                split.max_stratified_deviation(),
                split.max_random_deviation()
            );
        }

        #[test]
        fn partitions_are_disjoint_and_exhaustive(n in 60usize..400, seed in any::<u64>(), test_size in 0.1f64..0.5) {
            let rows = generate_housing(n, seed, &SyntheticOptions::default()).unwrap();
            // Small samples may miss a bucket; that case is covered above.
            prop_assume!(IncomeCategory::ALL.iter().all(|c| rows
                .iter()
                .any(|r| r.median_income.and_then(IncomeCategory::from_income) == Some(*c))));

            let split = StratifiedSplitter::new(test_size, seed).split(&rows).unwrap();
            let p = &split.partition;
            prop_assert_eq!(p.train.len() + p.test.len(), n);

            let train: HashSet<usize> = p.train.iter().copied().collect();
            let test: HashSet<usize> = p.test.iter().copied().collect();
            prop_assert_eq!(train.len(), p.train.len());
            prop_assert_eq!(test.len(), p.test.len());
            prop_assert!(train.is_disjoint(&test));
            prop_assert!(train.union(&test).all(|&i| i < n));
        }
    }
}
