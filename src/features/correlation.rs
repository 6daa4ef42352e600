//! Pearson correlation of each numeric attribute with the label.
//!
//! Only used for the ingest summary; it never feeds the feature matrix.

use crate::domain::{NUMERIC_COLUMNS, RawRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct LabelCorrelation {
    pub column: &'static str,
    pub r: f64,
}

/// Correlations sorted from most positive to most negative.
///
/// Rows missing the attribute are skipped pairwise; attributes with zero
/// variance or fewer than two observations are omitted.
pub fn label_correlations(records: &[RawRecord]) -> Vec<LabelCorrelation> {
    let mut out: Vec<LabelCorrelation> = NUMERIC_COLUMNS
        .iter()
        .enumerate()
        .filter_map(|(col, &column)| {
            let pairs: Vec<(f64, f64)> = records
                .iter()
                .filter_map(|r| r.numeric()[col].map(|x| (x, r.median_house_value)))
                .collect();
            pearson(&pairs).map(|r| LabelCorrelation { column, r })
        })
        .collect();
    out.sort_by(|a, b| b.r.total_cmp(&a.r));
    out
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    Some(sxy / denom)
}
