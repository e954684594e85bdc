use protest_core::AggregateRow;

// Count-weighted mean of segment medians, not a population median.
pub fn weighted_median_resolution(rows: &[AggregateRow], total: u64) -> Option<f64> {
    if rows.is_empty() || total == 0 {
        return None;
    }

    let weighted = rows
        .iter()
        .map(|row| row.median_resolution_days * row.opportunity_count as f64)
        .sum::<f64>();
    let value = weighted / total as f64;

    value.is_finite().then_some(value)
}
