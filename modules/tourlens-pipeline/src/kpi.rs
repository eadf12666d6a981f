use tourlens_common::{AdAggregate, CanonicalField, FunnelConversions, NormalizedTable, Value};

/// Null-guarded division. None when the denominator is zero or missing, or
/// when the result would not be finite. A zero result is a measurement;
/// None means "unknown".
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => {
            let value = n / d;
            value.is_finite().then_some(value)
        }
        _ => None,
    }
}

/// Treat a summed metric as a usable denominator only when it is non-zero.
pub fn non_zero(value: f64) -> Option<f64> {
    (value != 0.0).then_some(value)
}

/// Fill in the standard performance ratios the export did not carry.
///
/// A filled column only appears when its inputs exist; rows whose
/// denominator is zero stay missing rather than reading as zero.
pub fn fill_missing_kpis(table: &mut NormalizedTable) {
    fill(table, CanonicalField::Ctr, CanonicalField::Clicks, CanonicalField::Impressions, 100.0);
    fill(table, CanonicalField::Cpc, CanonicalField::Spend, CanonicalField::Clicks, 1.0);
    fill(table, CanonicalField::Cpm, CanonicalField::Spend, CanonicalField::Impressions, 1000.0);
    fill(
        table,
        CanonicalField::CostPerResult,
        CanonicalField::Spend,
        CanonicalField::Results,
        1.0,
    );
}

fn fill(
    table: &mut NormalizedTable,
    target: CanonicalField,
    numerator: CanonicalField,
    denominator: CanonicalField,
    scale: f64,
) {
    if table.has_column(target) || !table.has_column(numerator) || !table.has_column(denominator) {
        return;
    }
    for row in &mut table.rows {
        let n = row.get(&numerator).and_then(Value::as_number);
        let d = row.get(&denominator).and_then(Value::as_number);
        if let Some(value) = ratio(n, d) {
            row.insert(target, Value::Number(value * scale));
        }
    }
    table.add_column(target);
}

/// Stage-over-stage conversion rates for the aggregated funnel, in percent.
pub fn funnel_conversions(agg: &AdAggregate) -> FunnelConversions {
    FunnelConversions {
        impressions_to_clicks: ratio(Some(agg.clicks), non_zero(agg.impressions)).map(|r| r * 100.0),
        clicks_to_lp_views: ratio(Some(agg.lp_views), non_zero(agg.clicks)).map(|r| r * 100.0),
        lp_views_to_add_to_cart: ratio(Some(agg.add_to_cart), non_zero(agg.lp_views))
            .map(|r| r * 100.0),
        add_to_cart_to_purchases: ratio(Some(agg.purchases), non_zero(agg.add_to_cart))
            .map(|r| r * 100.0),
    }
}
