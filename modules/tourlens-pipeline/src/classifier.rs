use tourlens_common::{CanonicalField, NormalizedTable, ReportType};

/// Classify a normalized table into one of the known report shapes.
///
/// Pure and deterministic: the decision depends only on which canonical
/// columns are present. Shape priority when several criteria hold is
/// placement/device > time > days.
pub fn classify(table: &NormalizedTable) -> ReportType {
    let has = |field| table.has_column(field);

    // Minimum base set: campaign identity, spend, impressions.
    let has_identity = has(CanonicalField::CampaignName)
        || has(CanonicalField::AdSetName)
        || has(CanonicalField::AdName);
    if !has_identity || !has(CanonicalField::Spend) || !has(CanonicalField::Impressions) {
        return ReportType::Unrecognized;
    }

    if table.columns.iter().any(|c| c.is_device_dimension()) {
        return ReportType::DaysPlacementDevice;
    }
    if has(CanonicalField::TimeOfDay) {
        return ReportType::DaysTime;
    }
    ReportType::Days
}
