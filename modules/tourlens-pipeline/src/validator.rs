use std::collections::HashMap;

use tourlens_common::{
    CanonicalField, EventSnapshot, FieldQuality, NormalizedTable, NoteKind, QualityNote,
    QualityReport, QualitySeverity, QualityThresholds, SourceKind,
};

/// Fields an ad export must carry for downstream stages to mean anything.
pub const AD_REQUIRED: &[CanonicalField] = &[
    CanonicalField::CampaignName,
    CanonicalField::Spend,
    CanonicalField::Impressions,
];

/// Fields a ticket-feed snapshot must carry.
pub const FEED_REQUIRED: &[&str] = &["event_id", "city", "event_date", "capacity", "total_sold"];

/// Produce the quality report for one normalized ad export.
///
/// Advisory only: the report never blocks processing; callers decide
/// whether to surface it.
pub fn validate_table(table: &NormalizedTable, thresholds: &QualityThresholds) -> QualityReport {
    let rows = table.rows.len() as u32;
    let mut report = QualityReport::new(SourceKind::AdExport, rows);

    let mut violations: HashMap<String, u32> = HashMap::new();
    for note in &table.notes {
        if note.kind == NoteKind::CoercionDefaulted {
            if let Some(field) = &note.field {
                *violations.entry(field.clone()).or_default() += 1;
            }
        }
    }

    for field in &table.columns {
        let name = field.to_string();
        let missing = table.rows.iter().filter(|r| !r.contains_key(field)).count() as u32;
        let type_violations = violations.remove(&name).unwrap_or(0);
        let required = AD_REQUIRED.contains(field);
        let quality = grade(missing, rows, type_violations, required, thresholds);
        report.fields.insert(name, quality);
    }

    // Required columns absent from the table entirely.
    for field in AD_REQUIRED {
        let name = field.to_string();
        if !table.has_column(*field) {
            report
                .fields
                .insert(name, grade(rows, rows, 0, true, thresholds));
        }
    }

    report.notes = table.notes.clone();
    report.severity = report.overall();
    report
}

/// Produce the quality report for a parsed ticket feed.
pub fn validate_snapshots(
    snapshots: &[EventSnapshot],
    notes: &[QualityNote],
    thresholds: &QualityThresholds,
) -> QualityReport {
    let rows = snapshots.len() as u32;
    let mut report = QualityReport::new(SourceKind::TicketFeed, rows);

    for &field in FEED_REQUIRED {
        let missing = snapshots
            .iter()
            .filter(|s| match field {
                "event_id" => s.event_id.is_empty(),
                "city" => s.city.is_none(),
                "event_date" => s.event_date.is_none(),
                "capacity" => s.capacity.is_none(),
                "total_sold" => s.total_sold.is_none(),
                _ => false,
            })
            .count() as u32;
        report
            .fields
            .insert(field.to_string(), grade(missing, rows, 0, true, thresholds));
    }

    report.notes = notes.to_vec();
    report.severity = report.overall();
    report
}

fn grade(
    missing: u32,
    rows: u32,
    type_violations: u32,
    required: bool,
    thresholds: &QualityThresholds,
) -> FieldQuality {
    let mut quality = FieldQuality {
        missing,
        rows,
        type_violations,
        severity: QualitySeverity::Info,
    };
    let rate = quality.missing_rate();
    quality.severity = if required && rate > thresholds.critical_missing_rate {
        QualitySeverity::Critical
    } else if (required && rate > thresholds.warning_missing_rate) || type_violations > 0 {
        QualitySeverity::Warning
    } else {
        QualitySeverity::Info
    };
    quality
}
