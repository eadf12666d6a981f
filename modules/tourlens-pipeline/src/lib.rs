pub mod classifier;
pub mod export;
pub mod ingest;
pub mod integrator;
pub mod kpi;
pub mod matcher;
pub mod normalizer;
pub mod validator;

pub use integrator::{IntegrationOutput, IntegrationStats};
pub use matcher::CampaignMatcher;
pub use normalizer::Normalizer;

use tracing::{info, warn};

use tourlens_common::{
    CanonicalField, EventRegistry, EventSnapshot, MatchResult, NormalizedTable, NoteKind,
    PipelineConfig, QualityNote, QualityReport, QualitySeverity, QualityThresholds, RawTable,
    ReportType, TourlensError, Value,
};

/// One ad export table after normalization, classification, KPI fill, and
/// campaign matching, ready for integration.
#[derive(Debug)]
pub struct ProcessedTable {
    pub table: NormalizedTable,
    pub report_type: ReportType,
    pub matches: Vec<MatchResult>,
    pub quality: QualityReport,
}

/// One batch run over uploaded ad exports and the ticket feed. Holds only
/// run-local, immutable configuration; no state leaks between runs.
pub struct Pipeline {
    normalizer: Normalizer,
    matcher: CampaignMatcher,
    registry: Option<EventRegistry>,
    thresholds: QualityThresholds,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline {
            normalizer: Normalizer::new(&config.aliases),
            matcher: CampaignMatcher::new(),
            registry: config.registry,
            thresholds: config.thresholds,
        }
    }

    /// Normalize, classify, fill KPIs, and match one raw export.
    ///
    /// Only an unrecognized schema is an error; the caller skips that table
    /// and continues with the rest. Everything else (dropped columns, failed
    /// coercions, unmatched campaigns) degrades into the quality report.
    pub fn process_table(&self, raw: &RawTable) -> Result<ProcessedTable, TourlensError> {
        let mut table = self.normalizer.normalize(raw);
        normalizer::apply_result_indicators(&mut table);

        let report_type = classifier::classify(&table);
        if report_type == ReportType::Unrecognized {
            warn!(source = raw.source_name.as_str(), "table matches no known report shape");
            return Err(TourlensError::SchemaUnrecognized(raw.source_name.clone()));
        }

        kpi::fill_missing_kpis(&mut table);
        let matches = self.match_campaigns(&table);

        for m in &matches {
            if let Some(other) = &m.ambiguous_with {
                table.notes.push(QualityNote::for_field(
                    NoteKind::AmbiguousMatch,
                    QualitySeverity::Warning,
                    CanonicalField::CampaignName.to_string(),
                    format!(
                        "campaign '{}' also resolves to '{other}' via a lower-priority pattern",
                        m.campaign
                    ),
                ));
            }
        }

        let quality = validator::validate_table(&table, &self.thresholds);
        info!(
            source = raw.source_name.as_str(),
            report_type = %report_type,
            rows = table.rows.len(),
            matched = matches.iter().filter(|m| m.is_matched()).count(),
            "processed ad export"
        );
        Ok(ProcessedTable {
            table,
            report_type,
            matches,
            quality,
        })
    }

    /// Quality report for the parsed ticket feed, using this run's
    /// thresholds. `notes` is whatever the feed parse accumulated.
    pub fn validate_feed(
        &self,
        snapshots: &[EventSnapshot],
        notes: &[QualityNote],
    ) -> QualityReport {
        validator::validate_snapshots(snapshots, notes, &self.thresholds)
    }

    /// Merge one processed table (normally the base Days export) with the
    /// resolved event snapshots into the integrated dataset.
    pub fn integrate(
        &self,
        processed: &ProcessedTable,
        snapshots: &[EventSnapshot],
    ) -> IntegrationOutput {
        let aggregates = integrator::aggregate(&processed.table, &processed.matches);
        integrator::integrate(aggregates, snapshots, &processed.matches)
    }

    fn match_campaigns(&self, table: &NormalizedTable) -> Vec<MatchResult> {
        table
            .rows
            .iter()
            .map(|row| {
                // Campaign, ad set, and ad names are merged for matching;
                // the event id can hide in any of them.
                let text = [
                    CanonicalField::CampaignName,
                    CanonicalField::AdSetName,
                    CanonicalField::AdName,
                ]
                .iter()
                .filter_map(|f| row.get(f).and_then(Value::as_text))
                .collect::<Vec<_>>()
                .join(" ");
                self.matcher.match_campaign(&text, self.registry.as_ref())
            })
            .collect()
    }
}
