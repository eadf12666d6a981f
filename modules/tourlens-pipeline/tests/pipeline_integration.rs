//! End-to-end pipeline runs: raw CSV exports + a ticket feed payload in,
//! integrated records out. No network.

use chrono::NaiveDate;
use tourlens_common::{
    EventRegistry, PipelineConfig, QualitySeverity, ReportType, TourlensError,
};
use tourlens_feed::{FeedParser, RateTable};
use tourlens_pipeline::{export, ingest, Pipeline};

const DAYS_CSV: &str = "\
Reporting starts,Campaign name,Amount spent (USD),Impressions,Link clicks,Results,Result indicator
2025-10-01,NYC_1015,60,600,6,3,actions:offsite_conversion.fb_pixel_purchase
2025-10-02,NYC_1015,40,400,4,2,actions:offsite_conversion.fb_pixel_purchase
2025-10-02,Brand Awareness Push,25,9000,40,,
";

const PLACEMENT_CSV: &str = "\
Reporting starts,Campaign name,Amount spent (USD),Impressions,Link clicks,Platform,Placement
2025-10-01,NYC_1015,60,600,6,facebook,feed
";

const TIME_CSV: &str = "\
Reporting starts,Campaign name,Amount spent (USD),Impressions,Link clicks,Time of day (viewer's time zone)
2025-10-01,NYC_1015,60,600,6,18:00 - 19:00
";

const FEED_CSV: &str = "\
NYC_1015,2025-10-15,2025-10-02,Acme Tour.New York,500,0,0,0,0,0,5,4,\"$20,000\",400,100,80.0,50.0,
endRow
";

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 3).unwrap()
}

fn feed_snapshots() -> Vec<tourlens_common::EventSnapshot> {
    FeedParser::new(RateTable::static_fallback())
        .parse(FEED_CSV, as_of())
        .unwrap()
        .snapshots
}

fn pipeline(snapshots: &[tourlens_common::EventSnapshot]) -> Pipeline {
    let registry = EventRegistry::new(snapshots.iter().map(|s| s.event_id.clone()));
    Pipeline::new(PipelineConfig {
        registry: Some(registry),
        ..Default::default()
    })
}

#[test]
fn full_run_produces_expected_cross_source_metrics() {
    let snapshots = feed_snapshots();
    let pipeline = pipeline(&snapshots);

    let raw = ingest::read_csv(DAYS_CSV, "days.csv").unwrap();
    let processed = pipeline.process_table(&raw).unwrap();
    assert_eq!(processed.report_type, ReportType::Days);

    let output = pipeline.integrate(&processed, &snapshots);
    let nyc = output
        .records
        .iter()
        .find(|r| r.event_id == "NYC_1015")
        .expect("integrated NYC_1015");

    // spend 100, impressions 1000, clicks 10 merged with capacity 500,
    // sold 400, revenue 20000 USD
    let ads = nyc.ads.as_ref().unwrap();
    assert_eq!(ads.spend, 100.0);
    assert_eq!(ads.impressions, 1000.0);
    assert_eq!(ads.clicks, 10.0);
    let ctr = nyc.funnel.as_ref().unwrap().impressions_to_clicks.unwrap();
    assert!((ctr - 1.0).abs() < 1e-9, "CTR should be 1.0, got {ctr}");
    assert_eq!(nyc.roas, Some(200.0));
    assert_eq!(nyc.ticket_cost, Some(0.25));

    let snapshot = nyc.snapshot.as_ref().unwrap();
    assert_eq!(snapshot.occupancy, Some(0.8));
}

#[test]
fn per_row_kpis_are_filled_during_processing() {
    let snapshots = feed_snapshots();
    let pipeline = pipeline(&snapshots);
    let raw = ingest::read_csv(DAYS_CSV, "days.csv").unwrap();
    let processed = pipeline.process_table(&raw).unwrap();

    use tourlens_common::CanonicalField;
    // first row: 6 clicks / 600 impressions × 100 = 1.0
    assert_eq!(processed.table.number(0, CanonicalField::Ctr), Some(1.0));
    assert_eq!(processed.table.number(0, CanonicalField::Cpc), Some(10.0));
    assert_eq!(processed.table.number(0, CanonicalField::Cpm), Some(100.0));
}

#[test]
fn result_indicator_feeds_purchases_through_to_aggregates() {
    let snapshots = feed_snapshots();
    let pipeline = pipeline(&snapshots);
    let raw = ingest::read_csv(DAYS_CSV, "days.csv").unwrap();
    let processed = pipeline.process_table(&raw).unwrap();
    let output = pipeline.integrate(&processed, &snapshots);

    let nyc = output.records.iter().find(|r| r.event_id == "NYC_1015").unwrap();
    assert_eq!(nyc.ads.as_ref().unwrap().purchases, 5.0);
}

#[test]
fn unmatched_campaigns_survive_into_statistics() {
    let snapshots = feed_snapshots();
    let pipeline = pipeline(&snapshots);
    let raw = ingest::read_csv(DAYS_CSV, "days.csv").unwrap();
    let processed = pipeline.process_table(&raw).unwrap();

    let unmatched: Vec<_> = processed.matches.iter().filter(|m| !m.is_matched()).collect();
    assert_eq!(unmatched.len(), 1);
    assert_eq!(unmatched[0].campaign, "Brand Awareness Push");

    let output = pipeline.integrate(&processed, &snapshots);
    assert_eq!(output.stats.campaigns_total, 3);
    assert_eq!(output.stats.campaigns_matched, 2);
    assert_eq!(output.stats.campaigns_unmatched, 1);
    let rate = output.stats.match_rate().unwrap();
    assert!((rate - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn each_export_shape_classifies_correctly() {
    let snapshots = feed_snapshots();
    let pipeline = pipeline(&snapshots);

    let days = ingest::read_csv(DAYS_CSV, "days.csv").unwrap();
    let placement = ingest::read_csv(PLACEMENT_CSV, "placement.csv").unwrap();
    let time = ingest::read_csv(TIME_CSV, "time.csv").unwrap();

    assert_eq!(pipeline.process_table(&days).unwrap().report_type, ReportType::Days);
    assert_eq!(
        pipeline.process_table(&placement).unwrap().report_type,
        ReportType::DaysPlacementDevice
    );
    assert_eq!(
        pipeline.process_table(&time).unwrap().report_type,
        ReportType::DaysTime
    );
}

#[test]
fn unrecognized_table_fails_alone_while_others_continue() {
    let snapshots = feed_snapshots();
    let pipeline = pipeline(&snapshots);

    let bogus = ingest::read_csv("foo,bar\n1,2\n", "mystery.csv").unwrap();
    let err = pipeline.process_table(&bogus).unwrap_err();
    assert!(matches!(err, TourlensError::SchemaUnrecognized(_)));

    // the failure of one table does not poison the next
    let days = ingest::read_csv(DAYS_CSV, "days.csv").unwrap();
    assert!(pipeline.process_table(&days).is_ok());
}

#[test]
fn quality_report_flags_nothing_on_clean_input() {
    let snapshots = feed_snapshots();
    let pipeline = pipeline(&snapshots);
    let raw = ingest::read_csv(PLACEMENT_CSV, "placement.csv").unwrap();
    let processed = pipeline.process_table(&raw).unwrap();
    assert_eq!(processed.quality.severity, QualitySeverity::Info);
}

#[test]
fn feed_quality_report_covers_required_fields() {
    let parsed = FeedParser::new(RateTable::static_fallback())
        .parse(FEED_CSV, as_of())
        .unwrap();
    let pipeline = pipeline(&parsed.snapshots);
    let report = pipeline.validate_feed(&parsed.snapshots, &parsed.notes);
    assert_eq!(report.source, tourlens_common::SourceKind::TicketFeed);
    assert_eq!(report.rows, 1);
    // the single snapshot carries every required field
    assert_eq!(report.severity, QualitySeverity::Info);
    for field in ["event_id", "city", "event_date", "capacity", "total_sold"] {
        assert_eq!(report.fields[field].missing, 0, "{field}");
    }
}

#[test]
fn integrated_table_exports_as_csv() {
    let snapshots = feed_snapshots();
    let pipeline = pipeline(&snapshots);
    let raw = ingest::read_csv(DAYS_CSV, "days.csv").unwrap();
    let processed = pipeline.process_table(&raw).unwrap();
    let output = pipeline.integrate(&processed, &snapshots);

    let csv = export::to_csv(&output.records).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("event_id,"));
    let nyc_line = lines.next().unwrap();
    assert!(nyc_line.starts_with("NYC_1015,New York,2025-10-15"));
    assert!(nyc_line.contains("0.25"));
}
