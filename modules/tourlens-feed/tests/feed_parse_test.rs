//! Feed parsing end-to-end: raw sheet export text → resolved snapshots.
//!
//! Each test drives FeedParser over a hand-written CSV payload. No network.

use chrono::NaiveDate;
use tourlens_feed::{FeedParser, RateTable};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn parser() -> FeedParser {
    FeedParser::new(RateTable::static_fallback())
}

const SHEET: &str = "\
Show ID,Show Date,Report Date,Show Name,Capacity,Venue,WC,Camera,Artist,Kills,Yesterday,Today,Sales,Total,Remaining,Pct,ATP,Notes
September
WDC_0927,2025-09-27,2025-09-10,Acme Tour.Washington,2000,20,10,5,15,10,12,8,\"$45,000\",1371,629,68.6,32.8,
WDC_0927,2025-09-27,2025-09-15,Acme Tour.Washington,2000,20,10,5,15,10,8,6,\"$50,000\",1379,621,69.0,36.3,
*September*
1371 (+8) 1379
October
SAO_1010,2025-10-10,2025-09-15,Acme Tour.Sao Paulo,30000,100,50,20,80,50,200,150,\"R$ 1.200.000,50\",21000,9000,70.0,57.1,strong presale
endRow
ZZZ_9999,2025-12-31,2025-09-15,Ghost Tour.Nowhere,1000,0,0,0,0,0,0,0,\"$1\",1,999,0.1,1.0,
";

#[test]
fn rows_after_sentinel_are_ignored() {
    let feed = parser().parse(SHEET, date(2025, 9, 16)).unwrap();
    assert!(feed.snapshots.iter().all(|s| s.event_id != "ZZZ_9999"));
    assert_eq!(feed.snapshots.len(), 2);
}

#[test]
fn snapshot_resolution_keeps_latest_report() {
    let feed = parser().parse(SHEET, date(2025, 9, 16)).unwrap();
    let wdc = feed
        .snapshots
        .iter()
        .find(|s| s.event_id == "WDC_0927")
        .expect("WDC_0927 snapshot");
    assert_eq!(wdc.report_date, Some(date(2025, 9, 15)));
    assert_eq!(wdc.total_sold, Some(1379.0));
    assert_eq!(wdc.revenue_usd, Some(50000.0));
}

#[test]
fn helper_rows_are_skipped_not_fatal() {
    // month headers, the *September* marker, the summary line, and the
    // header row all parse through without producing snapshots
    let feed = parser().parse(SHEET, date(2025, 9, 16)).unwrap();
    assert_eq!(feed.show_rows, 3);
    assert_eq!(feed.snapshots.len(), 2);
}

#[test]
fn brl_revenue_converts_through_the_rate_table() {
    let feed = parser().parse(SHEET, date(2025, 9, 16)).unwrap();
    let sao = feed
        .snapshots
        .iter()
        .find(|s| s.event_id == "SAO_1010")
        .expect("SAO_1010 snapshot");
    assert_eq!(sao.currency.as_deref(), Some("BRL"));
    assert_eq!(sao.revenue_local, Some(1_200_000.50));
    let usd = sao.revenue_usd.expect("converted revenue");
    assert!((usd - 240_000.10).abs() < 1e-6, "got {usd}");
}

#[test]
fn grouping_attributes_come_from_id_and_name() {
    let feed = parser().parse(SHEET, date(2025, 9, 16)).unwrap();
    let wdc = feed.snapshots.iter().find(|s| s.event_id == "WDC_0927").unwrap();
    assert_eq!(wdc.city.as_deref(), Some("Washington"));
    assert_eq!(wdc.city_code.as_deref(), Some("WDC"));
    assert_eq!(wdc.sequence, None);
}

#[test]
fn sequence_suffix_is_extracted() {
    let sheet = "\
LAX_1101_S2,2025-11-01,2025-09-15,Acme Tour.Los Angeles,5000,0,0,0,0,0,0,0,\"$100\",10,4990,0.2,10.0,\n\
endRow\n";
    let feed = parser().parse(sheet, date(2025, 9, 16)).unwrap();
    assert_eq!(feed.snapshots[0].sequence, Some(2));
    assert_eq!(feed.snapshots[0].city_code.as_deref(), Some("LAX"));
}

#[test]
fn derived_fields_on_resolved_snapshot() {
    let feed = parser().parse(SHEET, date(2025, 9, 16)).unwrap();
    let wdc = feed.snapshots.iter().find(|s| s.event_id == "WDC_0927").unwrap();
    let occupancy = wdc.occupancy.expect("occupancy");
    assert!((occupancy - 1379.0 / 2000.0).abs() < 1e-9);
    assert_eq!(wdc.days_to_event, Some(11));
    let target = wdc.daily_target.expect("daily target");
    assert!((target - 621.0 / 11.0).abs() < 1e-9);
    // two reporting days with 8 and 6 sold
    assert_eq!(wdc.avg_sold_last_7, Some(7.0));
    assert_eq!(wdc.effective_capacity, Some(1940.0));
}

#[test]
fn short_show_row_is_noted_and_skipped() {
    let sheet = "WDC_0927,2025-09-27,2025-09-10,Acme Tour.Washington,2000\nendRow\n";
    let feed = parser().parse(sheet, date(2025, 9, 16)).unwrap();
    assert!(feed.snapshots.is_empty());
    assert_eq!(feed.notes.len(), 1);
}

#[test]
fn occupancy_always_in_unit_interval() {
    let feed = parser().parse(SHEET, date(2025, 9, 16)).unwrap();
    for snapshot in &feed.snapshots {
        if let Some(occ) = snapshot.occupancy {
            assert!((0.0..=1.0).contains(&occ), "{} out of range", snapshot.event_id);
        }
    }
}
