use tourlens_common::{IntegratedRecord, TourlensError};

/// Column order of the exported flat table.
const HEADERS: &[&str] = &[
    "event_id",
    "city",
    "event_date",
    "report_date",
    "capacity",
    "total_sold",
    "remaining",
    "occupancy",
    "revenue_usd",
    "avg_ticket_price",
    "days_to_event",
    "daily_target",
    "spend",
    "impressions",
    "clicks",
    "reach",
    "results",
    "lp_views",
    "add_to_cart",
    "purchases",
    "campaigns",
    "roas",
    "potential_roas",
    "cpa",
    "ticket_cost",
    "click_to_purchase",
    "clicks_per_ticket",
    "lp_views_per_ticket",
    "add_to_cart_per_ticket",
];

/// Render the integrated dataset as downloadable CSV text, one row per
/// event. Unknown values export as empty cells, never as zeros.
pub fn to_csv(records: &[IntegratedRecord]) -> Result<String, TourlensError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(HEADERS)
        .map_err(|e| TourlensError::Parse(e.to_string()))?;

    for record in records {
        let snapshot = record.snapshot.as_ref();
        let ads = record.ads.as_ref();
        let row = [
            record.event_id.clone(),
            snapshot.and_then(|s| s.city.clone()).unwrap_or_default(),
            fmt_date(snapshot.and_then(|s| s.event_date)),
            fmt_date(snapshot.and_then(|s| s.report_date)),
            fmt_num(snapshot.and_then(|s| s.capacity)),
            fmt_num(snapshot.and_then(|s| s.total_sold)),
            fmt_num(snapshot.and_then(|s| s.remaining)),
            fmt_num(snapshot.and_then(|s| s.occupancy)),
            fmt_num(snapshot.and_then(|s| s.revenue_usd)),
            fmt_num(snapshot.and_then(|s| s.avg_ticket_price)),
            snapshot
                .and_then(|s| s.days_to_event)
                .map(|d| d.to_string())
                .unwrap_or_default(),
            fmt_num(snapshot.and_then(|s| s.daily_target)),
            fmt_num(ads.map(|a| a.spend)),
            fmt_num(ads.map(|a| a.impressions)),
            fmt_num(ads.map(|a| a.clicks)),
            fmt_num(ads.map(|a| a.reach)),
            fmt_num(ads.map(|a| a.results)),
            fmt_num(ads.map(|a| a.lp_views)),
            fmt_num(ads.map(|a| a.add_to_cart)),
            fmt_num(ads.map(|a| a.purchases)),
            ads.map(|a| a.campaigns.to_string()).unwrap_or_default(),
            fmt_num(record.roas),
            fmt_num(record.potential_roas),
            fmt_num(record.cpa),
            fmt_num(record.ticket_cost),
            fmt_num(record.click_to_purchase),
            fmt_num(record.clicks_per_ticket),
            fmt_num(record.lp_views_per_ticket),
            fmt_num(record.add_to_cart_per_ticket),
        ];
        writer
            .write_record(&row)
            .map_err(|e| TourlensError::Parse(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TourlensError::Parse(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| TourlensError::Parse(e.to_string()))
}

fn fmt_num(value: Option<f64>) -> String {
    value.map(|v| format!("{v}")).unwrap_or_default()
}

fn fmt_date(value: Option<chrono::NaiveDate>) -> String {
    value.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourlens_common::{AdAggregate, EventSnapshot};

    fn record(event_id: &str) -> IntegratedRecord {
        IntegratedRecord {
            event_id: event_id.to_string(),
            ads: None,
            snapshot: None,
            funnel: None,
            roas: None,
            potential_roas: None,
            cpa: None,
            ticket_cost: None,
            click_to_purchase: None,
            clicks_per_ticket: None,
            lp_views_per_ticket: None,
            add_to_cart_per_ticket: None,
        }
    }

    #[test]
    fn header_row_plus_one_row_per_record() {
        let csv = to_csv(&[record("NYC_1015"), record("WDC_0927")]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("event_id,city,event_date"));
        assert!(lines[1].starts_with("NYC_1015,"));
    }

    #[test]
    fn unknown_metrics_export_as_empty_cells() {
        let csv = to_csv(&[record("NYC_1015")]).unwrap();
        let data_line = csv.lines().nth(1).unwrap();
        let cells: Vec<&str> = data_line.split(',').collect();
        assert_eq!(cells.len(), HEADERS.len());
        // every cell except the id is unknown
        assert!(cells[1..].iter().all(|c| c.is_empty()));
    }

    #[test]
    fn populated_record_round_trips_values() {
        let mut rec = record("NYC_1015");
        let mut snapshot = EventSnapshot::new("NYC_1015");
        snapshot.capacity = Some(500.0);
        snapshot.total_sold = Some(400.0);
        rec.snapshot = Some(snapshot);
        rec.ads = Some(AdAggregate {
            event_id: "NYC_1015".to_string(),
            spend: 100.0,
            campaigns: 3,
            ..Default::default()
        });
        rec.roas = Some(200.0);

        let csv = to_csv(&[rec]).unwrap();
        let data_line = csv.lines().nth(1).unwrap();
        assert!(data_line.contains("500"));
        assert!(data_line.contains("100"));
        assert!(data_line.contains("200"));
    }
}
