use std::collections::BTreeMap;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, info, warn};

use tourlens_common::{
    EventSnapshot, HoldBreakdown, NoteKind, QualityNote, QualitySeverity, TourlensError,
};

use crate::rates::{detect_currency, RateTable};

// Positional layout of a show row in the sheet export.
const COL_EVENT_ID: usize = 0;
const COL_EVENT_DATE: usize = 1;
const COL_REPORT_DATE: usize = 2;
const COL_EVENT_NAME: usize = 3;
const COL_CAPACITY: usize = 4;
const COL_VENUE_HOLDS: usize = 5;
const COL_WHEELCHAIR: usize = 6;
const COL_CAMERA: usize = 7;
const COL_ARTIST_HOLDS: usize = 8;
const COL_KILLS: usize = 9;
const COL_YESTERDAY_SOLD: usize = 10;
const COL_TODAY_SOLD: usize = 11;
const COL_REVENUE: usize = 12;
const COL_TOTAL_SOLD: usize = 13;
const COL_REMAINING: usize = 14;
const COL_REPORT_MESSAGE: usize = 17;
const MIN_SHOW_COLUMNS: usize = 18;

/// Trailing window for the rolling daily-sales average, in reporting days.
const ROLLING_WINDOW: usize = 7;

/// Everything recovered from one feed download.
#[derive(Debug, Default)]
pub struct ParsedFeed {
    /// One snapshot per event, latest report retained.
    pub snapshots: Vec<EventSnapshot>,
    pub notes: Vec<QualityNote>,
    pub rows_read: u32,
    pub show_rows: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    MonthHeader,
    MonthMarker,
    Show,
    Summary,
    Header,
    Sentinel,
    Unknown,
}

/// Parses the sentinel-terminated sheet export into resolved event
/// snapshots, converting revenue to USD along the way.
pub struct FeedParser {
    rates: RateTable,
    event_id: Regex,
    month_header: Regex,
    month_marker: Regex,
    summary_line: Regex,
    city_from_name: Regex,
    sequence_from_id: Regex,
    city_code_from_id: Regex,
}

impl FeedParser {
    pub fn new(rates: RateTable) -> Self {
        const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December";
        FeedParser {
            rates,
            event_id: Regex::new(r"^[A-Z]{2,3}_\d{4}(_S\d+)?$").expect("static pattern"),
            month_header: Regex::new(&format!("^({MONTHS})$")).expect("static pattern"),
            month_marker: Regex::new(&format!(r"^\*({MONTHS})\*$")).expect("static pattern"),
            summary_line: Regex::new(r"^\d+\s*\(\+\d+\)\s*\d+").expect("static pattern"),
            city_from_name: Regex::new(r"\.([A-Za-z\s]+)").expect("static pattern"),
            sequence_from_id: Regex::new(r"_S(\d+)").expect("static pattern"),
            city_code_from_id: Regex::new(r"^([A-Z]{2,3})_").expect("static pattern"),
        }
    }

    /// Consume rows until the sentinel, extract show rows, resolve the
    /// latest snapshot per event, and derive per-event fields as of `as_of`.
    pub fn parse(&self, csv_text: &str, as_of: NaiveDate) -> Result<ParsedFeed, TourlensError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(csv_text.as_bytes());

        let mut feed = ParsedFeed::default();
        let mut history: Vec<EventSnapshot> = Vec::new();

        for (row_idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| TourlensError::Parse(e.to_string()))?;
            feed.rows_read += 1;

            let cells: Vec<&str> = record.iter().map(str::trim).collect();
            let first = cells.first().copied().unwrap_or("");
            if cells.iter().all(|c| c.is_empty()) {
                continue;
            }

            match self.classify_row(first, &cells) {
                RowKind::Sentinel => {
                    debug!(row = row_idx, "reached sentinel row, ignoring the rest");
                    break;
                }
                RowKind::Show => {
                    feed.show_rows += 1;
                    match self.extract_row(&cells) {
                        Some(snapshot) => history.push(snapshot),
                        None => {
                            warn!(row = row_idx, columns = cells.len(), "show row too short");
                            feed.notes.push(QualityNote::new(
                                NoteKind::UnrecognizedRow,
                                QualitySeverity::Info,
                                format!(
                                    "row {row_idx} looked like a show entry but had {} of {MIN_SHOW_COLUMNS} columns",
                                    cells.len()
                                ),
                            ));
                        }
                    }
                }
                RowKind::MonthHeader | RowKind::MonthMarker | RowKind::Summary | RowKind::Header => {
                    debug!(row = row_idx, cell = first, "skipping helper row");
                }
                RowKind::Unknown => {
                    debug!(row = row_idx, cell = first, "unrecognised row");
                }
            }
        }

        self.resolve_snapshots(history, as_of, &mut feed);
        info!(
            rows = feed.rows_read,
            show_rows = feed.show_rows,
            events = feed.snapshots.len(),
            "parsed ticket feed"
        );
        Ok(feed)
    }

    fn classify_row(&self, first: &str, cells: &[&str]) -> RowKind {
        if self.month_header.is_match(first) {
            return RowKind::MonthHeader;
        }
        if self.month_marker.is_match(first) {
            return RowKind::MonthMarker;
        }
        if first == "endRow" {
            return RowKind::Sentinel;
        }
        if self.event_id.is_match(first) {
            return RowKind::Show;
        }
        if self.summary_line.is_match(first) {
            return RowKind::Summary;
        }
        if first.contains("Show ID") || first.contains("Show Date") {
            return RowKind::Header;
        }
        // Wide rows whose second cell parses as a date are show data with an
        // unconventional id.
        if cells.len() > 10 && cells.get(1).is_some_and(|c| parse_date(c).is_some()) {
            return RowKind::Show;
        }
        RowKind::Unknown
    }

    fn extract_row(&self, cells: &[&str]) -> Option<EventSnapshot> {
        if cells.len() < MIN_SHOW_COLUMNS {
            return None;
        }

        let event_id = cells[COL_EVENT_ID].to_string();
        if event_id.is_empty() {
            return None;
        }

        let mut snapshot = EventSnapshot::new(&event_id);
        snapshot.event_date = parse_date(cells[COL_EVENT_DATE]);
        snapshot.report_date = parse_date(cells[COL_REPORT_DATE]);
        let name = cells[COL_EVENT_NAME];
        snapshot.event_name = (!name.is_empty()).then(|| name.to_string());
        snapshot.capacity = parse_count(cells[COL_CAPACITY]);
        snapshot.holds = HoldBreakdown {
            venue: parse_count(cells[COL_VENUE_HOLDS]),
            wheelchair_companion: parse_count(cells[COL_WHEELCHAIR]),
            camera: parse_count(cells[COL_CAMERA]),
            artist: parse_count(cells[COL_ARTIST_HOLDS]),
            kills: parse_count(cells[COL_KILLS]),
        };
        snapshot.yesterday_sold = parse_count(cells[COL_YESTERDAY_SOLD]);
        snapshot.today_sold = parse_count(cells[COL_TODAY_SOLD]);
        snapshot.total_sold = parse_count(cells[COL_TOTAL_SOLD]);
        snapshot.remaining = parse_count(cells[COL_REMAINING]);
        let message = cells[COL_REPORT_MESSAGE];
        snapshot.report_message = (!message.is_empty()).then(|| message.to_string());

        let (usd, code, local) = self.parse_revenue(cells[COL_REVENUE]);
        snapshot.revenue_usd = usd;
        snapshot.revenue_local = local;
        snapshot.currency = code.map(str::to_string);

        // Grouping attributes recovered from the id and the display name.
        snapshot.city = self
            .city_from_name
            .captures(name)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|c| !c.is_empty());
        snapshot.sequence = self
            .sequence_from_id
            .captures(&event_id)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok());
        snapshot.city_code = self
            .city_code_from_id
            .captures(&event_id)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());

        Some(snapshot)
    }

    /// Split a revenue cell into (USD value, currency code, local amount).
    /// An unknown marker passes the amount through at parity.
    fn parse_revenue(&self, raw: &str) -> (Option<f64>, Option<&'static str>, Option<f64>) {
        let raw = raw.trim();
        if raw.is_empty() {
            return (None, None, None);
        }

        let hint: String = raw
            .chars()
            .filter(|c| !c.is_ascii_digit() && !matches!(c, '.' | ',' | '-'))
            .collect();
        let code = detect_currency(&hint);

        let numeric: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
            .collect();
        let Some(amount) = parse_numeric(&numeric) else {
            return (None, code, None);
        };

        let resolved = code.unwrap_or("USD");
        let rate = self.rates.to_usd_rate(resolved).unwrap_or(1.0);
        (Some(amount * rate), code, Some(amount))
    }

    /// Reduce the history to one snapshot per event id by maximum
    /// report_date, then derive the per-event fields.
    fn resolve_snapshots(&self, history: Vec<EventSnapshot>, as_of: NaiveDate, feed: &mut ParsedFeed) {
        let mut by_event: BTreeMap<String, Vec<EventSnapshot>> = BTreeMap::new();
        for snapshot in history {
            by_event.entry(snapshot.event_id.clone()).or_default().push(snapshot);
        }

        for (event_id, mut rows) in by_event {
            rows.sort_by_key(|s| s.report_date);

            let duplicate_dates = rows
                .windows(2)
                .any(|w| w[0].report_date.is_some() && w[0].report_date == w[1].report_date);
            if duplicate_dates {
                feed.notes.push(QualityNote::for_field(
                    NoteKind::SnapshotConflict,
                    QualitySeverity::Info,
                    event_id.clone(),
                    "multiple rows share a report date; the later row wins",
                ));
            }

            let window = rows.len().saturating_sub(ROLLING_WINDOW);
            let trailing = &rows[window..];
            let avg = trailing
                .iter()
                .map(|s| s.today_sold.unwrap_or(0.0))
                .sum::<f64>()
                / trailing.len() as f64;

            let mut latest = rows.pop().expect("group is never empty");
            latest.avg_sold_last_7 = Some(avg);
            derive_fields(&mut latest, as_of);
            feed.snapshots.push(latest);
        }
    }
}

/// Fill in the derived metrics on a resolved snapshot.
fn derive_fields(snapshot: &mut EventSnapshot, as_of: NaiveDate) {
    snapshot.occupancy = match (snapshot.total_sold, snapshot.capacity) {
        (Some(sold), Some(capacity)) if capacity > 0.0 => Some((sold / capacity).clamp(0.0, 1.0)),
        _ => None,
    };

    if snapshot.remaining.is_none() {
        snapshot.remaining = match (snapshot.capacity, snapshot.total_sold) {
            (Some(capacity), Some(sold)) => Some(capacity - sold),
            _ => None,
        };
    }

    snapshot.effective_capacity = snapshot.capacity.map(|c| c - snapshot.holds.total());

    snapshot.avg_ticket_price = match (snapshot.revenue_usd, snapshot.total_sold) {
        (Some(revenue), Some(sold)) if sold > 0.0 => Some(revenue / sold),
        _ => None,
    };

    snapshot.potential_revenue = match (snapshot.capacity, snapshot.avg_ticket_price) {
        (Some(capacity), Some(atp)) => Some(capacity * atp),
        _ => None,
    };
    snapshot.lost_revenue = match (snapshot.capacity, snapshot.total_sold, snapshot.avg_ticket_price)
    {
        (Some(capacity), Some(sold), Some(atp)) => Some((capacity - sold) * atp),
        _ => None,
    };

    snapshot.days_to_event = snapshot
        .event_date
        .map(|date| (date - as_of).num_days().max(0));

    snapshot.daily_target = match (snapshot.remaining, snapshot.days_to_event) {
        (Some(remaining), Some(days)) if days > 0 => Some(remaining / days as f64),
        _ => None,
    };
}

/// Count columns: strip thousands separators and whitespace, then parse.
fn parse_count(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, ',' | ' ')).collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Locale-agnostic amount parsing: `1,234.56` and `1.234,56` both read as
/// 1234.56; a lone separator followed by a 3-digit group reads as thousands.
pub(crate) fn parse_numeric(raw: &str) -> Option<f64> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let commas = text.matches(',').count();
    let dots = text.matches('.').count();

    let normalized = if commas > 0 && dots > 0 {
        if text.rfind('.') > text.rfind(',') {
            text.replace(',', "")
        } else {
            text.replace('.', "").replace(',', ".")
        }
    } else if commas > 0 {
        if is_grouped(text, ',') {
            text.replace(',', "")
        } else {
            text.replace(',', ".")
        }
    } else if dots > 1 {
        if is_grouped(text, '.') {
            text.replace('.', "")
        } else {
            return None;
        }
    } else {
        text.to_string()
    };

    normalized.parse().ok()
}

/// True when every separator-delimited group after the first has exactly
/// three digits, i.e. the separator is a thousands separator.
fn is_grouped(text: &str, sep: char) -> bool {
    let unsigned = text.trim_start_matches('-');
    let mut groups = unsigned.split(sep);
    let Some(first) = groups.next() else {
        return false;
    };
    if first.is_empty() || first.len() > 3 || !first.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let mut any = false;
    for group in groups {
        if group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        any = true;
    }
    any
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    const FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%b %d, %Y", "%d %b %Y"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}
