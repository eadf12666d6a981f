use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// --- Report classification ---

/// Structural classification of an ad export table. Immutable once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Days,
    DaysPlacementDevice,
    DaysTime,
    Unrecognized,
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportType::Days => write!(f, "days"),
            ReportType::DaysPlacementDevice => write!(f, "days_placement_device"),
            ReportType::DaysTime => write!(f, "days_time"),
            ReportType::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

// --- Ticket feed snapshots ---

/// Seats held back from sale, by hold category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HoldBreakdown {
    pub venue: Option<f64>,
    pub wheelchair_companion: Option<f64>,
    pub camera: Option<f64>,
    pub artist: Option<f64>,
    pub kills: Option<f64>,
}

impl HoldBreakdown {
    /// Sum of all hold categories, missing treated as zero.
    pub fn total(&self) -> f64 {
        [
            self.venue,
            self.wheelchair_companion,
            self.camera,
            self.artist,
            self.kills,
        ]
        .iter()
        .flatten()
        .sum()
    }
}

/// One reported state of an event's ticket sales. After snapshot resolution
/// only the row with the latest report_date survives per event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub event_id: String,
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub report_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub city_code: Option<String>,
    /// Sequence number for multi-show stops (`_S2` suffix on the id).
    pub sequence: Option<u32>,
    pub capacity: Option<f64>,
    pub holds: HoldBreakdown,
    pub yesterday_sold: Option<f64>,
    pub today_sold: Option<f64>,
    pub total_sold: Option<f64>,
    /// Revenue to date converted to USD.
    pub revenue_usd: Option<f64>,
    /// Revenue to date in the reporting currency.
    pub revenue_local: Option<f64>,
    pub currency: Option<String>,
    pub remaining: Option<f64>,
    pub avg_ticket_price: Option<f64>,
    pub report_message: Option<String>,
    // Derived at parse time
    /// total_sold / capacity, clamped to [0, 1]. None when capacity is zero.
    pub occupancy: Option<f64>,
    pub effective_capacity: Option<f64>,
    pub potential_revenue: Option<f64>,
    pub lost_revenue: Option<f64>,
    /// Mean of daily sold over the trailing 7 reporting days.
    pub avg_sold_last_7: Option<f64>,
    pub days_to_event: Option<i64>,
    /// remaining / days_to_event. None when the show date has passed.
    pub daily_target: Option<f64>,
}

impl EventSnapshot {
    pub fn new(event_id: impl Into<String>) -> Self {
        EventSnapshot {
            event_id: event_id.into(),
            event_name: None,
            event_date: None,
            report_date: None,
            city: None,
            city_code: None,
            sequence: None,
            capacity: None,
            holds: HoldBreakdown::default(),
            yesterday_sold: None,
            today_sold: None,
            total_sold: None,
            revenue_usd: None,
            revenue_local: None,
            currency: None,
            remaining: None,
            avg_ticket_price: None,
            report_message: None,
            occupancy: None,
            effective_capacity: None,
            potential_revenue: None,
            lost_revenue: None,
            avg_sold_last_7: None,
            days_to_event: None,
            daily_target: None,
        }
    }
}

// --- Campaign matching ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedReason {
    /// The campaign name fits none of the known naming conventions.
    NoRecognizablePattern,
    /// A pattern matched structurally but the candidate id is not in the registry.
    NoSuchEvent,
}

impl std::fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnmatchedReason::NoRecognizablePattern => write!(f, "no recognizable pattern"),
            UnmatchedReason::NoSuchEvent => write!(f, "pattern matched but no such event"),
        }
    }
}

/// Outcome of matching one campaign name against the event registry.
/// Unmatched campaigns are retained, never discarded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub campaign: String,
    pub event_id: Option<String>,
    /// Name of the extractor that produced the match.
    pub extractor: Option<&'static str>,
    pub confidence: f32,
    pub reason: Option<UnmatchedReason>,
    /// A lower-priority extractor resolved to this different valid id.
    pub ambiguous_with: Option<String>,
}

impl MatchResult {
    pub fn is_matched(&self) -> bool {
        self.event_id.is_some()
    }
}

// --- Integration ---

/// Ad metrics summed over every campaign row matched to one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdAggregate {
    pub event_id: String,
    pub spend: f64,
    pub impressions: f64,
    pub clicks: f64,
    pub reach: f64,
    pub results: f64,
    pub lp_views: f64,
    pub add_to_cart: f64,
    pub purchases: f64,
    /// Distinct campaign names that contributed.
    pub campaigns: u32,
}

/// Stage-over-stage funnel conversion rates, each in percent.
/// A stage with a zero or missing denominator is None.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunnelConversions {
    pub impressions_to_clicks: Option<f64>,
    pub clicks_to_lp_views: Option<f64>,
    pub lp_views_to_add_to_cart: Option<f64>,
    pub add_to_cart_to_purchases: Option<f64>,
}

/// One row of the integrated output: everything known about a single event
/// across both sources. Created once per integration run, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratedRecord {
    pub event_id: String,
    pub ads: Option<AdAggregate>,
    pub snapshot: Option<EventSnapshot>,
    pub funnel: Option<FunnelConversions>,
    /// revenue / spend
    pub roas: Option<f64>,
    /// (avg ticket price × capacity) / spend
    pub potential_roas: Option<f64>,
    /// spend / results
    pub cpa: Option<f64>,
    /// spend / tickets sold
    pub ticket_cost: Option<f64>,
    /// tickets sold / clicks × 100
    pub click_to_purchase: Option<f64>,
    pub clicks_per_ticket: Option<f64>,
    pub lp_views_per_ticket: Option<f64>,
    pub add_to_cart_per_ticket: Option<f64>,
}
