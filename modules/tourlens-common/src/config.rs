use std::collections::HashSet;

use crate::fields::CanonicalField;

// --- Header aliases ---

/// Ordered alias table: canonical field → accepted header variants.
/// Order matters: when two fields could claim the same header, the first
/// configured entry wins.
#[derive(Debug, Clone)]
pub struct AliasConfig {
    pub entries: Vec<(CanonicalField, Vec<&'static str>)>,
}

impl Default for AliasConfig {
    fn default() -> Self {
        use CanonicalField::*;
        AliasConfig {
            entries: vec![
                (
                    Date,
                    vec![
                        "reporting_starts",
                        "reporting starts",
                        "date",
                        "day",
                        "date_start",
                        "created_time",
                        "reportingstarts",
                    ],
                ),
                (
                    ReportingEnds,
                    vec!["reporting_ends", "reporting ends", "reportingends", "date_stop"],
                ),
                (
                    CampaignName,
                    vec![
                        "campaign_name",
                        "campaign name",
                        "campaign",
                        "campaign id",
                        "campaignname",
                    ],
                ),
                (
                    CampaignDelivery,
                    vec!["campaign_delivery", "campaign delivery", "campaigndelivery"],
                ),
                (AdSetName, vec!["ad_set_name", "ad set name", "adsetname"]),
                (AdSetBudget, vec!["ad_set_budget", "ad set budget", "adsetbudget"]),
                (
                    AdSetBudgetType,
                    vec!["ad_set_budget_type", "ad set budget type", "adsetbudgettype"],
                ),
                (AdName, vec!["ad_name", "ad name", "adname"]),
                (Impressions, vec!["impressions", "impression"]),
                (Reach, vec!["reach"]),
                (Frequency, vec!["frequency"]),
                (
                    Clicks,
                    vec!["clicks", "link_clicks", "link clicks", "linkclicks"],
                ),
                (
                    Spend,
                    vec![
                        "spend",
                        "amount_spent",
                        "amount spent",
                        "amount spent (usd)",
                        "amountspent",
                        "amountspent(usd)",
                        "amountspent usd",
                    ],
                ),
                (
                    Ctr,
                    vec!["ctr", "ctr (link)", "ctr(link)", "ctrlink", "click_through_rate"],
                ),
                (Cpc, vec!["cpc", "cost_per_click", "costperclick"]),
                (
                    Cpm,
                    vec![
                        "cpm",
                        "cpm (cost per 1,000 impressions)",
                        "cpm (cost per 1,000 impressions) (usd)",
                        "cpmcostper1000impressions",
                        "cpmcostper1000impressionsusd",
                    ],
                ),
                (Results, vec!["results", "result"]),
                (
                    ResultIndicator,
                    vec!["result_indicator", "result indicator", "resultindicator"],
                ),
                (
                    CostPerResult,
                    vec!["cost_per_results", "cost per results", "costperresults"],
                ),
                (
                    AttributionSetting,
                    vec!["attribution_setting", "attribution setting", "attributionsetting"],
                ),
                (Starts, vec!["starts"]),
                (Ends, vec!["ends"]),
                (Platform, vec!["platform"]),
                (Placement, vec!["placement"]),
                (
                    DevicePlatform,
                    vec!["device platform", "device_platform", "deviceplatform"],
                ),
                (
                    ImpressionDevice,
                    vec!["impression device", "impression_device", "impressiondevice"],
                ),
                (
                    TimeOfDay,
                    vec![
                        "time of day (viewer's time zone)",
                        "time of day",
                        "time",
                        "timeofdayviewerstimezone",
                        "timeofday",
                    ],
                ),
                (
                    LpViews,
                    vec![
                        "f1",
                        "fun1",
                        "lpviews",
                        "lp_views",
                        "lpviewsf1",
                        "lpviewsfun1",
                        "landingpageviews",
                        "landing_page_views",
                    ],
                ),
                (
                    AddToCart,
                    vec![
                        "f2",
                        "fun2",
                        "addtocart",
                        "add_to_cart",
                        "addtocartf2",
                        "addtocart_fun2",
                        "initiated_checkout",
                    ],
                ),
                (
                    Purchases,
                    vec![
                        "f3",
                        "fun3",
                        "conv_addtocart",
                        "conv_f3",
                        "purchases",
                        "purchases_f3",
                        "orders",
                        "tickets_sold",
                    ],
                ),
            ],
        }
    }
}

/// Result-indicator values that carry a funnel metric in the `results`
/// column. Checked case-insensitively against the normalized indicator.
pub const RESULT_INDICATOR_ALIASES: &[(&str, CanonicalField)] = &[
    ("actions:landing_page_view", CanonicalField::LpViews),
    ("landing_page_view", CanonicalField::LpViews),
    ("landing_page_views", CanonicalField::LpViews),
    ("lpviews", CanonicalField::LpViews),
    ("actions:link_click", CanonicalField::Clicks),
    ("link_clicks", CanonicalField::Clicks),
    (
        "actions:offsite_conversion.fb_pixel_add_to_cart",
        CanonicalField::AddToCart,
    ),
    ("offsite_conversion.fb_pixel_add_to_cart", CanonicalField::AddToCart),
    ("add_to_cart", CanonicalField::AddToCart),
    ("initiate_checkout", CanonicalField::AddToCart),
    (
        "actions:offsite_conversion.fb_pixel_purchase",
        CanonicalField::Purchases,
    ),
    ("offsite_conversion.fb_pixel_purchase", CanonicalField::Purchases),
    ("purchases", CanonicalField::Purchases),
    ("purchase", CanonicalField::Purchases),
    ("onsite_conversion.purchase", CanonicalField::Purchases),
];

// --- Event registry ---

/// The set of known event ids, usually built from the ticket feed.
#[derive(Debug, Clone, Default)]
pub struct EventRegistry {
    ids: HashSet<String>,
}

impl EventRegistry {
    pub fn new(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        EventRegistry {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// --- Validation thresholds ---

/// Missing-rate cutoffs for required fields.
#[derive(Debug, Clone, Copy)]
pub struct QualityThresholds {
    pub critical_missing_rate: f64,
    pub warning_missing_rate: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        QualityThresholds {
            critical_missing_rate: 0.3,
            warning_missing_rate: 0.1,
        }
    }
}

// --- Network sources ---

/// Where and how to fetch the published ticket sheet.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            url: "https://docs.google.com/spreadsheets/d/1hVm1OALKQ244zuJBQV0SsQT08A2_JTDlPytUNULRofA/export?format=csv&gid=0"
                .to_string(),
            timeout_secs: 30,
        }
    }
}

/// Exchange-rate refresh source. When `url` is None only the static
/// fallback table is used.
#[derive(Debug, Clone, Default)]
pub struct RateConfig {
    pub url: Option<String>,
    pub timeout_secs: u64,
}

impl RateConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        RateConfig {
            url: Some(url.into()),
            timeout_secs: 10,
        }
    }
}

// --- Per-run bundle ---

/// Everything one pipeline run needs, taken by value so no run shares
/// mutable state with another.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub aliases: AliasConfig,
    pub registry: Option<EventRegistry>,
    pub thresholds: QualityThresholds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_aliases_cover_every_canonical_field_used_by_reports() {
        let aliases = AliasConfig::default();
        let fields: Vec<_> = aliases.entries.iter().map(|(f, _)| *f).collect();
        assert!(fields.contains(&CanonicalField::Spend));
        assert!(fields.contains(&CanonicalField::TimeOfDay));
        assert!(fields.contains(&CanonicalField::Purchases));
        // no field configured twice
        let unique: HashSet<_> = fields.iter().collect();
        assert_eq!(unique.len(), fields.len());
    }

    #[test]
    fn registry_membership() {
        let registry = EventRegistry::new(["WDC_0927", "NYC_1015"]);
        assert!(registry.contains("WDC_0927"));
        assert!(!registry.contains("LA_0101"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn default_thresholds_match_documented_cutoffs() {
        let t = QualityThresholds::default();
        assert_eq!(t.critical_missing_rate, 0.3);
        assert_eq!(t.warning_missing_rate, 0.1);
    }
}
