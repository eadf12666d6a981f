use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::quality::QualityNote;

// --- Canonical schema ---

/// The internal name for a semantically identical column across the header
/// variants the ad platforms export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    // Base report
    Date,
    ReportingEnds,
    CampaignName,
    CampaignDelivery,
    AdSetName,
    AdSetBudget,
    AdSetBudgetType,
    AdName,
    Impressions,
    Reach,
    Frequency,
    Clicks,
    Spend,
    Ctr,
    Cpc,
    Cpm,
    Results,
    ResultIndicator,
    CostPerResult,
    AttributionSetting,
    Starts,
    Ends,
    // Placement / device breakdown
    Platform,
    Placement,
    DevicePlatform,
    ImpressionDevice,
    // Time breakdown
    TimeOfDay,
    // Funnel
    LpViews,
    AddToCart,
    Purchases,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Number,
    Date,
    Text,
}

impl CanonicalField {
    /// Every canonical field, in export column order.
    pub const ALL: [CanonicalField; 30] = [
        CanonicalField::Date,
        CanonicalField::ReportingEnds,
        CanonicalField::CampaignName,
        CanonicalField::CampaignDelivery,
        CanonicalField::AdSetName,
        CanonicalField::AdSetBudget,
        CanonicalField::AdSetBudgetType,
        CanonicalField::AdName,
        CanonicalField::Impressions,
        CanonicalField::Reach,
        CanonicalField::Frequency,
        CanonicalField::Clicks,
        CanonicalField::Spend,
        CanonicalField::Ctr,
        CanonicalField::Cpc,
        CanonicalField::Cpm,
        CanonicalField::Results,
        CanonicalField::ResultIndicator,
        CanonicalField::CostPerResult,
        CanonicalField::AttributionSetting,
        CanonicalField::Starts,
        CanonicalField::Ends,
        CanonicalField::Platform,
        CanonicalField::Placement,
        CanonicalField::DevicePlatform,
        CanonicalField::ImpressionDevice,
        CanonicalField::TimeOfDay,
        CanonicalField::LpViews,
        CanonicalField::AddToCart,
        CanonicalField::Purchases,
    ];

    pub fn kind(&self) -> FieldKind {
        match self {
            CanonicalField::Date
            | CanonicalField::ReportingEnds
            | CanonicalField::Starts
            | CanonicalField::Ends => FieldKind::Date,
            CanonicalField::CampaignName
            | CanonicalField::CampaignDelivery
            | CanonicalField::AdSetName
            | CanonicalField::AdSetBudgetType
            | CanonicalField::AdName
            | CanonicalField::ResultIndicator
            | CanonicalField::AttributionSetting
            | CanonicalField::Platform
            | CanonicalField::Placement
            | CanonicalField::DevicePlatform
            | CanonicalField::ImpressionDevice
            | CanonicalField::TimeOfDay => FieldKind::Text,
            _ => FieldKind::Number,
        }
    }

    /// Fields that identify a placement/device breakdown export.
    pub fn is_device_dimension(&self) -> bool {
        matches!(
            self,
            CanonicalField::Platform
                | CanonicalField::Placement
                | CanonicalField::DevicePlatform
                | CanonicalField::ImpressionDevice
        )
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CanonicalField::Date => "date",
            CanonicalField::ReportingEnds => "reporting_ends",
            CanonicalField::CampaignName => "campaign_name",
            CanonicalField::CampaignDelivery => "campaign_delivery",
            CanonicalField::AdSetName => "ad_set_name",
            CanonicalField::AdSetBudget => "ad_set_budget",
            CanonicalField::AdSetBudgetType => "ad_set_budget_type",
            CanonicalField::AdName => "ad_name",
            CanonicalField::Impressions => "impressions",
            CanonicalField::Reach => "reach",
            CanonicalField::Frequency => "frequency",
            CanonicalField::Clicks => "clicks",
            CanonicalField::Spend => "spend",
            CanonicalField::Ctr => "ctr",
            CanonicalField::Cpc => "cpc",
            CanonicalField::Cpm => "cpm",
            CanonicalField::Results => "results",
            CanonicalField::ResultIndicator => "result_indicator",
            CanonicalField::CostPerResult => "cost_per_result",
            CanonicalField::AttributionSetting => "attribution_setting",
            CanonicalField::Starts => "starts",
            CanonicalField::Ends => "ends",
            CanonicalField::Platform => "platform",
            CanonicalField::Placement => "placement",
            CanonicalField::DevicePlatform => "device_platform",
            CanonicalField::ImpressionDevice => "impression_device",
            CanonicalField::TimeOfDay => "time_of_day",
            CanonicalField::LpViews => "lp_views",
            CanonicalField::AddToCart => "add_to_cart",
            CanonicalField::Purchases => "purchases",
        };
        write!(f, "{name}")
    }
}

// --- Cell values ---

/// A typed cell. Absence from a row is the null/unknown state; there is no
/// null variant on purpose, because a zero is a measurement and a missing
/// cell is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

// --- Tables ---

/// One row as read from a source table: ordered (header, value) pairs.
/// Headers are untrusted free text.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub cells: Vec<(String, String)>,
}

/// A whole source table before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub source_name: String,
    pub rows: Vec<RawRecord>,
}

/// One normalized row: canonical field → typed value. Missing fields are
/// simply absent.
pub type NormalizedRow = HashMap<CanonicalField, Value>;

/// A normalized table plus everything learned while normalizing it.
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    pub source_name: String,
    /// Canonical fields present as columns, in first-seen order.
    pub columns: Vec<CanonicalField>,
    pub rows: Vec<NormalizedRow>,
    pub notes: Vec<QualityNote>,
}

impl NormalizedTable {
    pub fn has_column(&self, field: CanonicalField) -> bool {
        self.columns.contains(&field)
    }

    pub fn add_column(&mut self, field: CanonicalField) {
        if !self.columns.contains(&field) {
            self.columns.push(field);
        }
    }

    /// Numeric value of `field` in `row`, if present and numeric.
    pub fn number(&self, row: usize, field: CanonicalField) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.get(&field)).and_then(Value::as_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_has_a_stable_name() {
        for field in CanonicalField::ALL {
            assert!(!field.to_string().is_empty());
        }
    }

    #[test]
    fn field_kinds_match_declared_policy() {
        assert_eq!(CanonicalField::Spend.kind(), FieldKind::Number);
        assert_eq!(CanonicalField::Date.kind(), FieldKind::Date);
        assert_eq!(CanonicalField::CampaignName.kind(), FieldKind::Text);
        assert_eq!(CanonicalField::TimeOfDay.kind(), FieldKind::Text);
    }

    #[test]
    fn device_dimensions_are_flagged() {
        assert!(CanonicalField::Placement.is_device_dimension());
        assert!(CanonicalField::ImpressionDevice.is_device_dimension());
        assert!(!CanonicalField::TimeOfDay.is_device_dimension());
        assert!(!CanonicalField::Spend.is_device_dimension());
    }

    #[test]
    fn value_accessors_are_type_checked() {
        let n = Value::Number(3.5);
        assert_eq!(n.as_number(), Some(3.5));
        assert!(n.as_text().is_none());
        assert!(n.as_date().is_none());
    }
}
