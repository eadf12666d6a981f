use std::collections::{BTreeMap, BTreeSet, HashSet};

use tourlens_common::{
    AdAggregate, CanonicalField, EventSnapshot, IntegratedRecord, MatchResult, NormalizedTable,
    Value,
};

use crate::kpi::{self, non_zero, ratio};

/// Aggregate statistics for one integration run.
#[derive(Debug, Default, PartialEq)]
pub struct IntegrationStats {
    pub total_events: u32,
    pub events_with_both: u32,
    pub ad_only_events: u32,
    pub snapshot_only_events: u32,
    pub campaigns_total: u32,
    pub campaigns_matched: u32,
    pub campaigns_unmatched: u32,
}

impl IntegrationStats {
    /// Matched campaigns / total campaigns. None when no campaigns were seen.
    pub fn match_rate(&self) -> Option<f64> {
        ratio(
            Some(f64::from(self.campaigns_matched)),
            non_zero(f64::from(self.campaigns_total)),
        )
    }
}

impl std::fmt::Display for IntegrationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Integration Complete ===")?;
        writeln!(f, "Events:              {}", self.total_events)?;
        writeln!(f, "  with both sources: {}", self.events_with_both)?;
        writeln!(f, "  ads only:          {}", self.ad_only_events)?;
        writeln!(f, "  snapshot only:     {}", self.snapshot_only_events)?;
        writeln!(f, "Campaign rows:       {}", self.campaigns_total)?;
        writeln!(f, "  matched:           {}", self.campaigns_matched)?;
        writeln!(f, "  unmatched:         {}", self.campaigns_unmatched)?;
        match self.match_rate() {
            Some(rate) => writeln!(f, "Match rate:          {:.0}%", rate * 100.0),
            None => writeln!(f, "Match rate:          n/a"),
        }
    }
}

/// The integrated dataset plus its run statistics.
#[derive(Debug)]
pub struct IntegrationOutput {
    pub records: Vec<IntegratedRecord>,
    pub stats: IntegrationStats,
}

/// Sum ad metrics per matched event id. Rows are paired positionally with
/// their match results; unmatched rows contribute nothing here but stay
/// counted in the statistics.
pub fn aggregate(
    table: &NormalizedTable,
    matches: &[MatchResult],
) -> BTreeMap<String, AdAggregate> {
    let mut aggregates: BTreeMap<String, AdAggregate> = BTreeMap::new();
    let mut campaign_names: BTreeMap<String, HashSet<String>> = BTreeMap::new();

    for (row, result) in table.rows.iter().zip(matches) {
        let Some(event_id) = &result.event_id else {
            continue;
        };
        let agg = aggregates
            .entry(event_id.clone())
            .or_insert_with(|| AdAggregate {
                event_id: event_id.clone(),
                ..Default::default()
            });

        let num = |field: CanonicalField| {
            row.get(&field).and_then(Value::as_number).unwrap_or(0.0)
        };
        agg.spend += num(CanonicalField::Spend);
        agg.impressions += num(CanonicalField::Impressions);
        agg.clicks += num(CanonicalField::Clicks);
        agg.reach += num(CanonicalField::Reach);
        agg.results += num(CanonicalField::Results);
        agg.lp_views += num(CanonicalField::LpViews);
        agg.add_to_cart += num(CanonicalField::AddToCart);
        agg.purchases += num(CanonicalField::Purchases);

        campaign_names
            .entry(event_id.clone())
            .or_default()
            .insert(result.campaign.clone());
    }

    for (event_id, names) in campaign_names {
        if let Some(agg) = aggregates.get_mut(&event_id) {
            agg.campaigns = names.len() as u32;
        }
    }
    aggregates
}

/// Outer-join ad aggregates with event snapshots: one record per event id
/// present in either input, cross-source metrics null-guarded throughout.
pub fn integrate(
    aggregates: BTreeMap<String, AdAggregate>,
    snapshots: &[EventSnapshot],
    matches: &[MatchResult],
) -> IntegrationOutput {
    let snapshot_index: BTreeMap<&str, &EventSnapshot> = snapshots
        .iter()
        .map(|s| (s.event_id.as_str(), s))
        .collect();

    let event_ids: BTreeSet<String> = aggregates
        .keys()
        .cloned()
        .chain(snapshot_index.keys().map(|id| id.to_string()))
        .collect();

    let mut stats = IntegrationStats {
        total_events: event_ids.len() as u32,
        campaigns_total: matches.len() as u32,
        campaigns_matched: matches.iter().filter(|m| m.is_matched()).count() as u32,
        ..Default::default()
    };
    stats.campaigns_unmatched = stats.campaigns_total - stats.campaigns_matched;

    let mut records = Vec::with_capacity(event_ids.len());
    for event_id in event_ids {
        let ads = aggregates.get(&event_id).cloned();
        let snapshot = snapshot_index.get(event_id.as_str()).map(|s| (*s).clone());
        match (&ads, &snapshot) {
            (Some(_), Some(_)) => stats.events_with_both += 1,
            (Some(_), None) => stats.ad_only_events += 1,
            (None, Some(_)) => stats.snapshot_only_events += 1,
            (None, None) => {}
        }
        records.push(build_record(event_id, ads, snapshot));
    }

    IntegrationOutput { records, stats }
}

fn build_record(
    event_id: String,
    ads: Option<AdAggregate>,
    snapshot: Option<EventSnapshot>,
) -> IntegratedRecord {
    let spend = ads.as_ref().map(|a| a.spend);
    let clicks = ads.as_ref().map(|a| a.clicks);
    let results = ads.as_ref().and_then(|a| non_zero(a.results));
    let revenue = snapshot.as_ref().and_then(|s| s.revenue_usd);
    let sold = snapshot.as_ref().and_then(|s| s.total_sold);
    let capacity = snapshot.as_ref().and_then(|s| s.capacity);
    let atp = snapshot.as_ref().and_then(|s| s.avg_ticket_price);

    let spend_nz = spend.and_then(non_zero);
    let sold_nz = sold.and_then(non_zero);
    let clicks_nz = clicks.and_then(non_zero);

    IntegratedRecord {
        funnel: ads.as_ref().map(kpi::funnel_conversions),
        roas: ratio(revenue, spend_nz),
        potential_roas: ratio(
            atp.zip(capacity).map(|(price, cap)| price * cap),
            spend_nz,
        ),
        cpa: ratio(spend, results),
        ticket_cost: ratio(spend, sold_nz),
        click_to_purchase: ratio(sold, clicks_nz).map(|r| r * 100.0),
        clicks_per_ticket: ratio(clicks, sold_nz),
        lp_views_per_ticket: ratio(ads.as_ref().map(|a| a.lp_views), sold_nz),
        add_to_cart_per_ticket: ratio(ads.as_ref().map(|a| a.add_to_cart), sold_nz),
        event_id,
        ads,
        snapshot,
    }
}
