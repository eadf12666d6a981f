use regex::Regex;
use tracing::debug;

use tourlens_common::{EventRegistry, MatchResult, UnmatchedReason};

/// A candidate event id recovered from a campaign name, with the optional
/// sequence-free base id to try when the full id is not registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub event_id: String,
    pub base_id: Option<String>,
}

/// One naming convention. Extractors are held in an explicit priority list;
/// adding a convention means adding an implementation, not editing a branch
/// chain.
pub trait CandidateExtractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn confidence(&self) -> f32;
    /// Structural match only; registry validation happens in the matcher.
    fn extract(&self, text: &str) -> Option<Candidate>;
}

/// The standard `CITY_MMDD` / `CITY_MMDD_S#` convention.
struct StandardPattern(Regex);

impl StandardPattern {
    fn new() -> Self {
        StandardPattern(
            Regex::new(r"([A-Z]{2,4})[-_ ]*([0-9]{4})(?:[-_ ]*S([0-9]+))?").expect("static pattern"),
        )
    }
}

impl CandidateExtractor for StandardPattern {
    fn name(&self) -> &'static str {
        "standard pattern"
    }

    fn confidence(&self) -> f32 {
        0.95
    }

    fn extract(&self, text: &str) -> Option<Candidate> {
        let caps = self.0.captures(text)?;
        let city = caps.get(1)?.as_str();
        let mmdd = caps.get(2)?.as_str();
        let base = format!("{city}_{mmdd}");
        match caps.get(3) {
            Some(seq) => Some(Candidate {
                event_id: format!("{base}_S{}", seq.as_str()),
                base_id: Some(base),
            }),
            None => Some(Candidate {
                event_id: base,
                base_id: None,
            }),
        }
    }
}

/// The legacy `REGION-CITY-Sales-MMDD` convention.
struct LegacyPattern(Regex);

impl LegacyPattern {
    fn new() -> Self {
        LegacyPattern(
            Regex::new(r"([A-Z]{2,5})-([A-Z]{2,4})-SALES-([0-9]{4})").expect("static pattern"),
        )
    }
}

impl CandidateExtractor for LegacyPattern {
    fn name(&self) -> &'static str {
        "legacy pattern"
    }

    fn confidence(&self) -> f32 {
        0.85
    }

    fn extract(&self, text: &str) -> Option<Candidate> {
        let caps = self.0.captures(text)?;
        Some(Candidate {
            event_id: format!("{}_{}", caps.get(2)?.as_str(), caps.get(3)?.as_str()),
            base_id: None,
        })
    }
}

/// `CityName_MMDD`: a full city name instead of a code.
struct CityNamePattern(Regex);

impl CityNamePattern {
    fn new() -> Self {
        CityNamePattern(Regex::new(r"([A-Z]{2,})[-_ ]*([0-9]{4})").expect("static pattern"))
    }
}

impl CandidateExtractor for CityNamePattern {
    fn name(&self) -> &'static str {
        "city name pattern"
    }

    fn confidence(&self) -> f32 {
        0.7
    }

    fn extract(&self, text: &str) -> Option<Candidate> {
        let caps = self.0.captures(text)?;
        Some(Candidate {
            event_id: format!("{}_{}", caps.get(1)?.as_str(), caps.get(2)?.as_str()),
            base_id: None,
        })
    }
}

/// `Tour_CityName_NUM`: tour-prefixed names with a show number.
struct TourPattern(Regex);

impl TourPattern {
    fn new() -> Self {
        TourPattern(Regex::new(r"TOUR[-_ ]+([A-Z]+)[-_ ]+([0-9]+)").expect("static pattern"))
    }
}

impl CandidateExtractor for TourPattern {
    fn name(&self) -> &'static str {
        "tour pattern"
    }

    fn confidence(&self) -> f32 {
        0.6
    }

    fn extract(&self, text: &str) -> Option<Candidate> {
        let caps = self.0.captures(text)?;
        Some(Candidate {
            event_id: format!("{}_{}", caps.get(1)?.as_str(), caps.get(2)?.as_str()),
            base_id: None,
        })
    }
}

/// Resolves free-text campaign names to registered event ids.
///
/// Matching is total: it never errors, it only returns an unmatched result
/// with a reason code. With a registry, the first extractor (in priority
/// order) whose candidate is registered wins; without one, the first
/// structural match wins.
pub struct CampaignMatcher {
    extractors: Vec<Box<dyn CandidateExtractor>>,
}

impl CampaignMatcher {
    pub fn new() -> Self {
        CampaignMatcher {
            extractors: vec![
                Box::new(StandardPattern::new()),
                Box::new(LegacyPattern::new()),
                Box::new(CityNamePattern::new()),
                Box::new(TourPattern::new()),
            ],
        }
    }

    pub fn match_campaign(&self, campaign: &str, registry: Option<&EventRegistry>) -> MatchResult {
        let text = campaign.trim();
        if text.is_empty() {
            return unmatched(campaign, UnmatchedReason::NoRecognizablePattern);
        }
        let upper = text.to_uppercase();

        let mut structural = false;
        let mut winner: Option<(&'static str, f32, String)> = None;
        let mut ambiguous_with: Option<String> = None;

        for extractor in &self.extractors {
            let Some(candidate) = extractor.extract(&upper) else {
                continue;
            };
            structural = true;

            let resolved = match registry {
                None => Some(candidate.event_id.clone()),
                Some(reg) if reg.contains(&candidate.event_id) => Some(candidate.event_id.clone()),
                // A sequence-qualified id that is not registered still
                // counts if its base id is.
                Some(reg) => candidate
                    .base_id
                    .as_ref()
                    .filter(|base| reg.contains(base))
                    .cloned(),
            };
            let Some(event_id) = resolved else {
                continue;
            };

            match &winner {
                None => {
                    winner = Some((extractor.name(), extractor.confidence(), event_id));
                    // Without a registry there is nothing further to
                    // cross-check; with one, keep scanning so a second valid
                    // resolution can be flagged.
                    if registry.is_none() {
                        break;
                    }
                }
                Some((_, _, existing)) => {
                    if *existing != event_id && ambiguous_with.is_none() {
                        debug!(
                            campaign = campaign,
                            first = existing.as_str(),
                            second = event_id.as_str(),
                            "campaign resolves through two patterns"
                        );
                        ambiguous_with = Some(event_id);
                    }
                }
            }
        }

        match winner {
            Some((extractor, confidence, event_id)) => MatchResult {
                campaign: campaign.to_string(),
                event_id: Some(event_id),
                extractor: Some(extractor),
                confidence,
                reason: None,
                ambiguous_with,
            },
            None if structural => unmatched(campaign, UnmatchedReason::NoSuchEvent),
            None => unmatched(campaign, UnmatchedReason::NoRecognizablePattern),
        }
    }
}

impl Default for CampaignMatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn unmatched(campaign: &str, reason: UnmatchedReason) -> MatchResult {
    MatchResult {
        campaign: campaign.to_string(),
        event_id: None,
        extractor: None,
        confidence: 0.0,
        reason: Some(reason),
        ambiguous_with: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(ids: &[&str]) -> EventRegistry {
        EventRegistry::new(ids.iter().copied())
    }

    #[test]
    fn standard_pattern_with_sequence() {
        let matcher = CampaignMatcher::new();
        let reg = registry(&["WDC_0927_S2"]);
        let result = matcher.match_campaign("WDC_0927_S2", Some(&reg));
        assert_eq!(result.event_id.as_deref(), Some("WDC_0927_S2"));
        assert_eq!(result.extractor, Some("standard pattern"));
    }

    #[test]
    fn legacy_pattern_resolves_against_registry() {
        let matcher = CampaignMatcher::new();
        let reg = registry(&["WDC_0927"]);
        let result = matcher.match_campaign("US-WDC-Sales-0927", Some(&reg));
        assert_eq!(result.event_id.as_deref(), Some("WDC_0927"));
        assert_eq!(result.extractor, Some("legacy pattern"));
    }

    #[test]
    fn no_digits_means_no_recognizable_pattern() {
        let matcher = CampaignMatcher::new();
        let reg = registry(&["WDC_0927"]);
        let result = matcher.match_campaign("Brand Awareness Push", Some(&reg));
        assert_eq!(result.event_id, None);
        assert_eq!(result.reason, Some(UnmatchedReason::NoRecognizablePattern));
    }

    #[test]
    fn structural_match_without_registered_event() {
        let matcher = CampaignMatcher::new();
        let reg = registry(&["NYC_1015"]);
        let result = matcher.match_campaign("LAX_0101 prospecting", Some(&reg));
        assert_eq!(result.event_id, None);
        assert_eq!(result.reason, Some(UnmatchedReason::NoSuchEvent));
    }

    #[test]
    fn sequence_falls_back_to_base_id() {
        let matcher = CampaignMatcher::new();
        let reg = registry(&["WDC_0927"]);
        let result = matcher.match_campaign("WDC_0927_S3 retargeting", Some(&reg));
        assert_eq!(result.event_id.as_deref(), Some("WDC_0927"));
    }

    #[test]
    fn city_name_pattern_matches_full_names() {
        let matcher = CampaignMatcher::new();
        let reg = registry(&["ATLANTA_1015"]);
        let result = matcher.match_campaign("Atlanta_1015 conversions", Some(&reg));
        assert_eq!(result.event_id.as_deref(), Some("ATLANTA_1015"));
        assert_eq!(result.extractor, Some("city name pattern"));
    }

    #[test]
    fn tour_pattern_matches_show_numbers() {
        let matcher = CampaignMatcher::new();
        let reg = registry(&["AUSTIN_12"]);
        let result = matcher.match_campaign("Tour_Austin_12", Some(&reg));
        assert_eq!(result.event_id.as_deref(), Some("AUSTIN_12"));
        assert_eq!(result.extractor, Some("tour pattern"));
    }

    #[test]
    fn without_registry_first_structural_match_wins() {
        let matcher = CampaignMatcher::new();
        let result = matcher.match_campaign("NYC_1015", None);
        assert_eq!(result.event_id.as_deref(), Some("NYC_1015"));
        assert_eq!(result.extractor, Some("standard pattern"));
    }

    #[test]
    fn priority_beats_input_order_and_flags_ambiguity() {
        // Both the standard and the city-name extractor resolve to valid but
        // different ids; the standard pattern wins and the second id is
        // flagged, not silently dropped.
        let matcher = CampaignMatcher::new();
        let reg = registry(&["ANTA_1015", "ATLANTA_1015"]);
        let result = matcher.match_campaign("Atlanta_1015", Some(&reg));
        assert_eq!(result.event_id.as_deref(), Some("ANTA_1015"));
        assert_eq!(result.extractor, Some("standard pattern"));
        assert_eq!(result.ambiguous_with.as_deref(), Some("ATLANTA_1015"));
    }

    #[test]
    fn matching_is_total_on_odd_input() {
        let matcher = CampaignMatcher::new();
        for campaign in ["", "   ", "___", "1234", "🎭🎭🎭"] {
            let result = matcher.match_campaign(campaign, None);
            assert!(result.event_id.is_none() || !result.campaign.is_empty());
            assert!(result.reason.is_some() || result.event_id.is_some());
        }
    }

    #[test]
    fn unmatched_campaign_is_retained_verbatim() {
        let matcher = CampaignMatcher::new();
        let result = matcher.match_campaign("Brand Awareness Push", None);
        assert_eq!(result.campaign, "Brand Awareness Push");
        assert_eq!(result.confidence, 0.0);
    }
}
