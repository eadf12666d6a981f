use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use tourlens_common::{
    NoteKind, QualityNote, QualitySeverity, RateConfig, TourlensError,
};

use crate::client::{HttpTransport, Transport};

/// Currency markers observed in the revenue column, mapped to ISO codes.
/// Both symbols and code prefixes appear in the wild.
pub const CURRENCY_ALIASES: &[(&str, &str)] = &[
    ("$", "USD"),
    ("US$", "USD"),
    ("USD", "USD"),
    ("R$", "BRL"),
    ("BRL", "BRL"),
    ("MX$", "MXN"),
    ("MXN", "MXN"),
    ("MXN$", "MXN"),
    ("CA$", "CAD"),
    ("CAD", "CAD"),
    ("C$", "CAD"),
    ("A$", "AUD"),
    ("AUD", "AUD"),
    ("£", "GBP"),
    ("GBP", "GBP"),
    ("€", "EUR"),
    ("EUR", "EUR"),
    ("COP", "COP"),
    ("COP$", "COP"),
    ("CLP", "CLP"),
    ("CLP$", "CLP"),
    ("ARS", "ARS"),
    ("ARS$", "ARS"),
    ("PEN", "PEN"),
    ("PEN$", "PEN"),
    ("S/", "PEN"),
];

/// Resolve a currency marker to an ISO code.
///
/// The hint is whatever non-numeric residue was found around the amount.
/// An empty hint means an unmarked value, which is USD. Returns None for a
/// marker no alias covers.
pub fn detect_currency(hint: &str) -> Option<&'static str> {
    let cleaned: String = hint.split_whitespace().collect::<String>().to_uppercase();
    if cleaned.is_empty() {
        return Some("USD");
    }
    for (alias, code) in CURRENCY_ALIASES {
        if cleaned == alias.to_uppercase() {
            return Some(code);
        }
    }
    // Partial match for markers embedded in other residue ("R$ " etc.)
    for (alias, code) in CURRENCY_ALIASES {
        if cleaned.contains(&alias.to_uppercase()) {
            return Some(code);
        }
    }
    None
}

/// Currency → USD conversion rates for one run.
#[derive(Debug, Clone)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    /// The static reference table used whenever a refresh is unavailable.
    pub fn static_fallback() -> Self {
        let rates = [
            ("USD", 1.0),
            ("BRL", 0.20),
            ("MXN", 0.055),
            ("CAD", 0.74),
            ("AUD", 0.66),
            ("GBP", 1.27),
            ("EUR", 1.08),
            ("COP", 0.00026),
            ("CLP", 0.0011),
            ("ARS", 0.0012),
            ("PEN", 0.27),
        ]
        .into_iter()
        .map(|(code, rate)| (code.to_string(), rate))
        .collect();
        RateTable { rates }
    }

    pub fn from_rates(rates: HashMap<String, f64>) -> Self {
        RateTable { rates }
    }

    pub fn to_usd_rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

/// Fetches refreshed currency → USD rates from the configured source.
pub struct RateClient<T: Transport = HttpTransport> {
    transport: T,
    config: RateConfig,
}

impl RateClient<HttpTransport> {
    pub fn new(config: RateConfig) -> Self {
        RateClient {
            transport: HttpTransport::new(),
            config,
        }
    }
}

impl<T: Transport> RateClient<T> {
    pub fn with_transport(config: RateConfig, transport: T) -> Self {
        RateClient { transport, config }
    }

    /// One refresh attempt against the configured source.
    pub async fn refresh(&self) -> Result<RateTable, TourlensError> {
        let url = self
            .config
            .url
            .as_deref()
            .ok_or_else(|| TourlensError::Rates("no refresh source configured".to_string()))?;

        let deadline = Duration::from_secs(self.config.timeout_secs.max(1));
        let body = tokio::time::timeout(deadline, self.transport.fetch_text(url))
            .await
            .map_err(|_| {
                TourlensError::Rates(format!("timed out after {}s", self.config.timeout_secs))
            })?
            .map_err(|e| TourlensError::Rates(e.to_string()))?;

        let parsed: RatesResponse =
            serde_json::from_str(&body).map_err(|e| TourlensError::Rates(e.to_string()))?;
        Ok(RateTable::from_rates(parsed.rates))
    }

    /// Refresh with one retry, degrading to the static table on failure.
    /// Degradation is reported as a quality note, never an error.
    pub async fn load(&self) -> (RateTable, Option<QualityNote>) {
        if self.config.url.is_none() {
            return (RateTable::static_fallback(), None);
        }

        let err = match self.refresh().await {
            Ok(table) => return (table, None),
            Err(err) => {
                warn!(error = %err, "rate refresh failed, retrying once");
                match self.refresh().await {
                    Ok(table) => return (table, None),
                    Err(err) => err,
                }
            }
        };

        let note = QualityNote::new(
            NoteKind::NetworkDegraded,
            QualitySeverity::Warning,
            format!("exchange rates fell back to the static table: {err}"),
        );
        (RateTable::static_fallback(), Some(note))
    }
}
