use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::debug;

use tourlens_common::{
    config::RESULT_INDICATOR_ALIASES, AliasConfig, CanonicalField, FieldKind, NormalizedRow,
    NormalizedTable, NoteKind, QualityNote, QualitySeverity, RawTable, Value,
};

/// Collapse a header to its comparison form: lowercase, alphanumerics only.
/// "Amount Spent (USD)" and "amount_spent_usd" both become "amountspentusd".
pub fn normalize_header(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Maps arbitrary source headers onto the canonical schema.
///
/// Built once per run from the injected alias table. When two canonical
/// fields claim the same header variant, the first configured entry wins,
/// deterministically, regardless of input order.
pub struct Normalizer {
    lookup: HashMap<String, CanonicalField>,
}

impl Normalizer {
    pub fn new(aliases: &AliasConfig) -> Self {
        let mut lookup = HashMap::new();
        for (field, variants) in &aliases.entries {
            for variant in variants {
                lookup.entry(normalize_header(variant)).or_insert(*field);
            }
        }
        Normalizer { lookup }
    }

    /// Produce a normalized table from a raw one.
    ///
    /// Unknown columns are dropped with a low-severity note. Cell values are
    /// coerced per the field's declared kind: empty cells stay missing
    /// (numeric missing reads as zero downstream, date missing propagates as
    /// unknown), and a non-empty cell that fails coercion defaults to zero
    /// and is recorded as a type violation, never raised.
    pub fn normalize(&self, raw: &RawTable) -> NormalizedTable {
        let mut table = NormalizedTable {
            source_name: raw.source_name.clone(),
            ..Default::default()
        };
        let mut dropped: HashSet<String> = HashSet::new();

        for record in &raw.rows {
            let mut row = NormalizedRow::new();
            let mut claimed: HashSet<CanonicalField> = HashSet::new();

            for (header, value) in &record.cells {
                let Some(&field) = self.lookup.get(&normalize_header(header)) else {
                    if dropped.insert(header.clone()) {
                        debug!(column = header.as_str(), "dropping unknown column");
                        table.notes.push(QualityNote::for_field(
                            NoteKind::DroppedColumn,
                            QualitySeverity::Info,
                            header.clone(),
                            format!("column '{header}' matches no canonical field"),
                        ));
                    }
                    continue;
                };
                // Two source columns resolving to one canonical field:
                // keep the first, deterministically.
                if !claimed.insert(field) {
                    continue;
                }
                table.add_column(field);

                match coerce(field, value) {
                    Coerced::Value(v) => {
                        row.insert(field, v);
                    }
                    Coerced::Missing => {}
                    Coerced::Violation => {
                        table.notes.push(QualityNote::for_field(
                            NoteKind::CoercionDefaulted,
                            QualitySeverity::Info,
                            field.to_string(),
                            format!("value '{value}' failed {} coercion", kind_name(field.kind())),
                        ));
                        // Numeric failures default to zero; date failures
                        // stay unknown rather than pinning a sentinel date.
                        if field.kind() == FieldKind::Number {
                            row.insert(field, Value::Number(0.0));
                        }
                    }
                }
            }
            table.rows.push(row);
        }
        table
    }
}

enum Coerced {
    Value(Value),
    Missing,
    Violation,
}

fn kind_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Number => "numeric",
        FieldKind::Date => "date",
        FieldKind::Text => "text",
    }
}

fn coerce(field: CanonicalField, raw: &str) -> Coerced {
    let text = raw.trim();
    if text.is_empty() {
        return Coerced::Missing;
    }
    match field.kind() {
        FieldKind::Text => Coerced::Value(Value::Text(text.to_string())),
        FieldKind::Number => match coerce_number(text) {
            Some(n) => Coerced::Value(Value::Number(n)),
            None => Coerced::Violation,
        },
        FieldKind::Date => match coerce_date(text) {
            Some(d) => Coerced::Value(Value::Date(d)),
            None => Coerced::Violation,
        },
    }
}

/// Strip currency symbols, thousands separators, percent signs, and
/// whitespace before parsing.
fn coerce_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '%' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

fn coerce_date(text: &str) -> Option<NaiveDate> {
    const FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%b %d, %Y"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Copy `results` into the funnel field its result indicator names.
///
/// Exports that report a single "Results" column qualify it with a result
/// indicator; without this remap the funnel columns would read as missing.
pub fn apply_result_indicators(table: &mut NormalizedTable) {
    if !table.has_column(CanonicalField::ResultIndicator)
        || !table.has_column(CanonicalField::Results)
    {
        return;
    }

    let mut touched: Vec<CanonicalField> = Vec::new();
    for row in &mut table.rows {
        let Some(indicator) = row
            .get(&CanonicalField::ResultIndicator)
            .and_then(Value::as_text)
            .map(|s| s.trim().to_lowercase())
        else {
            continue;
        };
        let Some(results) = row.get(&CanonicalField::Results).and_then(Value::as_number) else {
            continue;
        };
        for (alias, target) in RESULT_INDICATOR_ALIASES {
            if indicator == *alias {
                row.insert(*target, Value::Number(results));
                if !touched.contains(target) {
                    touched.push(*target);
                }
                break;
            }
        }
    }
    for field in touched {
        table.add_column(field);
    }
}
