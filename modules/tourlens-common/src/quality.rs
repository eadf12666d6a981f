use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// --- Severity ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualitySeverity {
    Info,
    Warning,
    Critical,
}

impl Default for QualitySeverity {
    fn default() -> Self {
        QualitySeverity::Info
    }
}

impl std::fmt::Display for QualitySeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualitySeverity::Info => write!(f, "info"),
            QualitySeverity::Warning => write!(f, "warning"),
            QualitySeverity::Critical => write!(f, "critical"),
        }
    }
}

// --- Notes ---

/// The recoverable states the pipeline records instead of raising.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    /// A source column matched no canonical field and was dropped.
    DroppedColumn,
    /// A value failed type coercion and was defaulted.
    CoercionDefaulted,
    /// Two pattern extractors resolved one campaign to different valid ids.
    AmbiguousMatch,
    /// Multiple feed rows claimed the same event id; latest report won.
    SnapshotConflict,
    /// A network fetch failed and a cached/static value was used instead.
    NetworkDegraded,
    /// A feed row did not fit any known row shape and was skipped.
    UnrecognizedRow,
}

/// A single non-fatal diagnostic attached to a table or feed parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityNote {
    pub kind: NoteKind,
    pub severity: QualitySeverity,
    pub field: Option<String>,
    pub message: String,
}

impl QualityNote {
    pub fn new(kind: NoteKind, severity: QualitySeverity, message: impl Into<String>) -> Self {
        QualityNote {
            kind,
            severity,
            field: None,
            message: message.into(),
        }
    }

    pub fn for_field(
        kind: NoteKind,
        severity: QualitySeverity,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        QualityNote {
            kind,
            severity,
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

// --- Per-source report ---

/// Which source a quality report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    AdExport,
    TicketFeed,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::AdExport => write!(f, "ad_export"),
            SourceKind::TicketFeed => write!(f, "ticket_feed"),
        }
    }
}

/// Diagnostics for one field of one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldQuality {
    pub missing: u32,
    pub rows: u32,
    pub type_violations: u32,
    pub severity: QualitySeverity,
}

impl FieldQuality {
    pub fn missing_rate(&self) -> f64 {
        if self.rows == 0 {
            return 0.0;
        }
        f64::from(self.missing) / f64::from(self.rows)
    }
}

/// Structured diagnostics for one source. Advisory only: a report never
/// aborts the pipeline; callers decide what to surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub source: SourceKind,
    pub rows: u32,
    pub fields: BTreeMap<String, FieldQuality>,
    pub notes: Vec<QualityNote>,
    pub severity: QualitySeverity,
}

impl QualityReport {
    pub fn new(source: SourceKind, rows: u32) -> Self {
        QualityReport {
            source,
            rows,
            fields: BTreeMap::new(),
            notes: Vec::new(),
            severity: QualitySeverity::Info,
        }
    }

    /// Worst severity across fields and notes.
    pub fn overall(&self) -> QualitySeverity {
        self.fields
            .values()
            .map(|f| f.severity)
            .chain(self.notes.iter().map(|n| n.severity))
            .max()
            .unwrap_or(QualitySeverity::Info)
    }
}
