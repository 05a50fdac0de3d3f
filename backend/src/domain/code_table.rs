//! Name-to-code lookup tables kept per product model.
//!
//! Each model owns four tables: processes, parts, defect causes and workers.
//! A table is an ordered list of [`CodeEntry`] values whose names are unique
//! within the table; codes may repeat so that spelling variants of one part
//! share a code.

use std::fmt;
use std::str::FromStr;

use code_catalog::{CatalogEntry, CatalogTable, ModelDefaults};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One `name -> code` association.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct CodeEntry {
    /// Human-readable label, unique within its table.
    #[schema(example = "솔밸브-온수")]
    pub name: String,
    /// Short code contributed to defect codes.
    #[schema(example = "501")]
    pub code: String,
}

impl CodeEntry {
    /// Build an entry from any string-like name and code.
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

impl From<&CatalogEntry> for CodeEntry {
    fn from(entry: &CatalogEntry) -> Self {
        Self::new(entry.name.as_str(), entry.code.as_str())
    }
}

/// Identifies one of the four per-model tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum OptionTable {
    /// Manufacturing stages.
    Processes,
    /// Components.
    Parts,
    /// Root-cause categories.
    DefectCauses,
    /// Line operators.
    Workers,
}

impl OptionTable {
    /// All tables in canonical order.
    pub const ALL: [Self; 4] = [
        Self::Processes,
        Self::Parts,
        Self::DefectCauses,
        Self::Workers,
    ];

    /// The camelCase table name used in snapshots and URLs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processes => "processes",
            Self::Parts => "parts",
            Self::DefectCauses => "defectCauses",
            Self::Workers => "workers",
        }
    }

    /// The singular `option_type` value used by remote option rows.
    #[must_use]
    pub const fn row_type(self) -> &'static str {
        match self {
            Self::Processes => "process",
            Self::Parts => "part",
            Self::DefectCauses => "defect_cause",
            Self::Workers => "worker",
        }
    }

    /// Resolve a remote `option_type` value.
    #[must_use]
    pub fn from_row_type(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|table| table.row_type() == value)
    }

    const fn catalog_table(self) -> CatalogTable {
        match self {
            Self::Processes => CatalogTable::Processes,
            Self::Parts => CatalogTable::Parts,
            Self::DefectCauses => CatalogTable::DefectCauses,
            Self::Workers => CatalogTable::Workers,
        }
    }
}

impl fmt::Display for OptionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a table name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown option table '{0}'")]
pub struct UnknownOptionTable(pub String);

impl FromStr for OptionTable {
    type Err = UnknownOptionTable;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "processes" => Ok(Self::Processes),
            "parts" => Ok(Self::Parts),
            "defectCauses" | "defect-causes" => Ok(Self::DefectCauses),
            "workers" => Ok(Self::Workers),
            other => Err(UnknownOptionTable(other.to_owned())),
        }
    }
}

/// Ordered table of entries with unique names.
///
/// Mutations never fail: blank input and duplicate names are ignored and
/// reported through the boolean return value.
///
/// # Examples
/// ```
/// use quality_backend::domain::CodeTable;
///
/// let mut table = CodeTable::default();
/// assert!(table.insert(" 필터 ", "701"));
/// assert!(!table.insert("필터", "702"));
/// assert_eq!(table.code_for("필터"), Some("701"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CodeTable(Vec<CodeEntry>);

impl CodeTable {
    /// Build a table from entries, keeping the first entry of any repeated
    /// name.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = CodeEntry>) -> Self {
        let mut table = Self::default();
        for entry in entries {
            if !table.contains(&entry.name) {
                table.0.push(entry);
            }
        }
        table
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[CodeEntry] {
        &self.0
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether an entry with exactly this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|entry| entry.name == name)
    }

    /// Append an entry unless the trimmed name or code is blank or the name
    /// already exists. Returns whether the entry was inserted.
    pub fn insert(&mut self, name: &str, code: &str) -> bool {
        let name = name.trim();
        let code = code.trim();
        if name.is_empty() || code.is_empty() || self.contains(name) {
            return false;
        }
        self.0.push(CodeEntry::new(name, code));
        true
    }

    /// Remove the entry with this exact name. Returns whether one was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|entry| entry.name != name);
        self.0.len() != before
    }

    /// Code of the entry whose name matches exactly.
    #[must_use]
    pub fn code_for(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.code.as_str())
    }

    /// Code of the first entry whose name contains `name` or is contained in
    /// it, scanning in table order. An empty `name` matches the first entry.
    #[must_use]
    pub fn code_by_containment(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|entry| name.contains(entry.name.as_str()) || entry.name.contains(name))
            .map(|entry| entry.code.as_str())
    }
}

impl FromIterator<CodeEntry> for CodeTable {
    fn from_iter<I: IntoIterator<Item = CodeEntry>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

/// The four tables of one model.
///
/// Serialises to the local snapshot shape
/// `{processes, parts, defectCauses, workers}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptionTables {
    /// Process table.
    #[serde(default)]
    pub processes: CodeTable,
    /// Part table.
    #[serde(default)]
    pub parts: CodeTable,
    /// Defect cause table.
    #[serde(default)]
    pub defect_causes: CodeTable,
    /// Worker table.
    #[serde(default)]
    pub workers: CodeTable,
}

impl OptionTables {
    /// Copy the built-in tables of a catalogue model.
    #[must_use]
    pub fn from_defaults(defaults: &ModelDefaults) -> Self {
        let copy = |table: OptionTable| {
            defaults
                .table(table.catalog_table())
                .iter()
                .map(CodeEntry::from)
                .collect::<CodeTable>()
        };
        Self {
            processes: copy(OptionTable::Processes),
            parts: copy(OptionTable::Parts),
            defect_causes: copy(OptionTable::DefectCauses),
            workers: copy(OptionTable::Workers),
        }
    }

    /// Borrow one table.
    #[must_use]
    pub const fn table(&self, table: OptionTable) -> &CodeTable {
        match table {
            OptionTable::Processes => &self.processes,
            OptionTable::Parts => &self.parts,
            OptionTable::DefectCauses => &self.defect_causes,
            OptionTable::Workers => &self.workers,
        }
    }

    /// Mutably borrow one table.
    pub const fn table_mut(&mut self, table: OptionTable) -> &mut CodeTable {
        match table {
            OptionTable::Processes => &mut self.processes,
            OptionTable::Parts => &mut self.parts,
            OptionTable::DefectCauses => &mut self.defect_causes,
            OptionTable::Workers => &mut self.workers,
        }
    }

    /// Whether all four tables are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        OptionTable::ALL
            .into_iter()
            .all(|table| self.table(table).is_empty())
    }
}
