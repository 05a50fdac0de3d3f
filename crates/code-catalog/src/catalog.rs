//! Code catalogue types and JSON parsing.
//!
//! A catalogue lists, per product model, the default code tables (processes,
//! parts, defect causes, workers) and the per-category defect-type digit map.
//! Table order and map key order are significant: code resolution falls back
//! to the first matching entry in declaration order.

use std::fmt;
use std::str::FromStr;

use camino::Utf8Path;
use cap_std::fs::Dir;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::atomic_io::write_atomic;
use crate::error::CatalogError;

/// Current supported catalogue version.
const SUPPORTED_VERSION: u32 = 1;

const BUILTIN_JSON: &str = include_str!("../data/builtin.json");

/// Category digit mapped to an ordered `defect type name -> digit` map.
pub type DefectTypeMap = IndexMap<String, IndexMap<String, String>>;

/// One of the four name-to-code tables kept per model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogTable {
    /// Manufacturing stages, coded with a single letter.
    Processes,
    /// Components, coded with three digits.
    Parts,
    /// Root-cause categories.
    DefectCauses,
    /// Line operators.
    Workers,
}

impl CatalogTable {
    /// All tables in their canonical order.
    pub const ALL: [Self; 4] = [
        Self::Processes,
        Self::Parts,
        Self::DefectCauses,
        Self::Workers,
    ];

    /// The camelCase name used in catalogue documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processes => "processes",
            Self::Parts => "parts",
            Self::DefectCauses => "defectCauses",
            Self::Workers => "workers",
        }
    }
}

impl fmt::Display for CatalogTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogTable {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "processes" => Ok(Self::Processes),
            "parts" => Ok(Self::Parts),
            "defectCauses" | "defect-causes" | "defect_causes" => Ok(Self::DefectCauses),
            "workers" => Ok(Self::Workers),
            other => Err(CatalogError::UnknownTable {
                value: other.to_owned(),
            }),
        }
    }
}

/// A name and its short code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Human-readable label, unique within its table.
    pub name: String,
    /// Short code contributed to defect codes.
    pub code: String,
}

impl CatalogEntry {
    /// Builds an entry from any string-like name and code.
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

/// Default tables for one product model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDefaults {
    id: String,
    label: String,
    product_code: String,
    processes: Vec<CatalogEntry>,
    parts: Vec<CatalogEntry>,
    defect_causes: Vec<CatalogEntry>,
    workers: Vec<CatalogEntry>,
    defect_types: DefectTypeMap,
}

impl ModelDefaults {
    /// Model identifier, e.g. `ICH-3000`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Product code prefix, e.g. `C03`.
    #[must_use]
    pub fn product_code(&self) -> &str {
        &self.product_code
    }

    /// Entries of one table in declaration order.
    #[must_use]
    pub fn table(&self, table: CatalogTable) -> &[CatalogEntry] {
        match table {
            CatalogTable::Processes => &self.processes,
            CatalogTable::Parts => &self.parts,
            CatalogTable::DefectCauses => &self.defect_causes,
            CatalogTable::Workers => &self.workers,
        }
    }

    /// Defect-type digit maps keyed by category digit.
    #[must_use]
    pub const fn defect_types(&self) -> &DefectTypeMap {
        &self.defect_types
    }

    const fn table_mut(&mut self, table: CatalogTable) -> &mut Vec<CatalogEntry> {
        match table {
            CatalogTable::Processes => &mut self.processes,
            CatalogTable::Parts => &mut self.parts,
            CatalogTable::DefectCauses => &mut self.defect_causes,
            CatalogTable::Workers => &mut self.workers,
        }
    }
}

/// A versioned set of per-model defaults.
///
/// # Example
///
/// ```
/// use code_catalog::{CatalogTable, CodeCatalog};
///
/// let catalog = CodeCatalog::builtin();
/// let ich = catalog.find_model("ICH-3000").expect("built-in model");
///
/// assert_eq!(ich.product_code(), "C03");
/// assert!(ich.table(CatalogTable::Parts).iter().any(|entry| entry.name == "필터"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeCatalog {
    version: u32,
    models: Vec<ModelDefaults>,
}

impl CodeCatalog {
    /// Parses a catalogue from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the JSON is malformed, the version is
    /// unsupported, no models are declared, a model id repeats, or a table
    /// holds a blank or repeated entry.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json).map_err(|e| CatalogError::ParseError {
            message: e.to_string(),
        })?;

        Self::from_raw(raw)
    }

    /// Loads a catalogue file relative to `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the file cannot be read or parsed.
    pub fn from_file(dir: &Dir, path: &Utf8Path) -> Result<Self, CatalogError> {
        let contents = dir
            .read_to_string(path)
            .map_err(|e| CatalogError::IoError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Self::from_json(&contents)
    }

    /// The catalogue compiled into the crate: `ICH-3000` and `EP-7000`.
    ///
    /// # Panics
    ///
    /// Panics if the embedded document is invalid, which the crate's tests
    /// rule out.
    #[must_use]
    pub fn builtin() -> Self {
        match Self::from_json(BUILTIN_JSON) {
            Ok(catalog) => catalog,
            Err(err) => panic!("built-in catalogue must parse: {err}"),
        }
    }

    fn from_raw(raw: RawCatalog) -> Result<Self, CatalogError> {
        if raw.version != SUPPORTED_VERSION {
            return Err(CatalogError::UnsupportedVersion {
                expected: SUPPORTED_VERSION,
                actual: raw.version,
            });
        }
        if raw.models.is_empty() {
            return Err(CatalogError::EmptyModels);
        }

        let mut models: Vec<ModelDefaults> = Vec::with_capacity(raw.models.len());
        for (index, raw_model) in raw.models.into_iter().enumerate() {
            let model = ModelDefaults::try_from_raw(index, raw_model)?;
            if models.iter().any(|existing| existing.id == model.id) {
                return Err(CatalogError::DuplicateModel { id: model.id });
            }
            models.push(model);
        }

        Ok(Self {
            version: raw.version,
            models,
        })
    }

    /// Returns the catalogue version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// All models in declaration order.
    #[must_use]
    pub fn models(&self) -> &[ModelDefaults] {
        &self.models
    }

    /// Finds a model by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ModelNotFound`] when no model has that id.
    pub fn find_model(&self, id: &str) -> Result<&ModelDefaults, CatalogError> {
        self.models
            .iter()
            .find(|model| model.id == id)
            .ok_or_else(|| CatalogError::ModelNotFound { id: id.to_owned() })
    }

    /// Defaults for `id`, or the first declared model when `id` is unknown.
    #[must_use]
    pub fn defaults_for(&self, id: &str) -> &ModelDefaults {
        self.find_model(id).unwrap_or_else(|_| self.first_model())
    }

    #[expect(
        clippy::unreachable,
        reason = "parsing rejects catalogues without models"
    )]
    fn first_model(&self) -> &ModelDefaults {
        match self.models.first() {
            Some(model) => model,
            None => unreachable!("catalogue always holds at least one model"),
        }
    }

    /// Returns a copy of the catalogue with `entry` appended to a model table.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ModelNotFound`] for an unknown model,
    /// [`CatalogError::BlankEntry`] for an empty name or code, and
    /// [`CatalogError::DuplicateEntry`] when the name already exists.
    pub fn append_entry(
        &self,
        model_id: &str,
        table: CatalogTable,
        entry: CatalogEntry,
    ) -> Result<Self, CatalogError> {
        let mut updated = self.clone();
        let model = updated
            .models
            .iter_mut()
            .find(|model| model.id == model_id)
            .ok_or_else(|| CatalogError::ModelNotFound {
                id: model_id.to_owned(),
            })?;
        let entry = CatalogEntry::new(entry.name.trim(), entry.code.trim());
        validate_entry(&model.id, table, &entry)?;
        let entries = model.table_mut(table);
        if entries.iter().any(|existing| existing.name == entry.name) {
            return Err(CatalogError::DuplicateEntry {
                model: model_id.to_owned(),
                table: table.to_string(),
                name: entry.name,
            });
        }
        entries.push(entry);
        Ok(updated)
    }

    /// Serialises the catalogue as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ParseError`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let raw = RawCatalog::from(self);
        serde_json::to_string_pretty(&raw)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(|e| CatalogError::ParseError {
                message: e.to_string(),
            })
    }

    /// Writes the catalogue atomically to `path` inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::WriteError`] if the file cannot be written.
    pub fn write_to_file(&self, dir: &Dir, path: &Utf8Path) -> Result<(), CatalogError> {
        let json = self.to_json()?;
        write_atomic(dir, path, &json)
    }
}

impl ModelDefaults {
    fn try_from_raw(index: usize, raw: RawModel) -> Result<Self, CatalogError> {
        let id = raw.id.trim().to_owned();
        if id.is_empty() {
            return Err(CatalogError::InvalidModel {
                index,
                message: "id must not be empty".to_owned(),
            });
        }
        let product_code = raw.product_code.trim().to_uppercase();
        if product_code.is_empty() {
            return Err(CatalogError::InvalidModel {
                index,
                message: "productCode must not be empty".to_owned(),
            });
        }
        let label = raw
            .label
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| id.clone());

        let model = Self {
            id,
            label,
            product_code,
            processes: raw.processes,
            parts: raw.parts,
            defect_causes: raw.defect_causes,
            workers: raw.workers,
            defect_types: raw.defect_types,
        };
        for table in CatalogTable::ALL {
            validate_table(&model.id, table, model.table(table))?;
        }
        Ok(model)
    }
}

fn validate_table(
    model: &str,
    table: CatalogTable,
    entries: &[CatalogEntry],
) -> Result<(), CatalogError> {
    for (position, entry) in entries.iter().enumerate() {
        validate_entry(model, table, entry)?;
        if entries
            .iter()
            .take(position)
            .any(|other| other.name == entry.name)
        {
            return Err(CatalogError::DuplicateEntry {
                model: model.to_owned(),
                table: table.to_string(),
                name: entry.name.clone(),
            });
        }
    }
    Ok(())
}

fn validate_entry(
    model: &str,
    table: CatalogTable,
    entry: &CatalogEntry,
) -> Result<(), CatalogError> {
    let blank = if entry.name.trim().is_empty() {
        Some("name")
    } else if entry.code.trim().is_empty() {
        Some("code")
    } else {
        None
    };
    match blank {
        Some(field) => Err(CatalogError::BlankEntry {
            model: model.to_owned(),
            table: table.to_string(),
            field,
        }),
        None => Ok(()),
    }
}

/// Raw JSON representation of a catalogue.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct RawCatalog {
    version: u32,
    models: Vec<RawModel>,
}

/// Raw JSON representation of one model.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct RawModel {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    product_code: String,
    #[serde(default)]
    processes: Vec<CatalogEntry>,
    #[serde(default)]
    parts: Vec<CatalogEntry>,
    #[serde(default)]
    defect_causes: Vec<CatalogEntry>,
    #[serde(default)]
    workers: Vec<CatalogEntry>,
    #[serde(default)]
    defect_types: DefectTypeMap,
}

impl From<&CodeCatalog> for RawCatalog {
    fn from(catalog: &CodeCatalog) -> Self {
        Self {
            version: catalog.version,
            models: catalog
                .models
                .iter()
                .map(|model| RawModel {
                    id: model.id.clone(),
                    label: Some(model.label.clone()),
                    product_code: model.product_code.clone(),
                    processes: model.processes.clone(),
                    parts: model.parts.clone(),
                    defect_causes: model.defect_causes.clone(),
                    workers: model.workers.clone(),
                    defect_types: model.defect_types.clone(),
                })
                .collect(),
        }
    }
}
