//! Per-model defect-type digit maps.
//!
//! The map is keyed by part major category (the first character of a part
//! code). Each category holds an ordered `defect name -> digit` map whose
//! declaration order decides ties during code resolution.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Ordered defect names and digits for one major category.
pub type CategoryDefects = IndexMap<String, String>;

/// Defect-type digit maps keyed by major category.
///
/// # Examples
/// ```
/// use quality_backend::domain::DefectTypes;
///
/// let mut types = DefectTypes::default();
/// types.upsert("5", "누수", "2");
/// assert_eq!(types.digit_for("5", "온수 누수 발생"), Some("2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object, example = json!({"5": {"누수": "2", "이물질": "3"}}))]
pub struct DefectTypes(IndexMap<String, CategoryDefects>);

impl DefectTypes {
    /// Wrap an ordered category map.
    #[must_use]
    pub const fn new(map: IndexMap<String, CategoryDefects>) -> Self {
        Self(map)
    }

    /// Borrow the underlying map.
    #[must_use]
    pub const fn as_map(&self) -> &IndexMap<String, CategoryDefects> {
        &self.0
    }

    /// Defect map of one category.
    #[must_use]
    pub fn category(&self, category: &str) -> Option<&CategoryDefects> {
        self.0.get(category)
    }

    /// Digit of the first declared defect name contained in `description`.
    #[must_use]
    pub fn digit_for(&self, category: &str, description: &str) -> Option<&str> {
        self.category(category)?
            .iter()
            .find(|(name, _)| description.contains(name.as_str()))
            .map(|(_, digit)| digit.as_str())
    }

    /// Defect names of one category in declaration order.
    #[must_use]
    pub fn names_for(&self, category: &str) -> Vec<String> {
        self.category(category)
            .map(|defects| defects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Insert or overwrite a defect name. Existing names keep their position.
    ///
    /// Returns `false` when any trimmed argument is blank.
    pub fn upsert(&mut self, category: &str, name: &str, digit: &str) -> bool {
        let (category, name, digit) = (category.trim(), name.trim(), digit.trim());
        if category.is_empty() || name.is_empty() || digit.is_empty() {
            return false;
        }
        self.0
            .entry(category.to_owned())
            .or_default()
            .insert(name.to_owned(), digit.to_owned());
        true
    }

    /// Remove a defect name, preserving the order of the others.
    pub fn remove(&mut self, category: &str, name: &str) -> bool {
        self.0
            .get_mut(category)
            .and_then(|defects| defects.shift_remove(name))
            .is_some()
    }
}

impl From<&code_catalog::DefectTypeMap> for DefectTypes {
    fn from(map: &code_catalog::DefectTypeMap) -> Self {
        Self(map.clone())
    }
}
