//! Driving port for code table and defect-type maintenance.
//!
//! Mutations never fail: blank input and duplicate names are ignored and
//! reported as `false`. Persistence problems are reported as warnings on the
//! returned [`Persisted`] value.

use async_trait::async_trait;

use crate::domain::{DefectTypes, OptionTable, OptionTables, Persisted, RefreshOutcome};

/// Commands that change a model's code tables or defect-type map.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeTableCommand: Send + Sync {
    /// Append `name -> code` to a table. Returns whether it was inserted.
    async fn add_entry(
        &self,
        model_id: &str,
        table: OptionTable,
        name: &str,
        code: &str,
    ) -> Persisted<bool>;

    /// Remove an entry by name. Returns whether one was removed.
    async fn remove_entry(
        &self,
        model_id: &str,
        table: OptionTable,
        name: &str,
    ) -> Persisted<bool>;

    /// Restore the built-in tables and clear stored overrides.
    async fn reset_tables(&self, model_id: &str) -> Persisted<OptionTables>;

    /// Insert or overwrite a defect type within a category.
    async fn add_defect_type(
        &self,
        model_id: &str,
        category: &str,
        name: &str,
        digit: &str,
    ) -> Persisted<bool>;

    /// Remove a defect type from a category.
    async fn remove_defect_type(
        &self,
        model_id: &str,
        category: &str,
        name: &str,
    ) -> Persisted<bool>;

    /// Restore the built-in defect-type map and clear the stored override.
    async fn reset_defect_types(&self, model_id: &str) -> Persisted<DefectTypes>;

    /// Reconcile cached tables with the remote data service.
    async fn refresh(&self, model_id: &str) -> RefreshOutcome;

    /// Drop every stored table and defect-type map of a model.
    async fn purge(&self, model_id: &str) -> Persisted<()>;
}

/// Command fixture that accepts every mutation without storing anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCodeTableCommand;

#[async_trait]
impl CodeTableCommand for FixtureCodeTableCommand {
    async fn add_entry(
        &self,
        _model_id: &str,
        _table: OptionTable,
        _name: &str,
        _code: &str,
    ) -> Persisted<bool> {
        Persisted::clean(true)
    }

    async fn remove_entry(
        &self,
        _model_id: &str,
        _table: OptionTable,
        _name: &str,
    ) -> Persisted<bool> {
        Persisted::clean(true)
    }

    async fn reset_tables(&self, _model_id: &str) -> Persisted<OptionTables> {
        Persisted::clean(OptionTables::default())
    }

    async fn add_defect_type(
        &self,
        _model_id: &str,
        _category: &str,
        _name: &str,
        _digit: &str,
    ) -> Persisted<bool> {
        Persisted::clean(true)
    }

    async fn remove_defect_type(
        &self,
        _model_id: &str,
        _category: &str,
        _name: &str,
    ) -> Persisted<bool> {
        Persisted::clean(true)
    }

    async fn reset_defect_types(&self, _model_id: &str) -> Persisted<DefectTypes> {
        Persisted::clean(DefectTypes::default())
    }

    async fn refresh(&self, _model_id: &str) -> RefreshOutcome {
        RefreshOutcome::Empty
    }

    async fn purge(&self, _model_id: &str) -> Persisted<()> {
        Persisted::clean(())
    }
}
