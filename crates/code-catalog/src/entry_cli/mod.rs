//! CLI support for adding entries to a code catalogue file.
//!
//! The binary delegates to these functions so the update flow can be
//! exercised in tests without spawning a subprocess.

mod error;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs::Dir};
use clap::Parser;

use crate::catalog::{CatalogEntry, CatalogTable, CodeCatalog};

pub use error::CliError;

/// Command-line arguments for `code-catalog-entry`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "code-catalog-entry",
    about = "Add a process, part, defect cause or worker to a code catalogue"
)]
pub struct Args {
    /// Path to the catalogue JSON file.
    #[arg(long)]
    pub catalog: Utf8PathBuf,
    /// Model identifier, e.g. ICH-3000.
    #[arg(long)]
    pub model: String,
    /// Table to extend: processes, parts, defectCauses or workers.
    #[arg(long)]
    pub table: CatalogTable,
    /// Entry name.
    #[arg(long)]
    pub name: String,
    /// Entry code.
    #[arg(long)]
    pub code: String,
}

/// Result of adding an entry to the catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    /// Model that received the entry.
    pub model: String,
    /// Table that received the entry.
    pub table: CatalogTable,
    /// The stored entry, trimmed.
    pub entry: CatalogEntry,
}

/// Applies the update described by `args` and rewrites the catalogue file.
///
/// # Errors
///
/// Returns [`CliError`] when the catalogue cannot be read, the entry is
/// rejected, or the file cannot be rewritten.
///
/// # Example
///
/// ```no_run
/// use clap::Parser;
/// use code_catalog::entry_cli::{Args, apply_update};
///
/// let args = Args::parse_from([
///     "code-catalog-entry",
///     "--catalog", "catalog.json",
///     "--model", "ICH-3000",
///     "--table", "workers",
///     "--name", "신입",
///     "--code", "W011",
/// ]);
/// let update = apply_update(&args).expect("apply update");
/// assert_eq!(update.entry.code, "W011");
/// ```
pub fn apply_update(args: &Args) -> Result<Update, CliError> {
    let (dir, file_name) = open_parent(&args.catalog)?;
    let catalog = CodeCatalog::from_file(&dir, file_name)?;
    let entry = CatalogEntry::new(args.name.trim(), args.code.trim());
    let updated = catalog.append_entry(&args.model, args.table, entry.clone())?;

    updated.write_to_file(&dir, file_name)?;

    Ok(Update {
        model: args.model.clone(),
        table: args.table,
        entry,
    })
}

/// Formats the success message emitted by the CLI.
///
/// # Example
///
/// ```
/// use camino::Utf8Path;
/// use code_catalog::entry_cli::{Update, success_message};
/// use code_catalog::{CatalogEntry, CatalogTable};
///
/// let update = Update {
///     model: "ICH-3000".to_owned(),
///     table: CatalogTable::Parts,
///     entry: CatalogEntry::new("필터 하우징", "702"),
/// };
/// let message = success_message(&update, Utf8Path::new("catalog.json"));
///
/// assert!(message.contains("필터 하우징"));
/// ```
#[must_use]
pub fn success_message(update: &Update, catalog_path: &Utf8Path) -> String {
    format!(
        "Added {} \"{}\" (code={}) to model {} in {}",
        update.table, update.entry.name, update.entry.code, update.model, catalog_path
    )
}

fn open_parent(path: &Utf8Path) -> Result<(Dir, &Utf8Path), CliError> {
    let file_name = path
        .file_name()
        .map(Utf8Path::new)
        .ok_or_else(|| CliError::InvalidCatalogPath {
            path: path.to_path_buf(),
        })?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|err| {
        CliError::OpenDirectory {
            path: parent.to_path_buf(),
            message: err.to_string(),
        }
    })?;
    Ok((dir, file_name))
}

#[cfg(test)]
mod tests;
