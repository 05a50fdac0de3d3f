//! Unit tests for the catalogue entry CLI helpers.
#![expect(
    clippy::expect_used,
    reason = "test code uses expect for clear failure messages"
)]

use camino::Utf8PathBuf;
use rstest::{fixture, rstest};

use super::*;
use crate::error::CatalogError;

const CATALOG_JSON: &str = r#"{
    "version": 1,
    "models": [
        {
            "id": "ICH-3000",
            "productCode": "C03",
            "workers": [{"name": "김철수", "code": "W001"}]
        }
    ]
}"#;

struct CatalogFixture {
    _dir: tempfile::TempDir,
    path: Utf8PathBuf,
}

impl CatalogFixture {
    fn load(&self) -> CodeCatalog {
        let (dir, file_name) = open_parent(&self.path).expect("open parent");
        CodeCatalog::from_file(&dir, file_name).expect("load catalogue")
    }
}

#[fixture]
fn catalog_fixture() -> CatalogFixture {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("catalog.json")).expect("utf-8 path");
    std::fs::write(&path, CATALOG_JSON).expect("write catalogue");
    CatalogFixture { _dir: dir, path }
}

fn args_for(path: &Utf8Path, table: &str, name: &str, code: &str) -> Args {
    Args::try_parse_from([
        "code-catalog-entry",
        "--catalog",
        path.as_str(),
        "--model",
        "ICH-3000",
        "--table",
        table,
        "--name",
        name,
        "--code",
        code,
    ])
    .expect("parse args")
}

#[rstest]
fn parse_rejects_unknown_table() {
    let result = Args::try_parse_from([
        "code-catalog-entry",
        "--catalog",
        "catalog.json",
        "--model",
        "ICH-3000",
        "--table",
        "gadgets",
        "--name",
        "x",
        "--code",
        "1",
    ]);

    assert!(result.is_err());
}

#[rstest]
fn parse_requires_catalog_path() {
    let result = Args::try_parse_from(["code-catalog-entry", "--model", "ICH-3000"]);
    assert!(result.is_err());
}

#[rstest]
fn apply_update_appends_entry(catalog_fixture: CatalogFixture) {
    let args = args_for(&catalog_fixture.path, "workers", " 이영희 ", "W002");

    let update = apply_update(&args).expect("apply update");

    assert_eq!(update.entry, CatalogEntry::new("이영희", "W002"));
    let reloaded = catalog_fixture.load();
    let workers = reloaded
        .find_model("ICH-3000")
        .expect("model")
        .table(CatalogTable::Workers)
        .to_vec();
    assert_eq!(
        workers,
        vec![
            CatalogEntry::new("김철수", "W001"),
            CatalogEntry::new("이영희", "W002"),
        ]
    );
}

#[rstest]
fn apply_update_rejects_duplicate_names(catalog_fixture: CatalogFixture) {
    let args = args_for(&catalog_fixture.path, "workers", "김철수", "W009");

    let err = apply_update(&args).expect_err("duplicate");

    assert!(matches!(
        err,
        CliError::Catalog {
            source: CatalogError::DuplicateEntry { .. }
        }
    ));
}

#[rstest]
fn apply_update_reports_unknown_model(catalog_fixture: CatalogFixture) {
    let mut args = args_for(&catalog_fixture.path, "parts", "필터", "701");
    args.model = "EP-7000".to_owned();

    let err = apply_update(&args).expect_err("unknown model");

    assert_eq!(
        err,
        CliError::Catalog {
            source: CatalogError::ModelNotFound {
                id: "EP-7000".to_owned()
            }
        }
    );
}

#[rstest]
fn success_message_names_table_and_model() {
    let update = Update {
        model: "EP-7000".to_owned(),
        table: CatalogTable::DefectCauses,
        entry: CatalogEntry::new("포장불량", "DC04"),
    };

    let message = success_message(&update, Utf8Path::new("catalog.json"));

    assert_eq!(
        message,
        "Added defectCauses \"포장불량\" (code=DC04) to model EP-7000 in catalog.json"
    );
}
