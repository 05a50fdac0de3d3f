//! Server settings loaded via OrthoConfig.

use std::net::SocketAddr;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DATA_DIR: &str = "data";

/// Values controlling where the server listens and stores its documents.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "QUALITY")]
pub struct ServerSettings {
    /// Socket address to bind, e.g. `127.0.0.1:8080`.
    pub bind_addr: Option<String>,
    /// Directory holding the key-value documents.
    pub data_dir: Option<Utf8PathBuf>,
    /// Optional code catalogue replacing the built-in one.
    pub catalog_path: Option<Utf8PathBuf>,
    /// Keep everything in memory instead of under `data_dir`.
    #[ortho_config(default = false)]
    pub ephemeral: bool,
}

impl ServerSettings {
    /// Parse the bind address, falling back to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::ErrorKind::InvalidInput`] for unparsable addresses.
    pub fn bind_addr(&self) -> std::io::Result<SocketAddr> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid bind address '{raw}': {err}"),
            )
        })
    }

    /// The data directory, `./data` unless configured.
    pub fn data_dir(&self) -> &Utf8Path {
        self.data_dir
            .as_deref()
            .unwrap_or_else(|| Utf8Path::new(DEFAULT_DATA_DIR))
    }

    pub fn catalog_path(&self) -> Option<&Utf8Path> {
        self.catalog_path.as_deref()
    }
}
