//! Rota server wiring: configuration loading and application assembly.
//!
//! The binary in `main.rs` is a thin shell over this module so the assembled
//! router can be exercised in tests.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use rota_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ROTA_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "0.0.0.0".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("rota.db") }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       default_host(),
      port:       default_port(),
      store_path: default_store_path(),
    }
  }
}

impl ServerConfig {
  /// `host:port`, ready for binding.
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Layer the optional TOML file at `path` under `ROTA_*` environment
/// variables. A missing file is not an error.
pub fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  let mut cfg: ServerConfig = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("ROTA"))
    .build()?
    .try_deserialize()?;
  cfg.store_path = expand_tilde(&cfg.store_path);
  Ok(cfg)
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application ──────────────────────────────────────────────────────────────

/// The full HTTP application: API routes wrapped in per-request tracing.
pub fn app(store: SqliteStore) -> Router {
  rota_api::api_router(Arc::new(store)).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::fs;

  use axum::{body::Body, http::Request};
  use tower::ServiceExt as _;

  use super::*;

  fn temp_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir()
      .join(format!("rota-{name}-{}.toml", std::process::id()));
    fs::write(&path, contents).unwrap();
    path
  }

  #[test]
  fn missing_file_yields_defaults() {
    let cfg = load_config(Path::new("/nonexistent/rota.toml")).unwrap();
    assert_eq!(cfg, ServerConfig::default());
    assert_eq!(cfg.address(), "0.0.0.0:8080");
  }

  #[test]
  fn file_values_override_defaults() {
    let path = temp_config("override", "port = 9090\nstore_path = \"/var/lib/rota.db\"\n");
    let cfg = load_config(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(cfg.host, "0.0.0.0");
    assert_eq!(cfg.port, 9090);
    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/rota.db"));
  }

  #[test]
  fn bad_port_is_rejected() {
    let path = temp_config("bad-port", "port = \"eighty\"\n");
    let result = load_config(&path);
    fs::remove_file(&path).ok();
    assert!(result.is_err());
  }

  #[test]
  fn tilde_expands_only_as_prefix() {
    let plain = Path::new("data/rota.db");
    assert_eq!(expand_tilde(plain), plain);
    let odd = Path::new("data/~/rota.db");
    assert_eq!(expand_tilde(odd), odd);

    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(
        expand_tilde(Path::new("~/rota.db")),
        PathBuf::from(home).join("rota.db")
      );
    }
  }

  #[tokio::test]
  async fn app_serves_health() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app(store).oneshot(req).await.unwrap();
    assert!(resp.status().is_success());

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
  }
}
