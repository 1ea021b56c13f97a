//! Daemon settings
//!
//! Layered with the `config` crate: struct defaults, then an optional TOML
//! file, then `SWITCHBOARD_*` environment variables (`__` separates sections,
//! e.g. `SWITCHBOARD_SERVER__PORT=8080`).

use anyhow::{Context, Result};
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use switchboard_api_http::{RouteConfig, DEFAULT_MAX_BODY_BYTES};
use switchboard_core::domain::{TypeHierarchy, TypeHierarchyBuilder};

pub const DEFAULT_CONFIG_PATH: &str = "~/.switchboard/switchboard.toml";
pub const CONFIG_PATH_ENV: &str = "SWITCHBOARD_CONFIG";
const ENV_PREFIX: &str = "SWITCHBOARD";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub log: LogConfig,
    pub dispatch: DispatchConfig,
    /// Extra entity types on top of the bundled ones
    pub types: Vec<TypeDeclaration>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Larger request bodies are rejected with 413
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9527,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://~/.switchboard/switchboard.db".to_string(),
        }
    }
}

impl DatabaseConfig {
    /// URL with a leading `~` in the file path expanded
    pub fn resolved_url(&self) -> String {
        match self.url.strip_prefix("sqlite://") {
            Some(path) => format!("sqlite://{}", shellexpand::tilde(path)),
            None => self.url.clone(),
        }
    }

    /// On-disk database file, if the URL names one
    pub fn file_path(&self) -> Option<PathBuf> {
        let resolved = self.resolved_url();
        let path = resolved.strip_prefix("sqlite://")?;
        let path = path.split('?').next().unwrap_or(path);
        if path.is_empty() || path.contains(":memory:") {
            None
        } else {
            Some(PathBuf::from(path))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `pretty` or `json`
    pub format: String,
    /// Daily rolling log files are written here when set
    pub directory: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: "pretty".to_string(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub allow_public_access: bool,
    pub xml_declaration: bool,
    pub json_prefix: String,
    pub xml_prefix: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        let routes = RouteConfig::default();
        Self {
            allow_public_access: true,
            xml_declaration: true,
            json_prefix: routes.json_prefix,
            xml_prefix: routes.xml_prefix,
        }
    }
}

impl DispatchConfig {
    pub fn routes(&self) -> RouteConfig {
        RouteConfig {
            json_prefix: self.json_prefix.clone(),
            xml_prefix: self.xml_prefix.clone(),
        }
    }
}

/// `[[types]]` entry: `name` extends `parent` (default `DataObject`)
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TypeDeclaration {
    pub name: String,
    #[serde(default = "default_parent")]
    pub parent: String,
}

fn default_parent() -> String {
    "DataObject".to_string()
}

impl AppConfig {
    /// Load from `path`, else `SWITCHBOARD_CONFIG`, else the default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => p.to_path_buf(),
            None => std::env::var(CONFIG_PATH_ENV)
                .map(|p| PathBuf::from(shellexpand::tilde(&p).into_owned()))
                .unwrap_or_else(|_| PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).into_owned())),
        };

        // An explicitly named file must exist
        let required = path.is_some();
        let builder = Config::builder()
            .add_source(File::from(file.as_path()).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::from_builder(builder)
            .with_context(|| format!("Failed to load configuration from {}", file.display()))
    }

    fn from_builder(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Bundled `Widget` / `Gadget` types plus the configured ones
    pub fn type_hierarchy(&self) -> Result<TypeHierarchy> {
        let builder: TypeHierarchyBuilder = TypeHierarchy::builder()
            .entity(crate::services::WIDGET_TYPE)
            .declare(crate::services::GADGET_TYPE, crate::services::WIDGET_TYPE);

        let hierarchy = self
            .types
            .iter()
            .fold(builder, |b, t| b.declare(t.name.clone(), t.parent.clone()))
            .build()
            .context("Invalid [[types]] configuration")?;
        Ok(hierarchy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> AppConfig {
        AppConfig::from_builder(
            Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("");
        assert_eq!(config.server.addr(), "127.0.0.1:9527");
        assert_eq!(config.server.max_body_bytes, 1024 * 1024);
        assert_eq!(config.log.format, "pretty");
        assert!(config.log.directory.is_none());
        assert!(config.dispatch.allow_public_access);
        assert!(config.dispatch.xml_declaration);
        assert_eq!(config.dispatch.routes(), RouteConfig::default());
        assert!(config.types.is_empty());
    }

    #[test]
    fn test_file_overrides() {
        let config = from_toml(
            r#"
            [server]
            port = 8080
            max_body_bytes = 4096

            [dispatch]
            allow_public_access = false
            xml_prefix = "xml"

            [[types]]
            name = "Sprocket"
            parent = "Gadget"

            [[types]]
            name = "Page"
            "#,
        );
        assert_eq!(config.server.addr(), "127.0.0.1:8080");
        assert_eq!(config.server.max_body_bytes, 4096);
        assert!(!config.dispatch.allow_public_access);
        assert_eq!(config.dispatch.routes().xml_prefix, "xml");
        assert_eq!(config.dispatch.routes().json_prefix, "jsonservice");
        assert_eq!(config.types[1].parent, "DataObject");

        let types = config.type_hierarchy().unwrap();
        assert!(types.is_a("Sprocket", "Widget"));
        assert!(types.is_entity_type("Page"));
    }

    #[test]
    fn test_undeclared_parent_is_rejected() {
        let config = from_toml(
            r#"
            [[types]]
            name = "Orphan"
            parent = "Nowhere"
            "#,
        );
        assert!(config.type_hierarchy().is_err());
    }

    #[test]
    fn test_database_paths() {
        let file = DatabaseConfig {
            url: "sqlite:///var/lib/switchboard.db?mode=rwc".to_string(),
        };
        assert_eq!(file.file_path(), Some(PathBuf::from("/var/lib/switchboard.db")));

        let memory = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
        };
        assert_eq!(memory.resolved_url(), "sqlite::memory:");
        assert_eq!(memory.file_path(), None);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        assert!(AppConfig::load(Some(Path::new("/nonexistent/switchboard.toml"))).is_err());
    }
}
