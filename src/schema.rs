//! Settings file schema
//!
//! The settings file is the process-wide attribute namespace: `[defaults]`
//! supplies every server attribute that a `[[server]]` entry leaves unset.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use apiconfig::{ChefClient, DEFAULT_COMMUNITY_URL, EndpointDeclaration, EndpointKind};

use crate::paths;

// ============================================================================
// Main Settings Schema
// ============================================================================

/// The complete settings file
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Process-wide defaults for every server
    #[serde(default)]
    pub defaults: Defaults,

    /// Local chef client credentials, used by auto-discovered endpoints
    #[serde(default)]
    pub chef: Option<ChefClient>,

    /// Declared servers
    #[serde(default, rename = "server")]
    pub servers: Vec<ServerEntry>,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read settings file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid settings file: {}", path.display()))
    }

    /// Parse settings from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content).context("Invalid TOML format")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        let mut seen: Vec<PathBuf> = Vec::new();
        for server in &self.servers {
            if server.path.as_os_str().is_empty() {
                bail!("Server path cannot be empty");
            }
            let path = paths::expand_path(&server.path);
            if seen.contains(&path) {
                bail!("Server {} is declared more than once", path.display());
            }
            seen.push(path);
        }
        Ok(())
    }

    /// Find a server by path, comparing both sides after expansion
    pub fn find_server(&self, path: &Path) -> Option<&ServerEntry> {
        let wanted = paths::expand_path(path);
        self.servers
            .iter()
            .find(|s| paths::expand_path(&s.path) == wanted)
    }
}

// ============================================================================
// Defaults - the process-wide attribute namespace
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_account")]
    pub user: String,

    #[serde(default = "default_account")]
    pub group: String,

    #[serde(default = "default_ruby_version")]
    pub ruby_version: String,

    #[serde(default = "default_install_path")]
    pub install_path: PathBuf,

    #[serde(default = "default_community_url")]
    pub community_url: String,

    /// Administrative account owning config.json
    #[serde(default = "default_config_owner")]
    pub config_owner: String,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    #[serde(default = "default_source_repository")]
    pub source_repository: String,

    #[serde(default = "default_rbenv_root")]
    pub rbenv_root: PathBuf,

    /// Directory receiving the systemd unit
    #[serde(default = "default_unit_dir")]
    pub unit_dir: PathBuf,

    /// Global config.json overrides, merged under each server's own
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            version: default_version(),
            port: default_port(),
            user: default_account(),
            group: default_account(),
            ruby_version: default_ruby_version(),
            install_path: default_install_path(),
            community_url: default_community_url(),
            config_owner: default_config_owner(),
            service_name: default_service_name(),
            source_repository: default_source_repository(),
            rbenv_root: default_rbenv_root(),
            unit_dir: default_unit_dir(),
            config: Map::new(),
        }
    }
}

fn default_version() -> String {
    "2.2.0".to_string()
}

fn default_port() -> u16 {
    26200
}

fn default_account() -> String {
    "berkshelf".to_string()
}

fn default_ruby_version() -> String {
    "2.3.1".to_string()
}

fn default_install_path() -> PathBuf {
    PathBuf::from("/opt/berkshelf-api")
}

fn default_community_url() -> String {
    DEFAULT_COMMUNITY_URL.to_string()
}

fn default_config_owner() -> String {
    "root".to_string()
}

fn default_service_name() -> String {
    "berks-api".to_string()
}

fn default_source_repository() -> String {
    "https://github.com/berkshelf/berkshelf-api.git".to_string()
}

fn default_rbenv_root() -> PathBuf {
    PathBuf::from("/opt/rbenv")
}

fn default_unit_dir() -> PathBuf {
    PathBuf::from("/etc/systemd/system")
}

// ============================================================================
// Server entries
// ============================================================================

/// One declared server; unset attributes fall back to `[defaults]`
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ServerEntry {
    pub path: PathBuf,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub group: Option<String>,

    #[serde(default)]
    pub ruby_version: Option<String>,

    #[serde(default)]
    pub install_path: Option<PathBuf>,

    #[serde(default)]
    pub service_name: Option<String>,

    #[serde(default)]
    pub config: Map<String, Value>,

    #[serde(default, rename = "endpoint")]
    pub endpoints: Vec<EndpointEntry>,
}

/// Endpoint variant as written in the settings file
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EndpointType {
    Community,
    ChefServer,
    Github,
    AutoChefServer,
}

/// One `[[server.endpoint]]` table
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct EndpointEntry {
    #[serde(rename = "type")]
    pub endpoint_type: EndpointType,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub client_name: Option<String>,

    #[serde(default)]
    pub client_key: Option<String>,

    #[serde(default)]
    pub organization: Option<String>,

    #[serde(default)]
    pub access_token: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl EndpointEntry {
    /// Convert to a declaration; parameters a variant needs must be present
    pub fn to_declaration(&self) -> Result<EndpointDeclaration> {
        let field = |value: &Option<String>, name: &'static str| -> Result<String> {
            value.clone().ok_or_else(|| {
                apiconfig::Error::MissingField {
                    kind: self.kind_name(),
                    field: name,
                }
                .into()
            })
        };

        let kind = match self.endpoint_type {
            EndpointType::Community => EndpointKind::Community {
                url: self.url.clone().unwrap_or_default(),
            },
            EndpointType::ChefServer => EndpointKind::ChefServer {
                url: field(&self.url, "url")?,
                client_name: field(&self.client_name, "client_name")?,
                client_key: field(&self.client_key, "client_key")?,
            },
            EndpointType::Github => EndpointKind::Github {
                organization: field(&self.organization, "organization")?,
                access_token: self.access_token.clone().unwrap_or_default(),
            },
            EndpointType::AutoChefServer => EndpointKind::AutoChefServer,
        };

        Ok(EndpointDeclaration::new(kind).with_enabled(self.enabled))
    }

    fn kind_name(&self) -> &'static str {
        match self.endpoint_type {
            EndpointType::Community => "community",
            EndpointType::ChefServer => "chef_server",
            EndpointType::Github => "github",
            EndpointType::AutoChefServer => "auto_chef_server",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
