//! Server descriptors
//!
//! A descriptor is a declared server with every attribute resolved against
//! the process-wide defaults. Resolution happens once, when the descriptor is
//! built; nothing downstream consults the settings again.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use apiconfig::{EndpointDeclaration, EndpointDefaults};

use crate::paths;
use crate::schema::{ServerEntry, Settings};

/// Name of the config file inside a server's path
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Name of the application binary
pub const SERVER_BINARY: &str = "berks-api";

/// Gem that provides the application
pub const SERVER_GEM: &str = "berkshelf-api";

/// A fully resolved server declaration
#[derive(Debug, Clone)]
pub struct ServerDescriptor {
    pub path: PathBuf,
    pub version: String,
    pub port: u16,
    pub user: String,
    pub group: String,
    pub ruby_version: String,
    pub install_path: PathBuf,
    pub install_from_source: bool,
    pub service_name: String,
    pub config_owner: String,
    pub source_repository: String,
    pub rbenv_root: PathBuf,
    pub unit_dir: PathBuf,
    /// Process-wide config.json defaults
    pub global_config: Map<String, Value>,
    /// This server's config.json overrides
    pub config: Map<String, Value>,
    pub endpoints: Vec<EndpointDeclaration>,
    pub endpoint_defaults: EndpointDefaults,
}

impl ServerDescriptor {
    /// Resolve a server entry against the settings it was declared in
    pub fn resolve(entry: &ServerEntry, settings: &Settings) -> Result<Self> {
        let defaults = &settings.defaults;
        let version = entry
            .version
            .clone()
            .unwrap_or_else(|| defaults.version.clone());

        let endpoints = entry
            .endpoints
            .iter()
            .enumerate()
            .map(|(i, e)| {
                e.to_declaration()
                    .with_context(|| format!("Invalid endpoint #{}", i + 1))
            })
            .collect::<Result<Vec<_>>>()?;

        let descriptor = Self {
            path: paths::expand_path(&entry.path),
            install_from_source: apiconfig::install_from_source(&version),
            version,
            port: entry.port.unwrap_or(defaults.port),
            user: entry.user.clone().unwrap_or_else(|| defaults.user.clone()),
            group: entry.group.clone().unwrap_or_else(|| defaults.group.clone()),
            ruby_version: entry
                .ruby_version
                .clone()
                .unwrap_or_else(|| defaults.ruby_version.clone()),
            install_path: paths::expand_path(
                entry
                    .install_path
                    .as_deref()
                    .unwrap_or(&defaults.install_path),
            ),
            service_name: entry
                .service_name
                .clone()
                .unwrap_or_else(|| defaults.service_name.clone()),
            config_owner: defaults.config_owner.clone(),
            source_repository: defaults.source_repository.clone(),
            rbenv_root: paths::expand_path(&defaults.rbenv_root),
            unit_dir: paths::expand_path(&defaults.unit_dir),
            global_config: defaults.config.clone(),
            config: entry.config.clone(),
            endpoints,
            endpoint_defaults: EndpointDefaults {
                community_url: defaults.community_url.clone(),
                chef: settings.chef.clone(),
            },
        };

        descriptor
            .validate()
            .with_context(|| format!("Invalid server {}", entry.path.display()))?;
        Ok(descriptor)
    }

    /// Resolve every declared server, or only the one at `only`
    pub fn resolve_all(settings: &Settings, only: Option<&Path>) -> Result<Vec<Self>> {
        let entries: Vec<&ServerEntry> = match only {
            Some(path) => vec![
                settings
                    .find_server(path)
                    .with_context(|| format!("No server declared at {}", path.display()))?,
            ],
            None => settings.servers.iter().collect(),
        };
        entries
            .into_iter()
            .map(|entry| Self::resolve(entry, settings))
            .collect()
    }

    /// Validate invariants that settings parsing cannot express
    pub fn validate(&self) -> Result<()> {
        if self.config_owner == self.user {
            bail!(
                "config.json owner '{}' must not be the service account",
                self.config_owner
            );
        }
        if self.user.is_empty() || self.group.is_empty() {
            bail!("Service user and group cannot be empty");
        }
        if self.port == 0 {
            bail!("Port must be non-zero");
        }
        for endpoint in &self.endpoints {
            endpoint.validate(&self.endpoint_defaults)?;
        }
        Ok(())
    }

    /// Path of the assembled config file
    pub fn config_path(&self) -> PathBuf {
        self.path.join(CONFIG_FILE_NAME)
    }

    /// Assemble the config.json document for this server
    pub fn assemble_config(&self) -> Result<Map<String, Value>> {
        apiconfig::assemble(
            &self.endpoints,
            &self.endpoint_defaults,
            &self.global_config,
            &self.config,
        )
        .context("Failed to assemble server configuration")
    }

    /// Rendered config.json contents
    pub fn render_config(&self) -> Result<String> {
        let document = self.assemble_config()?;
        Ok(apiconfig::render(&document)?)
    }

    /// Command the service runs: a vendored binstub for source installs,
    /// otherwise the bare binary resolved through the runtime's path
    pub fn server_binary(&self) -> String {
        if self.install_from_source {
            self.install_path
                .join("vendor")
                .join("bin")
                .join(SERVER_BINARY)
                .to_string_lossy()
                .to_string()
        } else {
            SERVER_BINARY.to_string()
        }
    }

    /// Working directory of the service
    pub fn working_dir(&self) -> &Path {
        if self.install_from_source {
            &self.install_path
        } else {
            &self.path
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(toml: &str) -> Settings {
        Settings::parse(toml).unwrap()
    }

    #[test]
    fn test_defaults_fill_unset_attributes() {
        let settings = settings(
            r#"
[defaults]
port = 9000
user = "berks"
group = "berks"

[[server]]
path = "/srv/berks"
user = "api"
"#,
        );
        let server = ServerDescriptor::resolve(&settings.servers[0], &settings).unwrap();

        assert_eq!(server.port, 9000);
        assert_eq!(server.user, "api");
        assert_eq!(server.group, "berks");
        assert_eq!(server.version, "2.2.0");
        assert!(!server.install_from_source);
        assert_eq!(server.config_path(), PathBuf::from("/srv/berks/config.json"));
    }

    #[test]
    fn test_git_ref_installs_from_source() {
        let settings = settings(
            r#"
[[server]]
path = "/srv/berks"
version = "master"
install_path = "/opt/berks-src"
"#,
        );
        let server = ServerDescriptor::resolve(&settings.servers[0], &settings).unwrap();

        assert!(server.install_from_source);
        assert_eq!(server.server_binary(), "/opt/berks-src/vendor/bin/berks-api");
        assert_eq!(server.working_dir(), Path::new("/opt/berks-src"));
    }

    #[test]
    fn test_release_uses_bare_binary() {
        let settings = settings("[[server]]\npath = \"/srv/berks\"\nversion = \"3.1.2\"\n");
        let server = ServerDescriptor::resolve(&settings.servers[0], &settings).unwrap();
        assert_eq!(server.server_binary(), "berks-api");
    }

    #[test]
    fn test_service_account_cannot_own_config() {
        let settings = settings(
            r#"
[defaults]
config_owner = "berkshelf"

[[server]]
path = "/srv/berks"
"#,
        );
        let err = ServerDescriptor::resolve(&settings.servers[0], &settings).unwrap_err();
        assert!(format!("{err:#}").contains("must not be the service account"));
    }

    #[test]
    fn test_auto_endpoint_requires_chef_settings() {
        let settings = settings(
            r#"
[[server]]
path = "/srv/berks"

[[server.endpoint]]
type = "auto_chef_server"
"#,
        );
        assert!(ServerDescriptor::resolve(&settings.servers[0], &settings).is_err());
    }

    #[test]
    fn test_assembled_config_merges_layers() {
        let settings = settings(
            r#"
[defaults.config]
build_interval = 5.0
home_path = "/global"

[[server]]
path = "/srv/berks"

[server.config]
home_path = "/srv/berks"

[[server.endpoint]]
type = "community"
url = "https://cookbooks.internal"

[[server.endpoint]]
type = "github"
organization = "acme"
enabled = false
"#,
        );
        let server = ServerDescriptor::resolve(&settings.servers[0], &settings).unwrap();
        let doc = Value::Object(server.assemble_config().unwrap());

        assert_eq!(
            doc,
            json!({
                "build_interval": 5.0,
                "home_path": "/srv/berks",
                "endpoints": [
                    {"type": "opscode", "options": {"url": "https://cookbooks.internal"}}
                ]
            })
        );
    }

    #[test]
    fn test_resolve_all_filters_by_path() {
        let settings = settings(
            r#"
[[server]]
path = "/srv/a"
service_name = "berks-a"

[[server]]
path = "/srv/b"
service_name = "berks-b"
"#,
        );
        let all = ServerDescriptor::resolve_all(&settings, None).unwrap();
        assert_eq!(all.len(), 2);

        let only = ServerDescriptor::resolve_all(&settings, Some(Path::new("/srv/b"))).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].service_name, "berks-b");

        assert!(ServerDescriptor::resolve_all(&settings, Some(Path::new("/srv/c"))).is_err());
    }

    #[test]
    fn test_home_relative_paths_resolve_alike() {
        let home = dirs::home_dir().unwrap();
        let settings = settings(
            r#"
[defaults]
install_path = "~/berks-src"

[[server]]
path = "~/berks"
"#,
        );

        let by_expanded = ServerDescriptor::resolve_all(&settings, Some(&home.join("berks"))).unwrap();
        assert_eq!(by_expanded.len(), 1);
        assert_eq!(by_expanded[0].path, home.join("berks"));
        assert_eq!(by_expanded[0].install_path, home.join("berks-src"));

        let by_literal = ServerDescriptor::resolve_all(&settings, Some(Path::new("~/berks"))).unwrap();
        assert_eq!(by_literal[0].path, by_expanded[0].path);
    }
}
