//! Endpoint declarations
//!
//! An endpoint is an upstream source the API server indexes cookbooks from.
//! Each declaration belongs to exactly one server and, while enabled,
//! contributes one `{"type": ..., "options": {...}}` record to the server's
//! `endpoints` list.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Community site used when a community endpoint is declared without a URL
pub const DEFAULT_COMMUNITY_URL: &str = "https://supermarket.chef.io";

/// Credentials of the local chef client, used by auto-discovered endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChefClient {
    pub server_url: String,
    pub node_name: String,
    pub client_key: String,
}

/// Process-wide values an endpoint may fall back on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDefaults {
    pub community_url: String,
    pub chef: Option<ChefClient>,
}

impl Default for EndpointDefaults {
    fn default() -> Self {
        Self {
            community_url: DEFAULT_COMMUNITY_URL.to_string(),
            chef: None,
        }
    }
}

/// The variant of an endpoint and its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointKind {
    /// Opscode/Supermarket style community index
    Community { url: String },
    /// A private Chef Server
    ChefServer {
        url: String,
        client_name: String,
        client_key: String,
    },
    /// A GitHub organization whose repositories are cookbooks
    Github {
        organization: String,
        access_token: String,
    },
    /// The Chef Server this machine's own chef client talks to
    AutoChefServer,
}

impl EndpointKind {
    /// Short name used in messages and diffs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Community { .. } => "community",
            Self::ChefServer { .. } => "chef_server",
            Self::Github { .. } => "github",
            Self::AutoChefServer => "auto_chef_server",
        }
    }
}

/// One contribution to the `endpoints` list of config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    #[serde(rename = "type")]
    pub kind: String,
    pub options: Map<String, Value>,
}

impl Contribution {
    fn new(kind: &str, options: &[(&str, &str)]) -> Self {
        Self {
            kind: kind.to_string(),
            options: options
                .iter()
                .map(|(k, v)| ((*k).to_string(), Value::String((*v).to_string())))
                .collect(),
        }
    }

    /// The contribution as a JSON value
    pub fn to_value(&self) -> Value {
        let mut record = Map::new();
        record.insert("type".to_string(), Value::String(self.kind.clone()));
        record.insert("options".to_string(), Value::Object(self.options.clone()));
        Value::Object(record)
    }
}

/// A declared endpoint, enabled unless explicitly disabled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDeclaration {
    pub kind: EndpointKind,
    pub enabled: bool,
}

impl EndpointDeclaration {
    pub fn new(kind: EndpointKind) -> Self {
        Self {
            kind,
            enabled: true,
        }
    }

    /// A community endpoint; an empty URL means the process-wide default
    pub fn community(url: impl Into<String>) -> Self {
        Self::new(EndpointKind::Community { url: url.into() })
    }

    pub fn chef_server(
        url: impl Into<String>,
        client_name: impl Into<String>,
        client_key: impl Into<String>,
    ) -> Self {
        Self::new(EndpointKind::ChefServer {
            url: url.into(),
            client_name: client_name.into(),
            client_key: client_key.into(),
        })
    }

    pub fn github(organization: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self::new(EndpointKind::Github {
            organization: organization.into(),
            access_token: access_token.into(),
        })
    }

    pub fn auto_chef_server() -> Self {
        Self::new(EndpointKind::AutoChefServer)
    }

    /// Mark this declaration disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set the enabled state
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check that the declaration can produce a contribution
    pub fn validate(&self, defaults: &EndpointDefaults) -> Result<()> {
        self.resolve(defaults).map(|_| ())
    }

    /// The record this endpoint adds to `endpoints`, or `None` when disabled
    pub fn contribution(&self, defaults: &EndpointDefaults) -> Result<Option<Contribution>> {
        if !self.enabled {
            return Ok(None);
        }
        self.resolve(defaults).map(Some)
    }

    fn resolve(&self, defaults: &EndpointDefaults) -> Result<Contribution> {
        let kind = self.kind.name();
        match &self.kind {
            EndpointKind::Community { url } => {
                let url = if url.is_empty() {
                    defaults.community_url.as_str()
                } else {
                    url.as_str()
                };
                Ok(Contribution::new("opscode", &[("url", url)]))
            }
            EndpointKind::ChefServer {
                url,
                client_name,
                client_key,
            } => {
                require(kind, "url", url)?;
                require(kind, "client_name", client_name)?;
                require(kind, "client_key", client_key)?;
                Ok(Contribution::new(
                    "chef_server",
                    &[
                        ("url", url.as_str()),
                        ("client_name", client_name.as_str()),
                        ("client_key", client_key.as_str()),
                    ],
                ))
            }
            EndpointKind::Github {
                organization,
                access_token,
            } => {
                require(kind, "organization", organization)?;
                Ok(Contribution::new(
                    "github",
                    &[
                        ("organization", organization.as_str()),
                        ("access_token", access_token.as_str()),
                    ],
                ))
            }
            EndpointKind::AutoChefServer => {
                let chef = defaults.chef.as_ref().ok_or(Error::MissingChefClient)?;
                Ok(Contribution::new(
                    "chef_server",
                    &[
                        ("url", chef.server_url.as_str()),
                        ("client_name", chef.node_name.as_str()),
                        ("client_key", chef.client_key.as_str()),
                    ],
                ))
            }
        }
    }
}

fn require(kind: &'static str, field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::MissingField { kind, field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chef_defaults() -> EndpointDefaults {
        EndpointDefaults {
            community_url: DEFAULT_COMMUNITY_URL.to_string(),
            chef: Some(ChefClient {
                server_url: "https://chef.example.com/organizations/acme".into(),
                node_name: "berks-node".into(),
                client_key: "/etc/chef/client.pem".into(),
            }),
        }
    }

    #[test]
    fn test_enabled_by_default() {
        assert!(EndpointDeclaration::community("").enabled);
        assert!(!EndpointDeclaration::community("").disabled().enabled);
    }

    #[test]
    fn test_disabled_contributes_nothing() {
        let endpoint = EndpointDeclaration::github("acme", "token").disabled();
        assert_eq!(
            endpoint.contribution(&EndpointDefaults::default()).unwrap(),
            None
        );
    }

    #[test]
    fn test_community_falls_back_to_default_url() {
        let contribution = EndpointDeclaration::community("")
            .contribution(&EndpointDefaults::default())
            .unwrap()
            .unwrap();
        assert_eq!(
            contribution.to_value(),
            json!({"type": "opscode", "options": {"url": DEFAULT_COMMUNITY_URL}})
        );
    }

    #[test]
    fn test_community_explicit_url() {
        let contribution = EndpointDeclaration::community("https://cookbooks.internal")
            .contribution(&EndpointDefaults::default())
            .unwrap()
            .unwrap();
        assert_eq!(contribution.options["url"], "https://cookbooks.internal");
    }

    #[test]
    fn test_chef_server_contribution() {
        let contribution =
            EndpointDeclaration::chef_server("https://chef.internal", "berks", "/etc/berks.pem")
                .contribution(&EndpointDefaults::default())
                .unwrap()
                .unwrap();
        assert_eq!(
            contribution.to_value(),
            json!({
                "type": "chef_server",
                "options": {
                    "url": "https://chef.internal",
                    "client_name": "berks",
                    "client_key": "/etc/berks.pem"
                }
            })
        );
    }

    #[test]
    fn test_chef_server_requires_client_key() {
        let err = EndpointDeclaration::chef_server("https://chef.internal", "berks", "")
            .validate(&EndpointDefaults::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingField {
                kind: "chef_server",
                field: "client_key"
            }
        ));
    }

    #[test]
    fn test_github_contribution() {
        let contribution = EndpointDeclaration::github("acme-cookbooks", "s3cret")
            .contribution(&EndpointDefaults::default())
            .unwrap()
            .unwrap();
        assert_eq!(contribution.kind, "github");
        assert_eq!(contribution.options["organization"], "acme-cookbooks");
        assert_eq!(contribution.options["access_token"], "s3cret");
    }

    #[test]
    fn test_auto_chef_server_uses_client_settings() {
        let contribution = EndpointDeclaration::auto_chef_server()
            .contribution(&chef_defaults())
            .unwrap()
            .unwrap();
        assert_eq!(contribution.kind, "chef_server");
        assert_eq!(contribution.options["client_name"], "berks-node");
        assert_eq!(
            contribution.options["url"],
            "https://chef.example.com/organizations/acme"
        );
    }

    #[test]
    fn test_auto_chef_server_without_client_fails() {
        let err = EndpointDeclaration::auto_chef_server()
            .validate(&EndpointDefaults::default())
            .unwrap_err();
        assert!(matches!(err, Error::MissingChefClient));
    }

    #[test]
    fn test_disabled_auto_chef_server_needs_no_client() {
        let endpoint = EndpointDeclaration::auto_chef_server().disabled();
        assert_eq!(
            endpoint.contribution(&EndpointDefaults::default()).unwrap(),
            None
        );
    }
}
