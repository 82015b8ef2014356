//! Assembly of the server's config.json document

use serde_json::{Map, Value};

use crate::endpoint::{EndpointDeclaration, EndpointDefaults};
use crate::error::Result;

/// Key holding the endpoint list in config.json
pub const ENDPOINTS_KEY: &str = "endpoints";

/// Build the configuration document for one server.
///
/// The endpoint list holds the contribution of every enabled declaration, in
/// declaration order, duplicates included. `global` is merged over it, then
/// `overrides` over that, each a shallow key overwrite.
///
/// The computed endpoint list always wins: an `endpoints` key in `global` or
/// `overrides` is dropped with a warning.
pub fn assemble(
    endpoints: &[EndpointDeclaration],
    defaults: &EndpointDefaults,
    global: &Map<String, Value>,
    overrides: &Map<String, Value>,
) -> Result<Map<String, Value>> {
    let mut contributions = Vec::with_capacity(endpoints.len());
    for endpoint in endpoints {
        match endpoint.contribution(defaults)? {
            Some(contribution) => contributions.push(contribution.to_value()),
            None => log::debug!("skipping disabled {} endpoint", endpoint.kind.name()),
        }
    }

    let mut document = Map::new();
    for (layer, values) in [("global", global), ("server", overrides)] {
        for (key, value) in values {
            if key == ENDPOINTS_KEY {
                log::warn!(
                    "ignoring `{ENDPOINTS_KEY}` in {layer} config; endpoints come from endpoint declarations"
                );
                continue;
            }
            document.insert(key.clone(), value.clone());
        }
    }
    document.insert(ENDPOINTS_KEY.to_string(), Value::Array(contributions));

    Ok(document)
}

/// Serialize a document the way it is written to disk
pub fn render(document: &Map<String, Value>) -> Result<String> {
    let mut text = serde_json::to_string_pretty(document)?;
    text.push('\n');
    Ok(text)
}
