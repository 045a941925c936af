use std::path::Path;

use serde::de::DeserializeOwned;

use crate::event::SocialEvent;
use crate::playbook::BrandPlaybook;
use crate::ConfigError;

/// Load a normalized social event from a JSON or YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, or if the
/// event has an empty `id`.
pub fn load_event_file(path: &Path) -> Result<SocialEvent, ConfigError> {
    let event: SocialEvent = load_document(path)?;
    if event.id.trim().is_empty() {
        return Err(ConfigError::InvalidFixture {
            path: path.display().to_string(),
            reason: "event id must not be empty".to_string(),
        });
    }
    Ok(event)
}

/// Load a brand playbook from a JSON or YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, or if the
/// playbook has no brand name or a non-positive version.
pub fn load_playbook_file(path: &Path) -> Result<BrandPlaybook, ConfigError> {
    let playbook: BrandPlaybook = load_document(path)?;
    if playbook.brand_identity.name.trim().is_empty() {
        return Err(ConfigError::InvalidFixture {
            path: path.display().to_string(),
            reason: "brandIdentity.name must not be empty".to_string(),
        });
    }
    if playbook.version < 1 {
        return Err(ConfigError::InvalidFixture {
            path: path.display().to_string(),
            reason: format!("version must be positive, got {}", playbook.version),
        });
    }
    Ok(playbook)
}

fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FixtureIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).map_err(|e| ConfigError::FixtureParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    } else {
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FixtureParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
