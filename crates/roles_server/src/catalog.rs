//! Role catalog — the custom roles this server can grant.
//!
//! Catalogs are JSON documents:
//!
//! ```json
//! {
//!   "roles": [
//!     { "name": "Scout", "base_role": 1, "abilities": ["Speed", "NightVision"], "enable_on_create": true }
//!   ]
//! }
//! ```
//!
//! Ability names are resolved against the server's ability table when the
//! catalog is built.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use roles_ability::AbilityHandle;
use roles_controller::{BaseRoleId, RoleDefinition};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Errors raised while loading or building a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog is not valid JSON for [`CatalogConfig`].
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// A role names an ability the server does not have.
    #[error("role `{role}` uses unknown ability `{ability}`")]
    UnknownAbility { role: String, ability: String },

    /// Two roles share a name.
    #[error("role `{0}` is defined more than once")]
    DuplicateRole(String),
}

/// One role entry in a catalog document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub name: String,
    pub base_role: BaseRoleId,
    pub abilities: Vec<String>,
    /// Keep the role's abilities enabled for the whole match.
    #[serde(default)]
    pub enable_on_create: bool,
}

/// A catalog document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub roles: Vec<RoleSpec>,
}

impl CatalogConfig {
    /// The roles shipped with the server.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            roles: vec![
                RoleSpec {
                    name: "Scout".to_string(),
                    base_role: BaseRoleId(1),
                    abilities: vec!["Speed".to_string(), "NightVision".to_string()],
                    enable_on_create: true,
                },
                RoleSpec {
                    name: "Medic".to_string(),
                    base_role: BaseRoleId(2),
                    abilities: vec!["Regeneration".to_string()],
                    enable_on_create: true,
                },
            ],
        }
    }

    /// Parse a catalog document.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] or [`CatalogError::Parse`].
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

/// Built role definitions, by name.
#[derive(Debug, Default)]
pub struct RoleCatalog {
    roles: HashMap<String, Arc<RoleDefinition>>,
    /// Roles whose abilities stay enabled, in catalog order.
    always_on: Vec<Arc<RoleDefinition>>,
}

impl RoleCatalog {
    /// Build every role in `config`.
    ///
    /// `lookup` resolves ability names; `on_attach` becomes each role's
    /// post-attach hook and receives the role name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownAbility`] or
    /// [`CatalogError::DuplicateRole`].
    pub fn build<L, H>(config: &CatalogConfig, lookup: L, on_attach: H) -> Result<Self, CatalogError>
    where
        L: Fn(&str) -> Option<Arc<dyn AbilityHandle>>,
        H: Fn(&str, roles_ability::PlayerId) + Clone + Send + Sync + 'static,
    {
        let mut catalog = Self::default();
        for spec in &config.roles {
            if catalog.roles.contains_key(&spec.name) {
                return Err(CatalogError::DuplicateRole(spec.name.clone()));
            }

            let abilities = spec
                .abilities
                .iter()
                .map(|name| {
                    lookup(name).ok_or_else(|| CatalogError::UnknownAbility {
                        role: spec.name.clone(),
                        ability: name.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let hook = on_attach.clone();
            let role_name = spec.name.clone();
            let role = RoleDefinition::builder(spec.name.clone(), spec.base_role)
                .abilities(abilities)
                .on_attach(move |player| hook(&role_name, player))
                .enable_abilities(spec.enable_on_create)
                .build();

            if spec.enable_on_create {
                catalog.always_on.push(Arc::clone(&role));
            }
            catalog.roles.insert(spec.name.clone(), role);
        }
        info!(roles = catalog.roles.len(), "role catalog built");
        Ok(catalog)
    }

    /// Returns the role called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<RoleDefinition>> {
        self.roles.get(name)
    }

    /// Returns every role name, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.roles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Enable the abilities of every always-on role again, for example after
    /// a bulk disable. Returns the number of abilities enabled.
    pub fn reenable(&self) -> usize {
        let mut enabled = 0;
        for role in &self.always_on {
            for ability in role.abilities() {
                if !ability.is_enabled() {
                    ability.enable();
                    enabled += 1;
                }
            }
        }
        enabled
    }
}
