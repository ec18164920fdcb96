//! Registry configuration (YAML)
//!
//! ```yaml
//! commit_policy: copy_on_write
//! layout:
//!   course_offset: 15
//!   label_row: 0
//!   name_columns:
//!     - { position: 3, name: Nombre }
//!     - { position: 4, name: Primer Apellido }
//!     - { position: 5, name: Segundo Apellido }
//! ```
//!
//! Every field is optional; the defaults describe the standard registry.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::core::commit::CommitPolicy;
use crate::core::schema::{PositionalLayout, SchemaAdapter};
use crate::error::{RegistryError, RegistryResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub layout: PositionalLayout,
    pub commit_policy: CommitPolicy,
}

impl RegistryConfig {
    pub fn from_yaml_str(yaml: &str) -> RegistryResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| RegistryError::Config(e.to_string()))
    }

    pub fn from_yaml_file(path: &Path) -> RegistryResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| RegistryError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load `path` when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> RegistryResult<Self> {
        match path {
            Some(p) => Self::from_yaml_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn adapter(&self) -> Arc<dyn SchemaAdapter> {
        Arc::new(self.layout.clone())
    }
}
