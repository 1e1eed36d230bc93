//! Module descriptors (`<name>/info.json`).
//!
//! ```json
//! {
//!   "info": {
//!     "name": "shop",
//!     "version": "1.2.0",
//!     "aquilaVersion": ">=1.4.0",
//!     "packageDependencies": { "api": ["lodash@^4.17.0"], "theme": [] },
//!     "moduleDependencies": ["cart"],
//!     "loadApp": true,
//!     "type": "payment"
//!   }
//! }
//! ```

use modkit_deps::PackageDependencies;
use modkit_deps::range::host_compatible;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Lifecycle scripts a module is expected to ship.
pub const LIFECYCLE_SCRIPTS: [&str; 4] = ["init.js", "initAfter.js", "uninit.js", "rgpd.js"];

#[derive(Debug, Deserialize)]
struct DescriptorFile {
    info: Descriptor,
}

/// The `info` block of a module descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cron_names: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mail_type_code: Vec<String>,
    #[serde(default)]
    pub load_app: bool,
    #[serde(default)]
    pub load_translation_back: bool,
    #[serde(default)]
    pub load_translation_front: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub package_dependencies: PackageDependencies,
    #[serde(default, deserialize_with = "null_as_default")]
    pub module_dependencies: Vec<String>,
    #[serde(rename = "component_template_front", default)]
    pub component_template_front: Option<String>,
    /// Ignored on install: recorded files only come from activation.
    #[serde(default, deserialize_with = "null_as_default")]
    pub files: Vec<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Host versions the module accepts.
    #[serde(default)]
    pub aquila_version: Option<String>,
    /// Host version the module was built against.
    #[serde(default)]
    pub version_aquila: Option<String>,
}

impl Descriptor {
    /// Parse descriptor bytes; `source_name` is used in error messages.
    pub fn parse(bytes: &[u8], source_name: &str) -> Result<Self> {
        let file: DescriptorFile =
            serde_json::from_slice(bytes).map_err(|e| Error::ManifestParse {
                source_name: source_name.to_string(),
                reason: e.to_string(),
            })?;

        if file.info.name.trim().is_empty() {
            return Err(Error::ManifestParse {
                source_name: source_name.to_string(),
                reason: "info.name is empty".to_string(),
            });
        }
        Ok(file.info)
    }

    /// Check `aquilaVersion` against the running host.
    ///
    /// A descriptor without a range accepts every host.
    pub fn check_host(&self, host_version: &str) -> Result<()> {
        let Some(required) = self.aquila_version.as_deref() else {
            return Ok(());
        };

        let incompatible = || Error::VersionIncompatible {
            module: self.name.clone(),
            required: required.to_string(),
            host: host_version.to_string(),
        };

        match host_compatible(required, host_version) {
            Ok(true) => Ok(()),
            Ok(false) => Err(incompatible()),
            Err(e) => {
                tracing::warn!(module = %self.name, error = %e, "Unreadable host version range");
                Err(incompatible())
            }
        }
    }
}

/// `null` reads as the empty value.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
