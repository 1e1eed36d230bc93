//! The module registry record.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use modkit_deps::{PackageDependencies, Requester};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::descriptor::Descriptor;

/// A module as stored in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Assigned on first install and kept across re-installs.
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    /// `<modules>/<name>/`
    pub path: PathBuf,
    /// Archive copy kept next to the module directory.
    pub archive: PathBuf,
    /// `sha256:<hex>` of the installed archive.
    #[serde(default)]
    pub checksum: String,
    #[serde(default)]
    pub active: bool,
    /// Paths created by activation, removed again on deactivation.
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub package_dependencies: PackageDependencies,
    #[serde(default)]
    pub module_dependencies: Vec<String>,
    #[serde(default)]
    pub cron_names: Vec<String>,
    #[serde(default)]
    pub mail_type_code: Vec<String>,
    #[serde(default)]
    pub load_app: bool,
    #[serde(default)]
    pub load_translation_back: bool,
    #[serde(default)]
    pub load_translation_front: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_template_front: Option<String>,
    /// Tag added to injected front-end components.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Host versions the module accepts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_range: Option<String>,
    /// Host version the module was built against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_version: Option<String>,
    #[serde(default = "empty_config")]
    pub config: serde_json::Value,
    pub installed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn empty_config() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Module {
    /// A fresh, inactive record for a newly installed module.
    pub fn from_descriptor(
        descriptor: &Descriptor,
        path: PathBuf,
        archive: PathBuf,
        checksum: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: descriptor.name.clone(),
            version: descriptor.version.clone(),
            description: descriptor.description.clone(),
            url: descriptor.url.clone(),
            path,
            archive,
            checksum,
            active: false,
            files: Vec::new(),
            package_dependencies: descriptor.package_dependencies.clone(),
            module_dependencies: descriptor.module_dependencies.clone(),
            cron_names: descriptor.cron_names.clone(),
            mail_type_code: descriptor.mail_type_code.clone(),
            load_app: descriptor.load_app,
            load_translation_back: descriptor.load_translation_back,
            load_translation_front: descriptor.load_translation_front,
            component_template_front: descriptor.component_template_front.clone(),
            kind: descriptor.kind.clone(),
            host_range: descriptor.aquila_version.clone(),
            host_version: descriptor.version_aquila.clone(),
            config: empty_config(),
            installed_at: now,
            updated_at: now,
        }
    }

    /// Merge a re-installed record into this one.
    ///
    /// Descriptor metadata and on-disk locations come from `fresh`; the
    /// identity, activation state, recorded files, configuration and
    /// install time stay.
    pub fn reinstall(self, fresh: Module) -> Module {
        Module {
            id: self.id,
            active: self.active,
            files: self.files,
            config: self.config,
            installed_at: self.installed_at,
            updated_at: Utc::now(),
            ..fresh
        }
    }

    pub fn requester(&self) -> Requester<'_> {
        Requester::new(&self.name, &self.package_dependencies)
    }

    pub fn theme_components_dir(&self) -> PathBuf {
        self.path.join("theme_components")
    }

    pub fn script(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn owns_file(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f == path)
    }
}

/// Filter for [`crate::registry::ModuleStore::find`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleQuery {
    pub name: Option<String>,
    pub active: Option<bool>,
}

impl ModuleQuery {
    /// Every module.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn active() -> Self {
        Self {
            active: Some(true),
            ..Self::default()
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, module: &Module) -> bool {
        self.name.as_ref().is_none_or(|n| *n == module.name)
            && self.active.is_none_or(|a| a == module.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, version: &str) -> Descriptor {
        Descriptor::parse(
            format!(r#"{{"info": {{"name": "{name}", "version": "{version}"}}}}"#).as_bytes(),
            "info.json",
        )
        .unwrap()
    }

    #[test]
    fn reinstall_keeps_identity_and_state() {
        let mut original = Module::from_descriptor(
            &descriptor("shop", "1.0.0"),
            PathBuf::from("modules/shop"),
            PathBuf::from("modules/shop.zip"),
            "sha256:aaa".into(),
        );
        original.active = true;
        original.files = vec![PathBuf::from("backoffice/app/shop")];
        original.config = serde_json::json!({"currency": "EUR"});

        let fresh = Module::from_descriptor(
            &descriptor("shop", "1.1.0"),
            PathBuf::from("modules/shop"),
            PathBuf::from("modules/shop.zip"),
            "sha256:bbb".into(),
        );
        let merged = original.clone().reinstall(fresh.clone());

        assert_eq!(merged.id, original.id);
        assert!(merged.active);
        assert_eq!(merged.files, original.files);
        assert_eq!(merged.config, original.config);
        assert_eq!(merged.installed_at, original.installed_at);
        assert_eq!(merged.version, "1.1.0");
        assert_eq!(merged.checksum, "sha256:bbb");
        assert_ne!(merged.id, fresh.id);
    }

    #[test]
    fn query_filters() {
        let mut module = Module::from_descriptor(
            &descriptor("blog", "1.0.0"),
            PathBuf::from("modules/blog"),
            PathBuf::from("modules/blog.zip"),
            String::new(),
        );
        assert!(ModuleQuery::all().matches(&module));
        assert!(!ModuleQuery::active().matches(&module));
        module.active = true;
        assert!(ModuleQuery::active().matches(&module));
        assert!(ModuleQuery::named("blog").matches(&module));
        assert!(!ModuleQuery::named("shop").matches(&module));
    }

    #[test]
    fn type_field_is_renamed() {
        let mut module = Module::from_descriptor(
            &descriptor("pay", "1.0.0"),
            PathBuf::from("modules/pay"),
            PathBuf::from("modules/pay.zip"),
            String::new(),
        );
        module.kind = Some("payment".into());
        let value = serde_json::to_value(&module).unwrap();
        assert_eq!(value["type"], "payment");
        assert_eq!(value["config"], serde_json::json!({}));
    }
}
