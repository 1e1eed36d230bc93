//! The theme component manifest.
//!
//! The structured list lives in `<theme>/modules/list_modules.json`; the
//! theme imports the rendered `<theme>/modules/list_modules.js`.

use std::path::Path;

use modkit_fs::ConfigStore;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const MANIFEST_JSON: &str = "list_modules.json";
pub const MANIFEST_JS: &str = "list_modules.js";
pub const GENERATED_HEADER: &str = "// Generated by modkit. Do not edit by hand.";

const COMPONENT_PREFIX: &str = "Module";
const COMPONENT_SUFFIX: &str = ".js";

/// One injected front-end component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentEntry {
    /// Owning module.
    pub module: String,
    /// File name inside `<theme>/modules/`, e.g. `ModuleCart.js`.
    pub component: String,
    /// `aq-` + lowercase component name, e.g. `aq-cart`.
    pub code: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ComponentEntry {
    /// Build an entry from a component file name; `None` unless the name
    /// is `Module<Name>.js` with a non-empty `<Name>`.
    pub fn for_file(module: &str, file_name: &str, kind: Option<&str>) -> Option<Self> {
        let code = component_code(file_name)?;
        Some(Self {
            module: module.to_string(),
            component: file_name.to_string(),
            code,
            kind: kind.map(str::to_string),
        })
    }
}

/// `ModuleCart.js` -> `aq-cart`.
pub fn component_code(file_name: &str) -> Option<String> {
    let name = file_name
        .strip_prefix(COMPONENT_PREFIX)?
        .strip_suffix(COMPONENT_SUFFIX)?;
    if name.is_empty() {
        return None;
    }
    Some(format!("aq-{}", name.to_lowercase()))
}

/// Ordered component list of one theme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeManifest {
    #[serde(default)]
    pub components: Vec<ComponentEntry>,
}

impl ThemeManifest {
    /// Load from `<modules_dir>/list_modules.json`; missing means empty.
    pub fn load(modules_dir: &Path) -> Result<Self> {
        match ConfigStore::new().load(&modules_dir.join(MANIFEST_JSON)) {
            Ok(manifest) => Ok(manifest),
            Err(e) if e.is_not_found() => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the JSON state and the rendered JS file.
    pub fn save(&self, modules_dir: &Path) -> Result<()> {
        ConfigStore::new().save(&modules_dir.join(MANIFEST_JSON), self)?;
        modkit_fs::io::write_text(&modules_dir.join(MANIFEST_JS), &self.render())?;
        Ok(())
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.components.iter().any(|c| c.code == code)
    }

    /// Module that registered `code`.
    pub fn owner_of(&self, code: &str) -> Option<&str> {
        self.components
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.module.as_str())
    }

    /// Append `entry` unless its code is already present.
    pub fn insert(&mut self, entry: ComponentEntry) -> bool {
        if self.contains_code(&entry.code) {
            return false;
        }
        self.components.push(entry);
        true
    }

    pub fn remove_code(&mut self, code: &str) -> Option<ComponentEntry> {
        let pos = self.components.iter().position(|c| c.code == code)?;
        Some(self.components.remove(pos))
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(GENERATED_HEADER);
        out.push('\n');
        if self.components.is_empty() {
            out.push_str("export default [];\n");
            return out;
        }
        out.push_str("export default [\n");
        for entry in &self.components {
            out.push_str(&format!(
                "    {{ jsx: require('./{}'), code: '{}'",
                js_escape(&entry.component),
                js_escape(&entry.code)
            ));
            if let Some(kind) = &entry.kind {
                out.push_str(&format!(", type: '{}'", js_escape(kind)));
            }
            out.push_str(" },\n");
        }
        out.push_str("];\n");
        out
    }
}

fn js_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ModuleCart.js", Some("aq-cart"))]
    #[case("ModuleProductReviews.js", Some("aq-productreviews"))]
    #[case("Module.js", None)]
    #[case("Cart.js", None)]
    #[case("ModuleCart.jsx", None)]
    fn codes(#[case] file: &str, #[case] expected: Option<&str>) {
        assert_eq!(component_code(file).as_deref(), expected);
    }

    #[test]
    fn insert_is_idempotent_by_code() {
        let mut manifest = ThemeManifest::default();
        let entry = ComponentEntry::for_file("shop", "ModuleCart.js", None).unwrap();
        assert!(manifest.insert(entry.clone()));
        assert!(!manifest.insert(entry));
        assert_eq!(manifest.components.len(), 1);

        assert!(manifest.remove_code("aq-cart").is_some());
        assert!(manifest.remove_code("aq-cart").is_none());
    }

    #[test]
    fn render_escapes_quotes() {
        let mut manifest = ThemeManifest::default();
        manifest.insert(ComponentEntry::for_file("shop", "ModuleCart.js", Some("it's")).unwrap());
        assert!(manifest.render().contains("type: 'it\\'s'"));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = ThemeManifest::default();
        manifest.insert(ComponentEntry::for_file("shop", "ModuleCart.js", None).unwrap());
        manifest.save(dir.path()).unwrap();

        assert_eq!(ThemeManifest::load(dir.path()).unwrap(), manifest);
        let js = std::fs::read_to_string(dir.path().join(MANIFEST_JS)).unwrap();
        assert!(js.starts_with(GENERATED_HEADER));
    }
}
