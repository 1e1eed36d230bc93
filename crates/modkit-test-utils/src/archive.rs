//! [`ArchiveBuilder`]: module zip archives for tests.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Builds `<name>.zip` with a `<name>/info.json` descriptor and any extra
/// files under `<name>/`.
///
/// # Example
///
/// ```rust,no_run
/// use modkit_test_utils::ArchiveBuilder;
///
/// let dir = tempfile::tempdir().unwrap();
/// let archive = ArchiveBuilder::new("shop")
///     .api_deps(&["lodash@^4.0.0"])
///     .component("Cart", "export default () => null;")
///     .build(dir.path());
/// assert!(archive.ends_with("shop.zip"));
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    name: String,
    info: Map<String, Value>,
    include_manifest: bool,
    manifest_override: Option<String>,
    files: Vec<(String, Vec<u8>)>,
    raw_entries: Vec<(String, Vec<u8>)>,
}

impl ArchiveBuilder {
    pub fn new(name: &str) -> Self {
        let info = json!({
            "name": name,
            "version": "1.0.0",
            "description": format!("{name} test module"),
            "url": "",
            "aquilaVersion": ">=1.0.0",
            "cronNames": [],
            "mailTypeCode": [],
            "loadApp": false,
            "loadTranslationBack": false,
            "loadTranslationFront": false,
            "packageDependencies": { "api": [], "theme": [] },
            "moduleDependencies": [],
        });
        let info = match info {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        Self {
            name: name.to_string(),
            info,
            include_manifest: true,
            manifest_override: None,
            files: Vec::new(),
            raw_entries: Vec::new(),
        }
    }

    /// Set any descriptor field.
    pub fn info(mut self, key: &str, value: Value) -> Self {
        self.info.insert(key.to_string(), value);
        self
    }

    /// Declare a different `info.name` than the archive base name.
    pub fn declared_name(self, name: &str) -> Self {
        self.info("name", json!(name))
    }

    pub fn version(self, version: &str) -> Self {
        self.info("version", json!(version))
    }

    /// Host versions the module accepts (`aquilaVersion`).
    pub fn host_range(self, range: &str) -> Self {
        self.info("aquilaVersion", json!(range))
    }

    pub fn api_deps(mut self, specs: &[&str]) -> Self {
        self.package_deps("api", specs);
        self
    }

    pub fn theme_deps(mut self, specs: &[&str]) -> Self {
        self.package_deps("theme", specs);
        self
    }

    pub fn module_deps(self, names: &[&str]) -> Self {
        self.info("moduleDependencies", json!(names))
    }

    pub fn type_tag(self, tag: &str) -> Self {
        self.info("type", json!(tag))
    }

    pub fn cron_names(self, names: &[&str]) -> Self {
        self.info("cronNames", json!(names))
    }

    pub fn mail_types(self, codes: &[&str]) -> Self {
        self.info("mailTypeCode", json!(codes))
    }

    /// Add `app/<file>` and turn on `loadApp`.
    pub fn app_file(self, file: &str, content: &str) -> Self {
        self.info("loadApp", json!(true))
            .file(&format!("app/{file}"), content)
    }

    /// Add a back-office translation and turn on `loadTranslationBack`.
    pub fn back_translation(self, file: &str, content: &str) -> Self {
        self.info("loadTranslationBack", json!(true))
            .file(&format!("translations/back/{file}"), content)
    }

    /// Add a front translation for `lang` and turn on `loadTranslationFront`.
    pub fn front_translation(self, lang: &str, file: &str, content: &str) -> Self {
        self.info("loadTranslationFront", json!(true))
            .file(&format!("translations/front/{lang}/{file}"), content)
    }

    /// Add `theme_components/Module<component>.js`.
    pub fn component(self, component: &str, content: &str) -> Self {
        self.file(&format!("theme_components/Module{component}.js"), content)
    }

    /// Add a file under `<name>/`.
    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.files
            .push((path.to_string(), content.as_bytes().to_vec()));
        self
    }

    /// Add an entry at an arbitrary archive path, outside `<name>/`.
    pub fn raw_entry(mut self, path: &str, content: &str) -> Self {
        self.raw_entries
            .push((path.to_string(), content.as_bytes().to_vec()));
        self
    }

    /// Leave `info.json` out.
    pub fn without_manifest(mut self) -> Self {
        self.include_manifest = false;
        self
    }

    /// Use `content` verbatim as `info.json`.
    pub fn raw_manifest(mut self, content: &str) -> Self {
        self.manifest_override = Some(content.to_string());
        self
    }

    /// Write `<dir>/<name>.zip`.
    pub fn build(&self, dir: &Path) -> PathBuf {
        self.build_as(&dir.join(format!("{}.zip", self.name)))
    }

    /// Write the archive at `path`.
    pub fn build_as(&self, path: &Path) -> PathBuf {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        zip.add_directory(format!("{}/", self.name), options).unwrap();

        if self.include_manifest {
            let manifest = match &self.manifest_override {
                Some(raw) => raw.clone(),
                None => serde_json::to_string_pretty(&json!({ "info": self.info })).unwrap(),
            };
            zip.start_file(format!("{}/info.json", self.name), options)
                .unwrap();
            zip.write_all(manifest.as_bytes()).unwrap();
        }

        for (rel, content) in &self.files {
            zip.start_file(format!("{}/{}", self.name, rel), options)
                .unwrap();
            zip.write_all(content).unwrap();
        }

        for (raw, content) in &self.raw_entries {
            zip.start_file(raw.as_str(), options).unwrap();
            zip.write_all(content).unwrap();
        }

        zip.finish().unwrap();
        path.to_path_buf()
    }

    fn package_deps(&mut self, scope: &str, specs: &[&str]) {
        let deps = self
            .info
            .entry("packageDependencies")
            .or_insert_with(|| json!({}));
        deps[scope] = json!(specs);
    }
}
