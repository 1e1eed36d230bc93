//! Front-end component injection.
//!
//! Modules ship `theme_components/Module<Name>.js` files. Activation copies
//! them into `<theme>/modules/` and registers them in the theme manifest;
//! deactivation undoes both. A component code belongs to the module that
//! registered it. Manifest passes are serialized, and in production a pass
//! that changed anything ends with a theme rebuild.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use modkit_fs::checksum::file_checksum;
use modkit_fs::ops;

use crate::error::{Error, Result};
use crate::module::Module;
use crate::theme::builder::ThemeBuilder;
use crate::theme::manifest::{ComponentEntry, ThemeManifest};

/// Component files found in a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentFile {
    pub file_name: String,
    pub source: PathBuf,
}

/// `Module*.js` files in `dir`; a missing directory has none.
pub fn component_files(dir: &Path) -> Result<Vec<ComponentFile>> {
    let names = match ops::list_dir(dir) {
        Ok(names) => names,
        Err(e) if e.is_not_found() => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    Ok(names
        .into_iter()
        .filter(|name| ComponentEntry::for_file("", name, None).is_some())
        .map(|file_name| ComponentFile {
            source: dir.join(&file_name),
            file_name,
        })
        .collect())
}

pub struct Injector {
    themes_dir: PathBuf,
    builder: Arc<dyn ThemeBuilder>,
    rebuild: bool,
    lock: Mutex<()>,
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("themes_dir", &self.themes_dir)
            .field("rebuild", &self.rebuild)
            .finish()
    }
}

impl Injector {
    /// `rebuild` turns on the post-pass theme build (production hosts).
    pub fn new(themes_dir: PathBuf, builder: Arc<dyn ThemeBuilder>, rebuild: bool) -> Self {
        Self {
            themes_dir,
            builder,
            rebuild,
            lock: Mutex::new(()),
        }
    }

    pub fn theme_root(&self, theme: &str) -> PathBuf {
        self.themes_dir.join(theme)
    }

    /// `<theme>/modules/`
    pub fn modules_dir(&self, theme: &str) -> PathBuf {
        self.theme_root(theme).join("modules")
    }

    pub fn manifest(&self, theme: &str) -> Result<ThemeManifest> {
        ThemeManifest::load(&self.modules_dir(theme))
    }

    /// Register and copy one component; returns the copied path.
    ///
    /// Re-injecting a registered component refreshes its file. A code
    /// owned by another module is a `ComponentConflict`.
    pub fn inject(
        &self,
        theme: &str,
        module: &str,
        kind: Option<&str>,
        component: &Path,
    ) -> Result<PathBuf> {
        self.pass(theme, |pass| pass.inject(module, kind, component))
    }

    /// Unregister and delete one component by file name; absent is a no-op.
    pub fn remove(&self, theme: &str, file_name: &str) -> Result<()> {
        self.pass(theme, |pass| pass.remove(file_name, None))
    }

    /// Fail if a component of `module` is registered to another module.
    pub fn check_module(&self, theme: &str, module: &Module) -> Result<()> {
        let manifest = self.manifest(theme)?;
        for component in component_files(&module.theme_components_dir())? {
            claim(&manifest, &module.name, &component.file_name)?;
        }
        Ok(())
    }

    /// Inject every component of `module`; returns the copied paths.
    ///
    /// Nothing is copied when any component conflicts.
    pub fn inject_module(&self, theme: &str, module: &Module) -> Result<Vec<PathBuf>> {
        let components = component_files(&module.theme_components_dir())?;
        if components.is_empty() {
            return Ok(Vec::new());
        }
        self.pass(theme, |pass| {
            for component in &components {
                claim(&pass.manifest, &module.name, &component.file_name)?;
            }
            let mut copied = Vec::with_capacity(components.len());
            for component in &components {
                copied.push(pass.inject(
                    &module.name,
                    module.kind.as_deref(),
                    &component.source,
                )?);
            }
            Ok(copied)
        })
    }

    /// Remove every component of `module`, by registered owner and by the
    /// files the module ships. Components registered to other modules stay.
    pub fn remove_module(&self, theme: &str, module: &Module) -> Result<()> {
        let shipped = component_files(&module.theme_components_dir())?;
        self.pass(theme, |pass| {
            let owned: Vec<String> = pass
                .manifest
                .components
                .iter()
                .filter(|c| c.module == module.name)
                .map(|c| c.component.clone())
                .collect();
            for file_name in owned
                .iter()
                .chain(shipped.iter().map(|c| &c.file_name))
            {
                pass.remove(file_name, Some(&module.name))?;
            }
            Ok(())
        })
    }

    /// Rebuild a theme's manifest from scratch for `modules`.
    ///
    /// Previously registered components are removed first. When two
    /// modules ship the same component the first one keeps it. Returns the
    /// copied paths per module name.
    pub fn sync(&self, theme: &str, modules: &[Module]) -> Result<Vec<(String, Vec<PathBuf>)>> {
        let mut shipped = Vec::with_capacity(modules.len());
        for module in modules {
            shipped.push((module, component_files(&module.theme_components_dir())?));
        }

        self.pass(theme, |pass| {
            let previous: Vec<String> = pass
                .manifest
                .components
                .iter()
                .map(|c| c.component.clone())
                .collect();
            for file_name in &previous {
                pass.remove(file_name, None)?;
            }

            let mut copied = Vec::new();
            for (module, components) in &shipped {
                let mut paths = Vec::with_capacity(components.len());
                for component in components {
                    match pass.inject(&module.name, module.kind.as_deref(), &component.source) {
                        Ok(path) => paths.push(path),
                        Err(Error::ComponentConflict { component: file, owner, .. }) => {
                            tracing::warn!(module = %module.name, component = %file, %owner, "Skipped conflicting theme component");
                        }
                        Err(e) => return Err(e),
                    }
                }
                copied.push((module.name.clone(), paths));
            }
            Ok(copied)
        })
    }

    /// One serialized load-modify-save pass over a theme manifest.
    ///
    /// Any file written or deleted, or any manifest change, saves the
    /// manifest and triggers the rebuild.
    fn pass<T>(&self, theme: &str, f: impl FnOnce(&mut Pass<'_>) -> Result<T>) -> Result<T> {
        let _guard = self.lock.lock().map_err(|_| Error::Store {
            message: "theme manifest lock poisoned".to_string(),
        })?;

        let modules_dir = self.modules_dir(theme);
        ops::ensure_dir(&modules_dir)?;
        let manifest = ThemeManifest::load(&modules_dir)?;
        let before = manifest.clone();
        let mut pass = Pass {
            manifest,
            modules_dir: &modules_dir,
            touched: false,
        };

        let out = f(&mut pass)?;

        let rendered = modules_dir.join(super::manifest::MANIFEST_JS).exists();
        if pass.touched || pass.manifest != before || !rendered {
            pass.manifest
                .save(&modules_dir)
                .map_err(|e| Error::side_effect("theme manifest update", e))?;
            tracing::debug!(theme, components = pass.manifest.components.len(), "Saved theme manifest");
            if self.rebuild {
                self.builder.rebuild(theme, &self.theme_root(theme))?;
            }
        }
        Ok(out)
    }
}

/// Working state of one manifest pass.
struct Pass<'a> {
    manifest: ThemeManifest,
    modules_dir: &'a Path,
    /// A component file was written or deleted.
    touched: bool,
}

impl Pass<'_> {
    fn inject(&mut self, module: &str, kind: Option<&str>, component: &Path) -> Result<PathBuf> {
        let file_name = component
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        claim(&self.manifest, module, &file_name)?;
        let entry = ComponentEntry::for_file(module, &file_name, kind).ok_or_else(|| {
            Error::SideEffect {
                action: "component injection".to_string(),
                reason: format!("'{file_name}' is not a Module<Name>.js component"),
            }
        })?;

        let dest = self.modules_dir.join(&file_name);
        if !same_content(component, &dest)? {
            ops::copy_file(component, &dest).map_err(|e| Error::side_effect("component copy", e))?;
            self.touched = true;
        }
        if self.manifest.insert(entry) {
            tracing::info!(module, component = %file_name, "Injected theme component");
        }
        Ok(dest)
    }

    /// With `owner` set, a component registered to another module is kept.
    fn remove(&mut self, file_name: &str, owner: Option<&str>) -> Result<()> {
        let Some(code) = super::manifest::component_code(file_name) else {
            return Ok(());
        };
        if let (Some(owner), Some(current)) = (owner, self.manifest.owner_of(&code)) {
            if current != owner {
                tracing::debug!(component = %file_name, owner = current, "Kept component of another module");
                return Ok(());
            }
        }
        if self.manifest.remove_code(&code).is_some() {
            tracing::info!(component = %file_name, "Removed theme component");
        }
        match ops::remove_path(&self.modules_dir.join(file_name)) {
            Ok(_) => {
                self.touched = true;
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(Error::side_effect("component removal", e)),
        }
    }
}

/// `module` may register `file_name` unless another module owns its code.
fn claim(manifest: &ThemeManifest, module: &str, file_name: &str) -> Result<()> {
    let Some(code) = super::manifest::component_code(file_name) else {
        return Ok(());
    };
    match manifest.owner_of(&code) {
        Some(owner) if owner != module => Err(Error::ComponentConflict {
            component: file_name.to_string(),
            module: module.to_string(),
            owner: owner.to_string(),
        }),
        _ => Ok(()),
    }
}

fn same_content(source: &Path, dest: &Path) -> Result<bool> {
    let existing = match file_checksum(dest) {
        Ok(sum) => sum,
        Err(e) if e.is_not_found() => return Ok(false),
        Err(e) => return Err(Error::side_effect("component comparison", e)),
    };
    let incoming = file_checksum(source).map_err(|e| Error::side_effect("component copy", e))?;
    Ok(existing == incoming)
}
