//! Module lifecycle: install, activate, deactivate, remove.
//!
//! The [`Orchestrator`] ties the archive validator, the registry, the
//! dependency planner, the package manager and the theme injector together.
//! Every public lifecycle operation returns the refreshed module list; on
//! failure the list is attached to the [`OperationError`] so callers can
//! redraw their view either way.
//!
//! Operations on the same module are serialized through [`ModuleLocks`];
//! package-manager commands are serialized host-wide.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use modkit_deps::{
    CommandPackageManager, Direction, PackageManager, PackageSpec, Plan, Prober, Requester, Scope,
    aggregate, reconcile,
};
use modkit_fs::checksum::file_checksum;
use modkit_fs::ops;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::archive::ModuleArchive;
use crate::config::HostConfig;
use crate::error::{Error, OperationError, Result};
use crate::hooks::{HookError, ModuleHooks, ScriptHooks};
use crate::locks::ModuleLocks;
use crate::module::{Module, ModuleQuery};
use crate::registry::{JsonFileStore, ModuleStore};
use crate::theme::{CommandThemeBuilder, Injector, ThemeBuilder};

/// Result of a public lifecycle operation.
pub type OpResult<T> = std::result::Result<T, OperationError>;

/// Back-office bundle of an active module with `loadApp` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AdminBundle {
    /// Top-level `.js` files of `<backoffice>/app/<module>/`.
    Loaded { module: String, scripts: Vec<String> },
    /// The bundle directory is gone; the back office skips the module.
    Missing { module: String, path: PathBuf },
}

impl AdminBundle {
    pub fn module(&self) -> &str {
        match self {
            Self::Loaded { module, .. } | Self::Missing { module, .. } => module,
        }
    }
}

/// Builds an [`Orchestrator`], defaulting every collaborator from the
/// host configuration.
pub struct OrchestratorBuilder {
    config: HostConfig,
    store: Option<Arc<dyn ModuleStore>>,
    packages: Option<Arc<dyn PackageManager>>,
    hooks: Option<Arc<dyn ModuleHooks>>,
    theme_builder: Option<Arc<dyn ThemeBuilder>>,
}

impl OrchestratorBuilder {
    pub fn store(mut self, store: Arc<dyn ModuleStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn package_manager(mut self, packages: Arc<dyn PackageManager>) -> Self {
        self.packages = Some(packages);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn ModuleHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn theme_builder(mut self, builder: Arc<dyn ThemeBuilder>) -> Self {
        self.theme_builder = Some(builder);
        self
    }

    /// Resolve the host version and assemble the orchestrator.
    pub fn build(self) -> Result<Orchestrator> {
        let config = self.config;
        let host_version = config.host_version()?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(JsonFileStore::new(config.registry_path())));
        let packages = self.packages.unwrap_or_else(|| {
            Arc::new(CommandPackageManager::new(
                config.package_manager.install.clone(),
                config.package_manager.list.clone(),
            ))
        });
        let hooks = self
            .hooks
            .unwrap_or_else(|| Arc::new(ScriptHooks::new(config.hooks.interpreter.clone())));
        let theme_builder = self.theme_builder.unwrap_or_else(|| {
            Arc::new(CommandThemeBuilder::new(config.theme.build_command.clone()))
        });
        let injector = Injector::new(config.themes_dir(), theme_builder, config.is_production());

        tracing::debug!(
            root = %config.root.display(),
            host_version = %host_version,
            production = config.is_production(),
            "Orchestrator ready"
        );

        Ok(Orchestrator {
            config,
            host_version,
            store,
            packages,
            hooks,
            injector,
            locks: ModuleLocks::new(),
            package_lock: Mutex::new(()),
        })
    }
}

pub struct Orchestrator {
    config: HostConfig,
    host_version: String,
    store: Arc<dyn ModuleStore>,
    packages: Arc<dyn PackageManager>,
    hooks: Arc<dyn ModuleHooks>,
    injector: Injector,
    locks: ModuleLocks,
    /// Serializes dependency probing and package-manager commands.
    package_lock: Mutex<()>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("root", &self.config.root)
            .field("host_version", &self.host_version)
            .field("injector", &self.injector)
            .finish()
    }
}

impl Orchestrator {
    pub fn builder(config: HostConfig) -> OrchestratorBuilder {
        OrchestratorBuilder {
            config,
            store: None,
            packages: None,
            hooks: None,
            theme_builder: None,
        }
    }

    /// An orchestrator with every collaborator taken from `config`.
    pub fn from_config(config: HostConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn host_version(&self) -> &str {
        &self.host_version
    }

    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    // Lifecycle

    /// Validate an uploaded archive and install (or re-install) it.
    ///
    /// The archive is moved to `<modules>/<name>.zip` and extracted to
    /// `<modules>/<name>/`. Nothing on disk or in the registry changes when
    /// validation fails; a failure after that removes what was written.
    pub fn install(&self, archive: &Path) -> OpResult<Vec<Module>> {
        self.run("install", || {
            let module = self.install_archive(archive)?;
            tracing::info!(module = %module.name, version = %module.version, "Installed module");
            self.all_modules()
        })
    }

    /// Activate a module, applying `resolutions` to dependency conflicts.
    pub fn activate(&self, id: Uuid, resolutions: &[PackageSpec]) -> OpResult<Vec<Module>> {
        self.run("activate", || {
            self.locks.with(id, || self.activate_locked(id, resolutions))??;
            self.all_modules()
        })
    }

    /// Deactivate a module, undoing what activation created.
    pub fn deactivate(&self, id: Uuid, resolutions: &[PackageSpec]) -> OpResult<Vec<Module>> {
        self.run("deactivate", || {
            self.locks
                .with(id, || self.deactivate_locked(id, resolutions))??;
            self.all_modules()
        })
    }

    /// Delete an inactive module's record, directory and archive.
    ///
    /// Returns the deleted record together with the remaining modules.
    pub fn remove(&self, id: Uuid) -> OpResult<(Module, Vec<Module>)> {
        self.run("remove", || {
            let removed = self.locks.with(id, || self.remove_locked(id))??;
            self.locks.forget(id);
            Ok((removed, self.all_modules()?))
        })
    }

    /// Re-inject the components of every active module into `theme`
    /// (the current theme when `None`).
    pub fn sync_theme(&self, theme: Option<&str>) -> OpResult<Vec<Module>> {
        self.run("sync_theme", || {
            let theme = theme.unwrap_or(&self.config.current_theme);
            let active = self.store.find(&ModuleQuery::active())?;
            let copied = self.injector.sync(theme, &active)?;

            for (name, paths) in copied {
                let Some(id) = active.iter().find(|m| m.name == name).map(|m| m.id) else {
                    continue;
                };
                self.locks.with(id, || self.record_files(id, paths))??;
            }
            tracing::info!(theme, modules = active.len(), "Synchronized theme components");
            self.all_modules()
        })
    }

    // Queries

    pub fn list(&self, query: &ModuleQuery) -> Result<Vec<Module>> {
        self.store.find(query)
    }

    pub fn get(&self, id: Uuid) -> Result<Module> {
        self.store
            .find_by_id(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    pub fn find_by_name(&self, name: &str) -> Result<Module> {
        self.store
            .find(&ModuleQuery::named(name))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Look a module up by id or, failing that, by name.
    pub fn lookup(&self, key: &str) -> Result<Module> {
        match Uuid::parse_str(key) {
            Ok(id) => self.get(id),
            Err(_) => self.find_by_name(key),
        }
    }

    /// The dependency plan activation would follow, conflicts included.
    pub fn plan_activation(&self, id: Uuid) -> Result<Plan> {
        let module = self.get(id)?;
        let active = self.store.find(&ModuleQuery::active())?;
        self.check_module_dependencies(&module, &active)?;
        self.plan_for(&module, &active, Direction::Activate)
    }

    /// The dependency plan deactivation would follow, conflicts included.
    pub fn plan_deactivation(&self, id: Uuid) -> Result<Plan> {
        let module = self.get(id)?;
        let active = self.store.find(&ModuleQuery::active())?;
        self.check_not_required(&module, &active)?;
        self.plan_for(&module, &active, Direction::Deactivate)
    }

    /// Back-office bundles to load, one per active `loadApp` module.
    pub fn admin_bundles(&self) -> Result<Vec<AdminBundle>> {
        let app_dir = self.config.backoffice_dir().join("app");
        let mut bundles = Vec::new();
        for module in self.store.find(&ModuleQuery::active())? {
            if !module.load_app {
                continue;
            }
            let dir = app_dir.join(&module.name);
            let bundle = match ops::list_dir(&dir) {
                Ok(names) => AdminBundle::Loaded {
                    module: module.name,
                    scripts: names.into_iter().filter(|n| n.ends_with(".js")).collect(),
                },
                Err(e) => {
                    tracing::warn!(module = %module.name, error = %e, "Admin bundle missing");
                    AdminBundle::Missing {
                        module: module.name,
                        path: dir,
                    }
                }
            };
            bundles.push(bundle);
        }
        Ok(bundles)
    }

    /// The module's `README.md`, empty when it ships none.
    pub fn readme(&self, name: &str) -> Result<String> {
        let module = self.find_by_name(name)?;
        match modkit_fs::io::read_text(&module.path.join("README.md")) {
            Ok(text) => Ok(text),
            Err(e) if e.is_not_found() => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    // Configuration

    pub fn module_config(&self, name: &str) -> Result<Value> {
        Ok(self.find_by_name(name)?.config)
    }

    /// Replace a module's configuration object.
    pub fn set_config(&self, id: Uuid, config: Value) -> Result<Module> {
        if !config.is_object() {
            return Err(Error::Config {
                message: "module configuration must be a JSON object".into(),
            });
        }
        self.locks.with(id, || {
            let mut module = self.get(id)?;
            module.config = config;
            module.touch();
            self.store.update(&module)?;
            Ok(module)
        })?
    }

    /// Set one (dot-separated) field of a module's configuration,
    /// creating intermediate objects as needed.
    pub fn set_partial_config(&self, name: &str, field: &str, value: Value) -> Result<Module> {
        let id = self.find_by_name(name)?.id;
        self.locks.with(id, || {
            let mut module = self.get(id)?;
            set_field(&mut module.config, field, value)?;
            module.touch();
            self.store.update(&module)?;
            tracing::debug!(module = %module.name, field, "Updated module configuration");
            Ok(module)
        })?
    }

    // Internals

    fn run<T>(&self, operation: &str, f: impl FnOnce() -> Result<T>) -> OpResult<T> {
        f().map_err(|error| {
            tracing::warn!(operation, error = %error, "Module operation failed");
            let modules = self.all_modules().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to reload modules after error");
                Vec::new()
            });
            OperationError { error, modules }
        })
    }

    fn all_modules(&self) -> Result<Vec<Module>> {
        self.store.find(&ModuleQuery::all())
    }

    fn install_archive(&self, path: &Path) -> Result<Module> {
        let mut archive = ModuleArchive::open(path)?;
        let descriptor = archive.inspect(&self.host_version)?;
        drop(archive);

        let existing = self.store.find(&ModuleQuery::named(&descriptor.name))?;
        match existing.first() {
            Some(current) => self
                .locks
                .with(current.id, || self.unpack(path, &descriptor.name))?,
            None => self.unpack(path, &descriptor.name),
        }
    }

    /// Move, extract and record an archive that passed validation.
    fn unpack(&self, path: &Path, name: &str) -> Result<Module> {
        let modules_dir = self.config.modules_dir();
        ops::ensure_dir(&modules_dir)?;
        let module_dir = modules_dir.join(name);
        let stored = modules_dir.join(format!("{name}.zip"));

        let mut cleanup = Cleanup::new("install");
        match ops::remove_path(&module_dir) {
            Ok(_) => tracing::debug!(path = %module_dir.display(), "Removed previous module files"),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(Error::side_effect("previous module removal", e)),
        }

        if !same_path(path, &stored) {
            ops::move_file(path, &stored).map_err(|e| Error::side_effect("archive move", e))?;
        }
        cleanup.track(stored.clone());
        cleanup.track(module_dir.clone());

        // Descriptor of the stored copy.
        let mut archive = ModuleArchive::open(&stored)?;
        let descriptor = archive.inspect(&self.host_version)?;
        let extracted = archive.extract_all(&modules_dir)?;
        tracing::debug!(module = name, files = extracted, "Extracted module archive");

        let checksum = file_checksum(&stored)?;
        let fresh = Module::from_descriptor(&descriptor, module_dir, stored, checksum);
        let record = match self.store.find(&ModuleQuery::named(name))?.into_iter().next() {
            Some(current) => current.reinstall(fresh),
            None => fresh,
        };
        let saved = self.store.upsert_by_name(record)?;

        cleanup.disarm();
        Ok(saved)
    }

    fn activate_locked(&self, id: Uuid, resolutions: &[PackageSpec]) -> Result<()> {
        let mut module = self.get(id)?;
        if module.active {
            tracing::info!(module = %module.name, "Module already active");
            return Ok(());
        }

        let packages = self.package_guard()?;
        let active = self.store.find(&ModuleQuery::active())?;
        self.check_module_dependencies(&module, &active)?;
        self.injector
            .check_module(&self.config.current_theme, &module)?;
        let plan = self.checked_plan(&module, &active, Direction::Activate, resolutions)?;

        let mut created = Cleanup::new("activation");
        let mut files = self.copy_module_files(&module, &mut created)?;
        self.apply_packages(&plan, &packages)?;
        let components = self
            .injector
            .inject_module(&self.config.current_theme, &module)?;
        files.extend(components);

        module.files = files;
        module.active = true;
        module.touch();
        if let Err(e) = self.store.update(&module) {
            if let Err(undo) = self
                .injector
                .remove_module(&self.config.current_theme, &module)
            {
                tracing::warn!(module = %module.name, error = %undo, "Failed to undo component injection");
            }
            return Err(e);
        }
        created.disarm();

        tracing::info!(module = %module.name, files = module.files.len(), "Activated module");
        Ok(())
    }

    fn deactivate_locked(&self, id: Uuid, resolutions: &[PackageSpec]) -> Result<()> {
        let mut module = self.get(id)?;
        if !module.active {
            tracing::info!(module = %module.name, "Module already inactive");
            return Ok(());
        }

        let packages = self.package_guard()?;
        let active = self.store.find(&ModuleQuery::active())?;
        self.check_not_required(&module, &active)?;
        let plan = self.checked_plan(&module, &active, Direction::Deactivate, resolutions)?;

        match self.hooks.uninit(&module) {
            Ok(()) => tracing::info!(module = %module.name, "Ran uninit hook"),
            Err(HookError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }
        for job in &module.cron_names {
            if let Err(e) = self.hooks.remove_job(job) {
                tracing::warn!(module = %module.name, job = %job, error = %e, "Failed to remove job");
            }
        }
        for code in &module.mail_type_code {
            if let Err(e) = self.hooks.remove_mail_type(code) {
                tracing::warn!(module = %module.name, mail_type = %code, error = %e, "Failed to remove mail type");
            }
        }

        for path in &module.files {
            match ops::remove_path(path) {
                Ok(_) => tracing::debug!(path = %path.display(), "Removed module file"),
                Err(e) if e.is_not_found() => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove module file"),
            }
        }

        self.injector
            .remove_module(&self.config.current_theme, &module)?;
        self.apply_packages(&plan, &packages)?;

        module.files.clear();
        module.active = false;
        module.touch();
        self.store.update(&module)?;

        tracing::info!(module = %module.name, "Deactivated module");
        Ok(())
    }

    fn remove_locked(&self, id: Uuid) -> Result<Module> {
        let module = self.get(id)?;
        if module.active {
            return Err(Error::ModuleActive(module.name));
        }

        let removed = self
            .store
            .delete_by_id(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        for path in [&removed.path, &removed.archive] {
            match ops::remove_path(path) {
                Ok(_) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove module files"),
            }
        }

        tracing::info!(module = %removed.name, "Removed module");
        Ok(removed)
    }

    fn record_files(&self, id: Uuid, paths: Vec<PathBuf>) -> Result<()> {
        let mut module = self.get(id)?;
        let before = module.files.len();
        for path in paths {
            if !module.owns_file(&path) {
                module.files.push(path);
            }
        }
        if module.files.len() != before {
            module.touch();
            self.store.update(&module)?;
        }
        Ok(())
    }

    fn check_module_dependencies(&self, module: &Module, active: &[Module]) -> Result<()> {
        let missing: Vec<String> = module
            .module_dependencies
            .iter()
            .filter(|dep| !active.iter().any(|m| &m.name == *dep))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingModuleDependency {
                module: module.name.clone(),
                missing,
            })
        }
    }

    fn check_not_required(&self, module: &Module, active: &[Module]) -> Result<()> {
        let required_by: Vec<String> = active
            .iter()
            .filter(|m| m.id != module.id && m.module_dependencies.contains(&module.name))
            .map(|m| m.name.clone())
            .collect();
        if required_by.is_empty() {
            Ok(())
        } else {
            Err(Error::RequiredByActiveModule {
                module: module.name.clone(),
                required_by,
            })
        }
    }

    fn plan_for(&self, module: &Module, active: &[Module], direction: Direction) -> Result<Plan> {
        let others: Vec<Requester<'_>> = active
            .iter()
            .filter(|m| m.id != module.id)
            .map(Module::requester)
            .collect();
        let aggregation = aggregate(module.requester(), &others, direction)?;
        let prober = Prober::new(self.packages.as_ref(), self.config.scope_locations());
        reconcile(aggregation, &prober).map_err(Error::DependencyProbe)
    }

    fn checked_plan(
        &self,
        module: &Module,
        active: &[Module],
        direction: Direction,
        resolutions: &[PackageSpec],
    ) -> Result<Plan> {
        let plan = self
            .plan_for(module, active, direction)?
            .resolve(resolutions);
        if plan.has_conflicts() {
            return Err(Error::DependencyConflict {
                plan: Box::new(plan),
            });
        }
        Ok(plan)
    }

    /// Copy the back-office app and translations; returns the created paths.
    fn copy_module_files(&self, module: &Module, created: &mut Cleanup) -> Result<Vec<PathBuf>> {
        let mut copies: Vec<(PathBuf, PathBuf)> = Vec::new();
        let backoffice = self.config.backoffice_dir();

        let app = module.path.join("app");
        if module.load_app || app.is_dir() {
            copies.push((app, backoffice.join("app").join(&module.name)));
        }
        if module.load_translation_back {
            copies.push((
                module.path.join("translations").join("back"),
                backoffice
                    .join("assets")
                    .join("translations")
                    .join("modules")
                    .join(&module.name),
            ));
        }
        if module.load_translation_front {
            let i18n = self.config.current_theme_root().join("assets").join("i18n");
            let source = module.path.join("translations").join("front");
            for lang in ops::list_dir(&i18n).unwrap_or_default() {
                let from = source.join(&lang);
                if from.is_dir() {
                    copies.push((from, i18n.join(&lang).join("modules").join(&module.name)));
                }
            }
        }

        let mut files = Vec::with_capacity(copies.len());
        for (from, to) in copies {
            if !ops::exists(&from) {
                tracing::warn!(module = %module.name, path = %from.display(), "Nothing to copy");
                continue;
            }
            created.track(to.clone());
            let count = ops::copy_tree(&from, &to)
                .map_err(|e| Error::side_effect(format!("copy of {}", from.display()), e))?;
            tracing::debug!(module = %module.name, dest = %to.display(), files = count, "Copied module files");
            files.push(to);
        }
        Ok(files)
    }

    /// Held from probing the installed packages until the plan's commands
    /// have run.
    fn package_guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.package_lock.lock().map_err(|_| Error::Store {
            message: "package manager lock poisoned".to_string(),
        })
    }

    /// Run a plan's package-manager commands: removals, then installs,
    /// per scope.
    fn apply_packages(&self, plan: &Plan, _packages: &MutexGuard<'_, ()>) -> Result<()> {
        if Scope::ALL.iter().all(|s| plan.scope(*s).is_noop()) {
            return Ok(());
        }
        let locations = self.config.scope_locations();

        for scope in Scope::ALL {
            let scope_plan = plan.scope(scope);
            let cwd = &locations.get(scope).root;

            let names = scope_plan.remove_names();
            if !names.is_empty() {
                tracing::info!(%scope, packages = ?names, "Removing packages");
                self.packages
                    .remove(&names, cwd)
                    .map_err(|e| Error::side_effect(format!("{scope} package removal"), e))?;
            }
            let specs = scope_plan.install_specs();
            if !specs.is_empty() {
                tracing::info!(%scope, packages = ?specs, "Installing packages");
                self.packages
                    .install(&specs, cwd)
                    .map_err(|e| Error::side_effect(format!("{scope} package install"), e))?;
            }
        }
        Ok(())
    }
}

/// Paths to delete if an operation fails halfway.
struct Cleanup {
    operation: &'static str,
    paths: Vec<PathBuf>,
    armed: bool,
}

impl Cleanup {
    fn new(operation: &'static str) -> Self {
        Self {
            operation,
            paths: Vec::new(),
            armed: true,
        }
    }

    fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for path in self.paths.iter().rev() {
            match ops::remove_path(path) {
                Ok(_) => tracing::debug!(operation = self.operation, path = %path.display(), "Rolled back"),
                Err(e) if e.is_not_found() => {}
                Err(e) => tracing::warn!(
                    operation = self.operation,
                    path = %path.display(),
                    error = %e,
                    "Rollback failed"
                ),
            }
        }
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (ops::canonicalize(a), ops::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Set a dot-separated `field` inside `config`.
fn set_field(config: &mut Value, field: &str, value: Value) -> Result<()> {
    let keys: Vec<&str> = field.split('.').collect();
    if keys.iter().any(|k| k.is_empty()) {
        return Err(Error::Config {
            message: format!("invalid configuration field '{field}'"),
        });
    }
    *config = with_field(std::mem::take(config), &keys, value);
    Ok(())
}

/// Non-object values on the path are replaced by objects.
fn with_field(current: Value, keys: &[&str], value: Value) -> Value {
    let mut map = match current {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    match keys {
        [] => return value,
        [last] => {
            map.insert(last.to_string(), value);
        }
        [first, rest @ ..] => {
            let child = map.remove(*first).unwrap_or(Value::Null);
            map.insert(first.to_string(), with_field(child, rest, value));
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn set_field_creates_nested_objects() {
        let mut config = json!({"keep": 1});
        set_field(&mut config, "payment.stripe.key", json!("sk")).unwrap();
        set_field(&mut config, "keep", json!(2)).unwrap();
        assert_eq!(config, json!({"keep": 2, "payment": {"stripe": {"key": "sk"}}}));
    }

    #[test]
    fn set_field_replaces_scalars_on_the_path() {
        let mut config = json!({"mode": "simple"});
        set_field(&mut config, "mode.level", json!(3)).unwrap();
        assert_eq!(config, json!({"mode": {"level": 3}}));
    }

    #[test]
    fn set_field_rejects_empty_segments() {
        let mut config = json!({});
        assert!(set_field(&mut config, "a..b", json!(1)).is_err());
        assert!(set_field(&mut config, "", json!(1)).is_err());
    }

    #[test]
    fn cleanup_removes_tracked_paths_unless_disarmed() {
        let dir = tempfile::tempdir().unwrap();
        let kept = dir.path().join("kept");
        let dropped = dir.path().join("dropped");
        std::fs::create_dir_all(&kept).unwrap();
        std::fs::create_dir_all(&dropped).unwrap();

        {
            let mut cleanup = Cleanup::new("test");
            cleanup.track(dropped.clone());
            cleanup.track(dir.path().join("never-created"));
        }
        {
            let mut cleanup = Cleanup::new("test");
            cleanup.track(kept.clone());
            cleanup.disarm();
        }

        assert!(!dropped.exists());
        assert!(kept.exists());
    }
}
