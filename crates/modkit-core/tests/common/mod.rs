//! Shared fixture for orchestrator integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use modkit_core::hooks::UNINIT_SCRIPT;
use modkit_core::{
    Error, HookError, HostConfig, MemoryStore, Module, ModuleHooks, ModuleQuery, ModuleStore,
    Orchestrator, ThemeBuilder,
};
use uuid::Uuid;
use modkit_test_utils::{ArchiveBuilder, RecordingPackageManager, TestHost};
use tempfile::TempDir;

/// Records hook calls; the uninit hook runs only when the module ships
/// `uninit.js`.
#[derive(Debug, Default)]
pub struct RecordingHooks {
    pub uninit: Mutex<Vec<String>>,
    pub jobs: Mutex<Vec<String>>,
    pub mail_types: Mutex<Vec<String>>,
    pub fail_uninit: Mutex<bool>,
}

impl ModuleHooks for RecordingHooks {
    fn uninit(&self, module: &Module) -> Result<(), HookError> {
        let script = module.script(UNINIT_SCRIPT);
        if !script.is_file() {
            return Err(HookError::NotFound { path: script });
        }
        if *self.fail_uninit.lock().unwrap() {
            return Err(HookError::Failed {
                module: module.name.clone(),
                script: UNINIT_SCRIPT.to_string(),
                exit_code: Some(1),
                stderr: "simulated".to_string(),
            });
        }
        self.uninit.lock().unwrap().push(module.name.clone());
        Ok(())
    }

    fn remove_job(&self, name: &str) -> Result<(), HookError> {
        self.jobs.lock().unwrap().push(name.to_string());
        Ok(())
    }

    fn remove_mail_type(&self, code: &str) -> Result<(), HookError> {
        self.mail_types.lock().unwrap().push(code.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CountingBuilder(pub AtomicUsize);

impl ThemeBuilder for CountingBuilder {
    fn rebuild(&self, _theme: &str, _theme_root: &Path) -> modkit_core::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl CountingBuilder {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Reads like an empty registry and rejects every write.
#[derive(Debug, Default)]
pub struct ReadOnlyStore(MemoryStore);

impl ModuleStore for ReadOnlyStore {
    fn find_by_id(&self, id: Uuid) -> modkit_core::Result<Option<Module>> {
        self.0.find_by_id(id)
    }

    fn find(&self, query: &ModuleQuery) -> modkit_core::Result<Vec<Module>> {
        self.0.find(query)
    }

    fn upsert_by_name(&self, _module: Module) -> modkit_core::Result<Module> {
        Err(Error::Store {
            message: "registry is read-only".to_string(),
        })
    }

    fn update(&self, _module: &Module) -> modkit_core::Result<()> {
        Err(Error::Store {
            message: "registry is read-only".to_string(),
        })
    }

    fn delete_by_id(&self, id: Uuid) -> modkit_core::Result<Option<Module>> {
        self.0.delete_by_id(id)
    }
}

pub struct Fixture {
    pub host: TestHost,
    pub packages: Arc<RecordingPackageManager>,
    pub hooks: Arc<RecordingHooks>,
    pub builds: Arc<CountingBuilder>,
    pub orchestrator: Orchestrator,
    uploads: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_environment("development")
    }

    pub fn with_environment(environment: &str) -> Self {
        Self::build(environment, None)
    }

    /// A development host whose registry is `store`.
    pub fn with_store(store: Arc<dyn ModuleStore>) -> Self {
        Self::build("development", Some(store))
    }

    fn build(environment: &str, store: Option<Arc<dyn ModuleStore>>) -> Self {
        let host = TestHost::with_environment(environment);
        let config = HostConfig::load(&host.config_path()).unwrap();
        let packages = Arc::new(RecordingPackageManager::new());
        let hooks = Arc::new(RecordingHooks::default());
        let builds = Arc::new(CountingBuilder::default());

        let mut builder = Orchestrator::builder(config)
            .package_manager(packages.clone())
            .hooks(hooks.clone())
            .theme_builder(builds.clone());
        if let Some(store) = store {
            builder = builder.store(store);
        }
        let orchestrator = builder.build().unwrap();

        Self {
            host,
            packages,
            hooks,
            builds,
            orchestrator,
            uploads: TempDir::new().unwrap(),
        }
    }

    /// Build `archive` in the upload directory.
    pub fn upload(&self, archive: &ArchiveBuilder) -> PathBuf {
        archive.build(self.uploads.path())
    }

    pub fn upload_dir(&self) -> &Path {
        self.uploads.path()
    }

    /// Upload and install, returning the installed record.
    pub fn install(&self, archive: &ArchiveBuilder) -> Module {
        let path = self.upload(archive);
        let modules = self.orchestrator.install(&path).unwrap();
        let name = path.file_stem().unwrap().to_string_lossy().into_owned();
        modules.into_iter().find(|m| m.name == name).unwrap()
    }

    /// Install and activate without conflict resolutions.
    pub fn install_active(&self, archive: &ArchiveBuilder) -> Module {
        let module = self.install(archive);
        self.orchestrator.activate(module.id, &[]).unwrap();
        self.module(&module.name)
    }

    pub fn module(&self, name: &str) -> Module {
        self.orchestrator.find_by_name(name).unwrap()
    }

    pub fn modules(&self) -> Vec<Module> {
        self.orchestrator.list(&ModuleQuery::all()).unwrap()
    }

    /// Working directory of the api scope.
    pub fn api_root(&self) -> PathBuf {
        self.orchestrator.config().root.clone()
    }

    /// Working directory of the theme scope.
    pub fn theme_root(&self) -> PathBuf {
        self.orchestrator.config().current_theme_root()
    }
}
