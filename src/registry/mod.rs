//! Lifecycle registry for modules and plugins.
//!
//! A [`Registry`] owns a keyed set of [`Unit`]s and performs their
//! enable/disable transitions. The `enabled` flag only changes when a
//! transition completes: a failing enable hook leaves the unit disabled, and
//! a failing disable hook still forces it to disabled. Hook failures and
//! panics are logged and reported as `Ok(false)`; only an unknown name is an
//! error.

mod manifest;
mod unit;

pub use manifest::{Manifest, ManifestEntry};
pub use unit::{Unit, UnitContext};

use crate::error::{HookError, LoadError, RegistryError};
use dashmap::DashMap;
use futures_util::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Instrument, debug, info, warn};

/// Which population a registry holds. Plugins honour `[plugins]` overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Module,
    Plugin,
}

impl UnitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Plugin => "plugin",
        }
    }
}

/// Read-only snapshot of one registered unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitInfo {
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

struct Entry {
    description: String,
    enabled: AtomicBool,
    initialised: AtomicBool,
    unit: tokio::sync::Mutex<Box<dyn Unit>>,
}

struct Inner {
    kind: UnitKind,
    ctx: UnitContext,
    overrides: HashMap<String, bool>,
    units: DashMap<String, Arc<Entry>>,
}

/// Keyed set of lifecycle units. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

/// Run a hook future, converting a panic into [`HookError::Panicked`].
async fn contain<F>(hook: F) -> Result<(), HookError>
where
    F: Future<Output = Result<(), HookError>>,
{
    AssertUnwindSafe(hook)
        .catch_unwind()
        .await
        .unwrap_or(Err(HookError::Panicked))
}

impl Registry {
    /// A registry for modules; every unit follows its compiled-in default.
    pub fn modules(ctx: UnitContext) -> Self {
        Self::new(UnitKind::Module, ctx, HashMap::new())
    }

    /// A registry for plugins with per-name overrides (keys lower-cased).
    pub fn plugins(ctx: UnitContext, overrides: HashMap<String, bool>) -> Self {
        Self::new(UnitKind::Plugin, ctx, overrides)
    }

    fn new(kind: UnitKind, ctx: UnitContext, overrides: HashMap<String, bool>) -> Self {
        let overrides = overrides
            .into_iter()
            .map(|(name, enabled)| (name.to_lowercase(), enabled))
            .collect();
        Self {
            inner: Arc::new(Inner {
                kind,
                ctx,
                overrides,
                units: DashMap::new(),
            }),
        }
    }

    pub fn kind(&self) -> UnitKind {
        self.inner.kind
    }

    pub fn len(&self) -> usize {
        self.inner.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.units.is_empty()
    }

    fn entry(&self, name: &str) -> Result<Arc<Entry>, RegistryError> {
        self.inner
            .units
            .get(name)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Insert `unit` under its name, replacing any previous entry.
    pub fn register(&self, unit: Box<dyn Unit>) {
        let name = unit.name().to_string();
        let entry = Arc::new(Entry {
            description: unit.description().to_string(),
            enabled: AtomicBool::new(false),
            initialised: AtomicBool::new(false),
            unit: tokio::sync::Mutex::new(unit),
        });
        if self.inner.units.insert(name.clone(), entry).is_some() {
            warn!(unit = %name, kind = self.kind().as_str(), "unit already registered, overwriting");
        } else {
            debug!(unit = %name, kind = self.kind().as_str(), "unit registered");
        }
    }

    /// Whether the loader should enable a unit with this name and default.
    pub fn should_enable(&self, name: &str, default: bool) -> bool {
        match self.inner.kind {
            UnitKind::Plugin => self
                .inner
                .overrides
                .get(&name.to_lowercase())
                .copied()
                .unwrap_or(default),
            UnitKind::Module => default,
        }
    }

    async fn init_entry(&self, name: &str, entry: &Entry, unit: &mut Box<dyn Unit>) -> Result<(), HookError> {
        if entry.initialised.load(Ordering::SeqCst) {
            return Ok(());
        }
        contain(unit.init(&self.inner.ctx))
            .instrument(crate::telemetry::spans::transition(name, "init"))
            .await?;
        entry.initialised.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Enable a unit.
    ///
    /// Already enabled: `Ok(true)` without calling the hook. Hook failure:
    /// `Ok(false)` and the unit stays disabled.
    pub async fn enable(&self, name: &str) -> Result<bool, RegistryError> {
        let entry = self.entry(name)?;
        let mut unit = entry.unit.lock().await;
        if entry.enabled.load(Ordering::SeqCst) {
            return Ok(true);
        }

        let kind = self.kind().as_str();
        let result = match self.init_entry(name, &entry, &mut unit).await {
            Ok(()) => {
                contain(unit.on_enable(&self.inner.ctx))
                    .instrument(crate::telemetry::spans::transition(name, "enable"))
                    .await
            }
            Err(e) => Err(e),
        };

        crate::metrics::record_transition(kind, "enable", result.is_ok());
        match result {
            Ok(()) => {
                entry.enabled.store(true, Ordering::SeqCst);
                info!(unit = %name, kind, "enabled");
                Ok(true)
            }
            Err(e) => {
                warn!(unit = %name, kind, error = %e, code = e.error_code(), "enable failed");
                Ok(false)
            }
        }
    }

    /// Disable a unit.
    ///
    /// Already disabled: `Ok(true)`. Hook failure is logged, the unit is
    /// marked disabled anyway, and the call returns `Ok(false)`.
    pub async fn disable(&self, name: &str) -> Result<bool, RegistryError> {
        let entry = self.entry(name)?;
        let mut unit = entry.unit.lock().await;
        if !entry.enabled.load(Ordering::SeqCst) {
            return Ok(true);
        }

        let kind = self.kind().as_str();
        let result = contain(unit.on_disable(&self.inner.ctx))
            .instrument(crate::telemetry::spans::transition(name, "disable"))
            .await;
        entry.enabled.store(false, Ordering::SeqCst);
        crate::metrics::record_transition(kind, "disable", result.is_ok());

        match result {
            Ok(()) => {
                info!(unit = %name, kind, "disabled");
                Ok(true)
            }
            Err(e) => {
                warn!(unit = %name, kind, error = %e, code = e.error_code(), "disable hook failed, unit disabled anyway");
                Ok(false)
            }
        }
    }

    /// Disable every enabled unit. Failures are logged and never stop the sweep.
    pub async fn disable_all(&self) {
        for info in self.list().into_iter().filter(|u| u.enabled) {
            if let Err(e) = self.disable(&info.name).await {
                warn!(unit = %info.name, error = %e, "disable during teardown failed");
            }
        }
    }

    /// Drop every entry without running hooks. Used after `disable_all`
    /// when a session ends, so units holding registry handles are freed.
    pub fn clear(&self) {
        self.inner.units.clear();
    }

    /// Build, register, initialise and (maybe) enable every manifest entry.
    ///
    /// Invalid candidates are skipped with a warning. Plugins that will not
    /// be enabled are registered without running `init`. Returns the number
    /// of units that ended up registered.
    pub async fn load(&self, manifest: &Manifest<Box<dyn Unit>>) -> usize {
        let kind = self.kind().as_str();
        let mut loaded = 0;

        for candidate in manifest.iter() {
            let unit = match candidate.build(&self.inner.ctx.host) {
                Ok(unit) => unit,
                Err(e) => {
                    warn!(source = candidate.source(), kind, error = %e, code = e.error_code(), "skipping candidate");
                    continue;
                }
            };
            let name = unit.name().to_string();
            if name.trim().is_empty() {
                let e = LoadError::MissingName(candidate.source().to_string());
                warn!(source = candidate.source(), kind, error = %e, code = e.error_code(), "skipping candidate");
                continue;
            }

            let enable = self.should_enable(&name, unit.enabled_by_default());
            self.register(unit);

            if self.kind() == UnitKind::Module || enable {
                let entry = match self.entry(&name) {
                    Ok(entry) => entry,
                    Err(_) => continue,
                };
                let mut guard = entry.unit.lock().await;
                if let Err(hook) = self.init_entry(&name, &entry, &mut guard).await {
                    drop(guard);
                    self.inner.units.remove(&name);
                    let e = LoadError::Init(name.clone(), hook);
                    warn!(source = candidate.source(), kind, error = %e, code = e.error_code(), "skipping candidate");
                    continue;
                }
            }
            loaded += 1;

            if enable {
                // Outcome already logged by `enable`.
                let _ = self.enable(&name).await;
            } else {
                info!(unit = %name, kind, "loaded disabled");
            }
        }

        info!(kind, loaded, candidates = manifest.len(), "units loaded");
        loaded
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.units.contains_key(name)
    }

    /// `None` if no unit has this name.
    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.inner
            .units
            .get(name)
            .map(|e| e.enabled.load(Ordering::SeqCst))
    }

    /// Exact registry key for a case-insensitive `name`.
    pub fn find(&self, name: &str) -> Option<String> {
        if self.contains(name) {
            return Some(name.to_string());
        }
        self.inner
            .units
            .iter()
            .find(|e| e.key().eq_ignore_ascii_case(name))
            .map(|e| e.key().clone())
    }

    /// Snapshot of one unit.
    pub fn get(&self, name: &str) -> Option<UnitInfo> {
        self.inner.units.get(name).map(|e| UnitInfo {
            name: e.key().clone(),
            description: e.description.clone(),
            enabled: e.enabled.load(Ordering::SeqCst),
        })
    }

    /// Snapshot of every unit, sorted by name.
    pub fn list(&self) -> Vec<UnitInfo> {
        let mut units: Vec<UnitInfo> = self
            .inner
            .units
            .iter()
            .map(|e| UnitInfo {
                name: e.key().clone(),
                description: e.description.clone(),
                enabled: e.enabled.load(Ordering::SeqCst),
            })
            .collect();
        units.sort_by(|a, b| a.name.cmp(&b.name));
        units
    }
}

/// A session's module and plugin registries.
#[derive(Debug, Clone)]
pub struct Units {
    pub modules: Registry,
    pub plugins: Registry,
}

impl Units {
    /// Locate a unit by case-insensitive name, modules first.
    pub fn find(&self, name: &str) -> Option<(&Registry, String)> {
        [&self.modules, &self.plugins]
            .into_iter()
            .find_map(|registry| registry.find(name).map(|key| (registry, key)))
    }

    /// Every unit with the kind of registry holding it.
    pub fn list(&self) -> Vec<(UnitKind, UnitInfo)> {
        [&self.modules, &self.plugins]
            .into_iter()
            .flat_map(|registry| {
                let kind = registry.kind();
                registry.list().into_iter().map(move |info| (kind, info))
            })
            .collect()
    }

    /// Disable plugins, then modules.
    pub async fn disable_all(&self) {
        self.plugins.disable_all().await;
        self.modules.disable_all().await;
    }

    pub fn clear(&self) {
        self.plugins.clear();
        self.modules.clear();
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.inner.kind)
            .field("units", &self.list())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Config;
    use crate::context::{BotHandle, HostContext};
    use crate::events::Dispatcher;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use yunshen_link::Connector;
    use yunshen_link::memory::MemoryConnector;

    #[derive(Default)]
    pub(crate) struct Calls {
        pub init: AtomicUsize,
        pub enable: AtomicUsize,
        pub disable: AtomicUsize,
    }

    /// A unit whose hooks count calls and fail on demand.
    pub(crate) struct Counting {
        pub name: String,
        pub default_on: bool,
        pub calls: Arc<Calls>,
        pub fail_init: bool,
        pub fail_enable: Arc<AtomicBool>,
        pub fail_disable: bool,
    }

    impl Counting {
        pub(crate) fn new(name: &str, calls: &Arc<Calls>) -> Self {
            Self {
                name: name.to_string(),
                default_on: true,
                calls: Arc::clone(calls),
                fail_init: false,
                fail_enable: Arc::new(AtomicBool::new(false)),
                fail_disable: false,
            }
        }
    }

    #[async_trait]
    impl Unit for Counting {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "counts hook calls"
        }

        fn enabled_by_default(&self) -> bool {
            self.default_on
        }

        async fn init(&mut self, _ctx: &UnitContext) -> Result<(), HookError> {
            self.calls.init.fetch_add(1, Ordering::SeqCst);
            if self.fail_init {
                return Err(HookError::failed("init refused"));
            }
            Ok(())
        }

        async fn on_enable(&mut self, _ctx: &UnitContext) -> Result<(), HookError> {
            self.calls.enable.fetch_add(1, Ordering::SeqCst);
            if self.fail_enable.load(Ordering::SeqCst) {
                return Err(HookError::failed("enable refused"));
            }
            Ok(())
        }

        async fn on_disable(&mut self, _ctx: &UnitContext) -> Result<(), HookError> {
            self.calls.disable.fetch_add(1, Ordering::SeqCst);
            if self.fail_disable {
                return Err(HookError::failed("disable refused"));
            }
            Ok(())
        }
    }

    pub(crate) async fn unit_context() -> UnitContext {
        let config = Config::default();
        let link = MemoryConnector::new()
            .connect(&config.connect_options())
            .await
            .unwrap();
        UnitContext {
            bot: BotHandle::new(link.connection),
            dispatcher: Dispatcher::new(),
            host: HostContext::new(Arc::new(config)),
        }
    }

    #[tokio::test]
    async fn test_enable_twice_runs_hook_once() {
        let registry = Registry::modules(unit_context().await);
        let calls = Arc::new(Calls::default());
        registry.register(Box::new(Counting::new("Greeter", &calls)));

        assert_eq!(registry.enable("Greeter").await, Ok(true));
        assert_eq!(registry.enable("Greeter").await, Ok(true));
        assert_eq!(calls.enable.load(Ordering::SeqCst), 1);
        assert_eq!(calls.init.load(Ordering::SeqCst), 1);
        assert_eq!(registry.is_enabled("Greeter"), Some(true));
    }

    #[tokio::test]
    async fn test_failing_enable_hook_leaves_unit_disabled() {
        let registry = Registry::modules(unit_context().await);
        let calls = Arc::new(Calls::default());
        let unit = Counting::new("Flaky", &calls);
        let fail = Arc::clone(&unit.fail_enable);
        fail.store(true, Ordering::SeqCst);
        registry.register(Box::new(unit));

        assert_eq!(registry.enable("Flaky").await, Ok(false));
        assert_eq!(registry.is_enabled("Flaky"), Some(false));

        // A later attempt runs the hook again and can succeed.
        fail.store(false, Ordering::SeqCst);
        assert_eq!(registry.enable("Flaky").await, Ok(true));
        assert_eq!(calls.enable.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failing_disable_hook_still_disables() {
        let registry = Registry::modules(unit_context().await);
        let calls = Arc::new(Calls::default());
        let mut unit = Counting::new("Sticky", &calls);
        unit.fail_disable = true;
        registry.register(Box::new(unit));

        registry.enable("Sticky").await.unwrap();
        assert_eq!(registry.disable("Sticky").await, Ok(false));
        assert_eq!(registry.is_enabled("Sticky"), Some(false));
        // Already disabled: no further hook call.
        assert_eq!(registry.disable("Sticky").await, Ok(true));
        assert_eq!(calls.disable.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_name_is_not_found() {
        let registry = Registry::modules(unit_context().await);
        assert_eq!(
            registry.enable("ghost").await,
            Err(RegistryError::NotFound("ghost".into()))
        );
        assert_eq!(
            registry.disable("ghost").await,
            Err(RegistryError::NotFound("ghost".into()))
        );
        assert_eq!(registry.is_enabled("ghost"), None);
    }

    #[tokio::test]
    async fn test_register_overwrites_by_name() {
        let registry = Registry::modules(unit_context().await);
        let first = Arc::new(Calls::default());
        let second = Arc::new(Calls::default());
        registry.register(Box::new(Counting::new("Dup", &first)));
        registry.register(Box::new(Counting::new("Dup", &second)));

        registry.enable("Dup").await.unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(first.enable.load(Ordering::SeqCst), 0);
        assert_eq!(second.enable.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_three_valid_two_invalid() {
        let registry = Registry::modules(unit_context().await);
        let calls = Arc::new(Calls::default());
        let (a, b, c, d) = (
            Arc::clone(&calls),
            Arc::clone(&calls),
            Arc::clone(&calls),
            Arc::clone(&calls),
        );
        let manifest: Manifest<Box<dyn Unit>> = Manifest::new()
            .with("modules/alpha", move |_| Box::new(Counting::new("Alpha", &a)) as Box<dyn Unit>)
            .with("modules/unnamed", move |_| Box::new(Counting::new("  ", &b)) as Box<dyn Unit>)
            .with("modules/beta", move |_| Box::new(Counting::new("Beta", &c)) as Box<dyn Unit>)
            .with_fallible("modules/broken", |_| {
                Err(LoadError::Factory {
                    source_key: "modules/broken".into(),
                    reason: "missing dependency".into(),
                })
            })
            .with("modules/gamma", move |_| {
                let mut unit = Counting::new("Gamma", &d);
                unit.default_on = false;
                Box::new(unit) as Box<dyn Unit>
            });

        assert_eq!(registry.load(&manifest).await, 3);
        assert_eq!(registry.is_enabled("Alpha"), Some(true));
        assert_eq!(registry.is_enabled("Beta"), Some(true));
        assert_eq!(registry.is_enabled("Gamma"), Some(false));
        // Modules are initialised even when they start disabled.
        assert_eq!(calls.init.load(Ordering::SeqCst), 3);
        assert_eq!(calls.enable.load(Ordering::SeqCst), 2);
    }

    /// Counts WARN events seen while installed as the thread's default.
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn test_load_warns_once_per_invalid_candidate() {
        use tracing_subscriber::layer::SubscriberExt;

        let registry = Registry::modules(unit_context().await);
        let calls = Arc::new(Calls::default());
        let (a, b, c) = (Arc::clone(&calls), Arc::clone(&calls), Arc::clone(&calls));
        let manifest: Manifest<Box<dyn Unit>> = Manifest::new()
            .with("modules/alpha", move |_| Box::new(Counting::new("Alpha", &a)) as Box<dyn Unit>)
            .with("modules/unnamed", |_| {
                Box::new(Counting::new("", &Arc::new(Calls::default()))) as Box<dyn Unit>
            })
            .with("modules/beta", move |_| Box::new(Counting::new("Beta", &b)) as Box<dyn Unit>)
            .with_fallible("modules/broken", |_| {
                Err(LoadError::Factory {
                    source_key: "modules/broken".into(),
                    reason: "missing dependency".into(),
                })
            })
            .with("modules/gamma", move |_| Box::new(Counting::new("Gamma", &c)) as Box<dyn Unit>);

        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));
        let loaded = {
            let _guard = tracing::subscriber::set_default(subscriber);
            registry.load(&manifest).await
        };

        assert_eq!(loaded, 3);
        assert_eq!(warnings.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_load_drops_candidate_whose_init_fails() {
        let registry = Registry::modules(unit_context().await);
        let calls = Arc::new(Calls::default());
        let c = Arc::clone(&calls);
        let manifest: Manifest<Box<dyn Unit>> = Manifest::new().with("modules/bad", move |_| {
            let mut unit = Counting::new("Bad", &c);
            unit.fail_init = true;
            Box::new(unit) as Box<dyn Unit>
        });

        assert_eq!(registry.load(&manifest).await, 0);
        assert!(!registry.contains("Bad"));
        assert_eq!(calls.enable.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_plugin_overrides_win_and_skip_init() {
        let overrides = HashMap::from([
            ("autoresponder".to_string(), false),
            ("PathFinder".to_string(), true),
        ]);
        let registry = Registry::plugins(unit_context().await, overrides);
        let on_by_default = Arc::new(Calls::default());
        let off_by_default = Arc::new(Calls::default());
        let (a, b) = (Arc::clone(&on_by_default), Arc::clone(&off_by_default));

        let manifest: Manifest<Box<dyn Unit>> = Manifest::new()
            .with("plugins/auto", move |_| Box::new(Counting::new("AutoResponder", &a)) as Box<dyn Unit>)
            .with("plugins/path", move |_| {
                let mut unit = Counting::new("PathFinder", &b);
                unit.default_on = false;
                Box::new(unit) as Box<dyn Unit>
            });

        assert_eq!(registry.load(&manifest).await, 2);
        assert_eq!(registry.is_enabled("AutoResponder"), Some(false));
        assert_eq!(registry.is_enabled("PathFinder"), Some(true));
        assert_eq!(on_by_default.init.load(Ordering::SeqCst), 0);
        assert_eq!(off_by_default.init.load(Ordering::SeqCst), 1);

        // Enabling later runs the deferred init first.
        assert_eq!(registry.enable("AutoResponder").await, Ok(true));
        assert_eq!(on_by_default.init.load(Ordering::SeqCst), 1);
        assert_eq!(on_by_default.enable.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disable_all_and_inspection() {
        let registry = Registry::modules(unit_context().await);
        let calls = Arc::new(Calls::default());
        for name in ["b-unit", "a-unit", "c-unit"] {
            registry.register(Box::new(Counting::new(name, &calls)));
        }
        registry.enable("a-unit").await.unwrap();
        registry.enable("c-unit").await.unwrap();

        let names: Vec<_> = registry.list().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["a-unit", "b-unit", "c-unit"]);
        assert_eq!(registry.find("A-UNIT").as_deref(), Some("a-unit"));
        assert_eq!(registry.get("c-unit").map(|u| u.enabled), Some(true));

        registry.disable_all().await;
        assert!(registry.list().iter().all(|u| !u.enabled));
        assert_eq!(calls.disable.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_panicking_hook_is_contained() {
        struct Panicky;

        #[async_trait]
        impl Unit for Panicky {
            fn name(&self) -> &str {
                "Panicky"
            }

            async fn on_enable(&mut self, _ctx: &UnitContext) -> Result<(), HookError> {
                panic!("hook exploded");
            }
        }

        let registry = Registry::modules(unit_context().await);
        registry.register(Box::new(Panicky));
        assert_eq!(registry.enable("Panicky").await, Ok(false));
        assert_eq!(registry.is_enabled("Panicky"), Some(false));
    }
}
