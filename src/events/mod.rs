//! Event dispatch.
//!
//! The [`Dispatcher`] maps event names to ordered handler lists. Each inbound
//! event is delivered to its handlers sequentially, in subscription order,
//! with every invocation isolated: an error or panic is logged with the
//! event and handler name and dispatch moves on to the next handler.

pub mod builtin;
mod handler;

pub use handler::EventHandler;

use crate::context::{BotHandle, HostContext};
use crate::error::{DispatchError, LoadError};
use crate::registry::Manifest;
use futures_util::FutureExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Instrument, debug, warn};
use yunshen_link::Event;

/// Handle returned by [`Dispatcher::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
struct Subscription {
    id: SubscriptionId,
    handler: Arc<dyn EventHandler>,
    /// Set once a `once` handler has been handed an occurrence.
    spent: Option<Arc<AtomicBool>>,
}

#[derive(Default)]
struct Subscriptions {
    next_id: u64,
    by_event: HashMap<String, Vec<Subscription>>,
}

/// Outcome of one [`Dispatcher::dispatch`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers invoked.
    pub delivered: usize,
    /// Invocations that returned an error or panicked.
    pub failed: usize,
}

/// Fans events out to subscribed handlers. Cheap to clone.
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Arc<Mutex<Subscriptions>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the handlers of `event`.
    pub fn subscribe(&self, event: &str, handler: Arc<dyn EventHandler>) -> SubscriptionId {
        let mut subs = self.inner.lock();
        subs.next_id += 1;
        let id = SubscriptionId(subs.next_id);
        let spent = handler.once().then(|| Arc::new(AtomicBool::new(false)));
        debug!(event = %event, handler = %handler.name(), once = spent.is_some(), "subscribed");
        subs.by_event
            .entry(event.to_string())
            .or_default()
            .push(Subscription { id, handler, spent });
        id
    }

    /// Subscribe each pair in order.
    pub fn subscribe_many<I, S>(&self, handlers: I) -> Vec<SubscriptionId>
    where
        I: IntoIterator<Item = (S, Arc<dyn EventHandler>)>,
        S: AsRef<str>,
    {
        handlers
            .into_iter()
            .map(|(event, handler)| self.subscribe(event.as_ref(), handler))
            .collect()
    }

    /// Remove one subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.inner.lock();
        for list in subs.by_event.values_mut() {
            if let Some(pos) = list.iter().position(|s| s.id == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Drop every subscription.
    pub fn clear(&self) {
        self.inner.lock().by_event.clear();
    }

    /// Number of subscriptions for `event`, spent `once` entries included.
    pub fn handler_count(&self, event: &str) -> usize {
        self.inner
            .lock()
            .by_event
            .get(event)
            .map_or(0, Vec::len)
    }

    /// Load every handler in `manifest`, skipping invalid candidates.
    ///
    /// Returns the number of handlers subscribed.
    pub fn load(&self, manifest: &Manifest<Arc<dyn EventHandler>>, host: &HostContext) -> usize {
        let mut loaded = 0;
        for entry in manifest.iter() {
            let handler = match entry.build(host) {
                Ok(handler) if handler.name().trim().is_empty() => {
                    let err = LoadError::MissingName(entry.source().to_string());
                    warn!(source = entry.source(), error = %err, "skipping event handler");
                    continue;
                }
                Ok(handler) => handler,
                Err(e) => {
                    warn!(source = entry.source(), error = %e, "skipping event handler");
                    continue;
                }
            };
            let event = handler.event().unwrap_or(entry.source()).to_string();
            self.subscribe(&event, handler);
            loaded += 1;
        }
        debug!(loaded, candidates = manifest.len(), "event handlers loaded");
        loaded
    }

    /// Deliver `event` to its handlers, one after another.
    pub async fn dispatch(&self, bot: &BotHandle, event: &Event) -> DispatchReport {
        // Snapshot so handlers may (un)subscribe while running.
        let targets: Vec<Subscription> = match self.inner.lock().by_event.get(&event.name) {
            Some(list) => list.clone(),
            None => return DispatchReport::default(),
        };
        crate::metrics::record_event(&event.name);

        let mut report = DispatchReport::default();
        let span = crate::telemetry::spans::dispatch(&event.name);
        async {
            for sub in targets {
                if let Some(spent) = &sub.spent {
                    if spent.swap(true, Ordering::SeqCst) {
                        continue;
                    }
                }
                report.delivered += 1;
                let outcome = AssertUnwindSafe(sub.handler.execute(bot, event))
                    .catch_unwind()
                    .await
                    .unwrap_or(Err(DispatchError::Panicked));
                if let Err(e) = outcome {
                    report.failed += 1;
                    crate::metrics::record_handler_failure(&event.name, e.error_code());
                    warn!(
                        event = %event.name,
                        handler = %sub.handler.name(),
                        error = %e,
                        "event handler failed"
                    );
                }
            }
        }
        .instrument(span)
        .await;
        report
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subs = self.inner.lock();
        let mut map = f.debug_map();
        for (event, list) in &subs.by_event {
            map.entry(event, &list.len());
        }
        map.finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Config;
    use async_trait::async_trait;
    use yunshen_link::Connector;
    use yunshen_link::memory::MemoryConnector;

    /// Records its label into a shared log; fails or panics on demand.
    pub(crate) struct Probe {
        pub label: &'static str,
        pub log: Arc<Mutex<Vec<&'static str>>>,
        pub mode: ProbeMode,
        pub once: bool,
    }

    #[derive(Clone, Copy)]
    pub(crate) enum ProbeMode {
        Ok,
        Fail,
        Panic,
    }

    #[async_trait]
    impl EventHandler for Probe {
        fn name(&self) -> &str {
            self.label
        }

        fn once(&self) -> bool {
            self.once
        }

        async fn execute(&self, _bot: &BotHandle, _event: &Event) -> Result<(), DispatchError> {
            self.log.lock().push(self.label);
            match self.mode {
                ProbeMode::Ok => Ok(()),
                ProbeMode::Fail => Err(DispatchError::Failed("probe failure".into())),
                ProbeMode::Panic => panic!("probe panic"),
            }
        }
    }

    pub(crate) fn probe(
        label: &'static str,
        log: &Arc<Mutex<Vec<&'static str>>>,
        mode: ProbeMode,
    ) -> Arc<dyn EventHandler> {
        Arc::new(Probe {
            label,
            log: Arc::clone(log),
            mode,
            once: false,
        })
    }

    pub(crate) async fn test_bot() -> BotHandle {
        let link = MemoryConnector::new()
            .connect(&Config::default().connect_options())
            .await
            .unwrap();
        BotHandle::new(link.connection)
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_stop_the_rest() {
        let bot = test_bot().await;
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new();
        dispatcher.subscribe_many([
            ("chat", probe("h1", &log, ProbeMode::Ok)),
            ("chat", probe("h2", &log, ProbeMode::Fail)),
            ("chat", probe("h3", &log, ProbeMode::Ok)),
        ]);

        let report = dispatcher.dispatch(&bot, &Event::chat("Alice", "hi")).await;
        assert_eq!(*log.lock(), vec!["h1", "h2", "h3"]);
        assert_eq!(report, DispatchReport { delivered: 3, failed: 1 });
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        let bot = test_bot().await;
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new();
        dispatcher.subscribe("death", probe("boom", &log, ProbeMode::Panic));
        dispatcher.subscribe("death", probe("after", &log, ProbeMode::Ok));

        let report = dispatcher.dispatch(&bot, &Event::bare("death")).await;
        assert_eq!(*log.lock(), vec!["boom", "after"]);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_once_handler_runs_once_but_stays_registered() {
        let bot = test_bot().await;
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new();
        dispatcher.subscribe(
            "spawn",
            Arc::new(Probe {
                label: "greet",
                log: Arc::clone(&log),
                mode: ProbeMode::Ok,
                once: true,
            }),
        );

        dispatcher.dispatch(&bot, &Event::bare("spawn")).await;
        let second = dispatcher.dispatch(&bot, &Event::bare("spawn")).await;
        assert_eq!(*log.lock(), vec!["greet"]);
        assert_eq!(second.delivered, 0);
        assert_eq!(dispatcher.handler_count("spawn"), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_and_unknown_event() {
        let bot = test_bot().await;
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new();
        let id = dispatcher.subscribe("chat", probe("gone", &log, ProbeMode::Ok));
        dispatcher.subscribe("chat", probe("kept", &log, ProbeMode::Ok));

        assert!(dispatcher.unsubscribe(id));
        assert!(!dispatcher.unsubscribe(id));
        dispatcher.dispatch(&bot, &Event::chat("Bob", "x")).await;
        let report = dispatcher.dispatch(&bot, &Event::bare("rain")).await;

        assert_eq!(*log.lock(), vec!["kept"]);
        assert_eq!(report, DispatchReport::default());
    }

    #[tokio::test]
    async fn test_load_skips_invalid_candidates() {
        let host = HostContext::new(Arc::new(Config::default()));
        let log = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
        let manifest: Manifest<Arc<dyn EventHandler>> = Manifest::new()
            .with("chat", move |_| probe("one", &a, ProbeMode::Ok))
            .with("spawn", move |_| probe("", &b, ProbeMode::Ok))
            .with_fallible("death", |_| {
                Err(LoadError::Factory {
                    source_key: "death".into(),
                    reason: "bad".into(),
                })
            })
            .with("chat", move |_| probe("two", &c, ProbeMode::Ok));

        let dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.load(&manifest, &host), 2);
        assert_eq!(dispatcher.handler_count("chat"), 2);
        assert_eq!(dispatcher.handler_count("spawn"), 0);
    }
}
