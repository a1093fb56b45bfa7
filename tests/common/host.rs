//! A supervisor running on a background task, plus the connector script.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use yunshen::config::Config;
use yunshen::context::HostContext;
use yunshen::error::ConnectionFailure;
use yunshen::supervisor::{Manifests, Supervisor, SupervisorHandle, SupervisorState};
use yunshen_link::memory::{Attempt, MemoryConnector, MemoryServer};

/// Generous upper bound for anything a test waits on.
const WAIT: Duration = Duration::from_secs(600);

pub struct TestHost {
    pub connector: MemoryConnector,
    pub host: HostContext,
    pub handle: SupervisorHandle,
    task: JoinHandle<Result<(), ConnectionFailure>>,
}

#[allow(dead_code)]
impl TestHost {
    /// Spawn a supervisor with the bundled manifests.
    pub fn spawn(config: Config, script: impl IntoIterator<Item = Attempt>) -> Self {
        Self::spawn_with(config, script, Manifests::builtin())
    }

    pub fn spawn_with(
        config: Config,
        script: impl IntoIterator<Item = Attempt>,
        manifests: Manifests,
    ) -> Self {
        let connector = MemoryConnector::scripted(script);
        let host = HostContext::new(Arc::new(config));
        let supervisor = Supervisor::new(host.clone(), Arc::new(connector.clone()), manifests);
        let handle = supervisor.handle();
        let task = tokio::spawn(supervisor.run());
        Self {
            connector,
            host,
            handle,
            task,
        }
    }

    /// Server side of the next connection the supervisor opens.
    pub async fn next_server(&self) -> MemoryServer {
        tokio::time::timeout(WAIT, self.connector.next_server())
            .await
            .expect("timed out waiting for a connection")
            .expect("connector dropped")
    }

    /// Next connection, once the supervisor has finished wiring its session.
    pub async fn next_ready(&self) -> MemoryServer {
        let server = self.next_server().await;
        self.ready().await;
        server
    }

    pub async fn ready(&self) {
        let reached = tokio::time::timeout(WAIT, self.handle.reached(SupervisorState::Ready))
            .await
            .expect("timed out waiting for ready");
        assert!(reached, "supervisor exited before ready");
    }

    /// Request shutdown and wait for the supervisor to return.
    pub async fn shutdown(self) -> Result<(), ConnectionFailure> {
        self.handle.shutdown();
        self.join().await
    }

    pub async fn join(self) -> Result<(), ConnectionFailure> {
        tokio::time::timeout(WAIT, self.task)
            .await
            .expect("supervisor did not stop")
            .expect("supervisor task panicked")
    }
}

/// Defaults, with a chat-free auto-responder so replies are deterministic.
#[allow(dead_code)]
pub fn quiet_config() -> Config {
    let mut config = Config::default();
    config.auto_responder.replies.clear();
    config
}
