use std::sync::Arc;

use cadence_core::CadenceConfig;
use cadence_scheduler::{Dispatcher, DispatcherHandle, JobRegistry};
use cadence_terminal::CommandExecutor;

/// Central shared state, passed as `Arc<DaemonState>` to every connection.
pub struct DaemonState {
    pub config: CadenceConfig,
    /// Read directly by `list`; mutated only through the dispatcher and the
    /// runners it spawns.
    pub registry: Arc<JobRegistry>,
    pub dispatcher: DispatcherHandle,
}

impl DaemonState {
    /// Build the registry and spawn the dispatcher task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: CadenceConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let (dispatcher, _task) =
            Dispatcher::spawn(Arc::clone(&registry), executor, config.daemon.dispatch_queue);
        Self {
            config,
            registry,
            dispatcher,
        }
    }
}
