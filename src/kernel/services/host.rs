use std::future::Future;
use std::sync::mpsc::{RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use super::bus::{kernel_bus, KernelBusReceiver, KernelBusSender, KernelMessage};
use super::ports::{AsyncExecutor, RuntimeGateway};
use crate::kernel::{Action, Effect};

/// Owns the receiving end of the kernel bus and the gateway effects run against.
pub struct KernelServiceHost {
    bus: KernelBusSender,
    rx: KernelBusReceiver,
    executor: Arc<dyn AsyncExecutor>,
    gateway: Arc<dyn RuntimeGateway>,
}

#[derive(Clone)]
pub struct KernelServiceContext {
    bus: KernelBusSender,
    executor: Arc<dyn AsyncExecutor>,
    gateway: Arc<dyn RuntimeGateway>,
}

impl KernelServiceHost {
    pub fn new(executor: Arc<dyn AsyncExecutor>, gateway: Arc<dyn RuntimeGateway>) -> Self {
        let (bus, rx) = kernel_bus();
        Self {
            bus,
            rx,
            executor,
            gateway,
        }
    }

    pub fn context(&self) -> KernelServiceContext {
        KernelServiceContext {
            bus: self.bus.clone(),
            executor: Arc::clone(&self.executor),
            gateway: Arc::clone(&self.gateway),
        }
    }

    pub fn sender(&self) -> KernelBusSender {
        self.bus.clone()
    }

    pub fn try_recv(&mut self) -> Result<KernelMessage, TryRecvError> {
        self.rx.try_recv()
    }

    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<KernelMessage, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Starts every gateway effect and returns the rest for the UI to handle.
    pub fn execute(&self, effects: Vec<Effect>) -> Vec<Effect> {
        let ctx = self.context();
        effects
            .into_iter()
            .filter_map(|effect| ctx.execute(effect))
            .collect()
    }
}

impl KernelServiceContext {
    pub fn spawn_future<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.executor.spawn(Box::pin(task));
    }

    pub fn execute(&self, effect: Effect) -> Option<Effect> {
        let bus = self.bus.clone();
        match effect {
            Effect::InitializeRuntime(config) => {
                let init = self.gateway.initialize(config);
                self.spawn_future(async move {
                    let result = init.await;
                    let _ = bus.send_action(Action::RuntimeInitialized(result));
                });
                None
            }
            Effect::RunCode { generation, code } => {
                tracing::debug!(generation, bytes = code.len(), "dispatching run to gateway");
                let run = self.gateway.run(code);
                self.spawn_future(async move {
                    let outcome = run.await;
                    let _ = bus.send_action(Action::RunFinished {
                        generation,
                        outcome,
                    });
                });
                None
            }
            Effect::RunTerminalCommand { line } => {
                let eval = self.gateway.eval_line(line);
                self.spawn_future(async move {
                    let outcome = eval.await;
                    let _ = bus.send_action(Action::TerminalFinished { outcome });
                });
                None
            }
            Effect::LoadPackage { name } => {
                let load = self.gateway.load_package(name.clone());
                self.spawn_future(async move {
                    let result = load.await;
                    let _ = bus.send_action(Action::PackageLoaded { name, result });
                });
                None
            }
            other => Some(other),
        }
    }
}
