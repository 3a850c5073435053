//! Process lifecycle: RUNNING -> DRAINING -> TERMINATED.
//!
//! A termination signal or an unrecoverable fault cancels the shared token. The server
//! stops accepting connections and drains in-flight requests; if draining outlasts the
//! grace period the server task is aborted so the process can never hang on a stuck
//! connection.

use axum::Router;
use std::any::Any;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Running,
    Draining,
    Terminated,
}

/// Why the process is stopping. The first trigger wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trigger {
    Signal(&'static str),
    Fault(String),
}

#[derive(Debug)]
pub struct Outcome {
    pub trigger: Trigger,
    /// The grace period elapsed before the listener closed.
    pub forced: bool,
}

impl Outcome {
    pub fn status(&self) -> u8 {
        match self.trigger {
            Trigger::Signal(_) => 0,
            Trigger::Fault(_) => 1,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.status())
    }
}

struct Inner {
    token: CancellationToken,
    trigger: Mutex<Option<Trigger>>,
    phase: watch::Sender<Phase>,
    grace: Duration,
}

#[derive(Clone)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

impl Shutdown {
    pub fn new(grace: Duration) -> Self {
        let (phase, _) = watch::channel(Phase::Running);
        Shutdown {
            inner: Arc::new(Inner {
                token: CancellationToken::new(),
                trigger: Mutex::new(None),
                phase,
                grace,
            }),
        }
    }

    pub fn phase(&self) -> Phase {
        *self.inner.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.inner.phase.subscribe()
    }

    pub fn token(&self) -> CancellationToken {
        self.inner.token.clone()
    }

    /// Move RUNNING -> DRAINING. Returns false if shutdown was already under way.
    pub fn request(&self, trigger: Trigger) -> bool {
        let mut current = self.inner.trigger.lock().unwrap_or_else(|e| e.into_inner());
        if current.is_some() {
            tracing::debug!(?trigger, "shutdown already requested");
            return false;
        }
        match &trigger {
            Trigger::Signal(name) => tracing::info!(signal = name, "shutdown requested, draining"),
            Trigger::Fault(reason) => tracing::error!(reason = %reason, "unrecoverable fault, draining"),
        }
        *current = Some(trigger);
        self.inner.phase.send_replace(Phase::Draining);
        self.inner.token.cancel();
        true
    }

    pub fn signal(&self, name: &'static str) -> bool {
        self.request(Trigger::Signal(name))
    }

    pub fn fault(&self, reason: impl Into<String>) -> bool {
        self.request(Trigger::Fault(reason.into()))
    }

    /// Final transition, after the listener closed and the store was released.
    pub fn terminate(&self) {
        self.inner.phase.send_replace(Phase::Terminated);
        tracing::info!("terminated");
    }

    fn outcome(&self, forced: bool) -> Outcome {
        let trigger = self
            .inner
            .trigger
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .unwrap_or_else(|| Trigger::Fault("server stopped without a shutdown request".into()));
        Outcome { trigger, forced }
    }

    /// Request shutdown on SIGINT or SIGTERM. The task ends quietly if shutdown starts otherwise.
    pub fn listen_for_signals(&self) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                name = wait_for_signal() => {
                    this.signal(name);
                }
                _ = this.inner.token.cancelled() => {}
            }
        })
    }

    /// Serve `app` until a trigger fires, then drain within the grace period.
    /// A server that stops or panics on its own is treated as a fault.
    pub async fn serve(&self, listener: TcpListener, app: Router) -> Outcome {
        let token = self.token();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
        });

        tokio::select! {
            res = &mut server => {
                if !self.inner.token.is_cancelled() {
                    let reason = match res {
                        Ok(Ok(())) => "server stopped unexpectedly".to_string(),
                        Ok(Err(e)) => format!("server error: {}", e),
                        Err(e) => format!("server task failed: {}", e),
                    };
                    self.fault(reason);
                }
                return self.outcome(false);
            }
            _ = self.inner.token.cancelled() => {}
        }

        let forced = match tokio::time::timeout(self.inner.grace, &mut server).await {
            Ok(Ok(Ok(()))) => {
                tracing::info!("listener closed");
                false
            }
            Ok(Ok(Err(e))) => {
                tracing::error!(error = %e, "server error while draining");
                false
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "server task failed while draining");
                false
            }
            Err(_) => {
                tracing::warn!(grace = ?self.inner.grace, "grace period elapsed, forcing shutdown");
                server.abort();
                true
            }
        };
        self.outcome(forced)
    }
}

async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGINT handler");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = ctrl_c => name,
        name = terminate => name,
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic")
}

/// Route every panic through tracing so faults land in the structured log.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        tracing::error!(location = %location, panic = %panic_message(info.payload()), "panic");
    }));
}
