use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::action::{ActionKind, Request};
use super::executor::BackgroundExecutor;
use crate::error::{BridgeError, BridgeResult};
use crate::permissions::{Capability, GrantResult, PermissionHost};
use crate::storage::FileMaterializer;

/// Result a request resolves to: the resolved path, or `None` when `exists`
/// found nothing
pub type Outcome = BridgeResult<Option<PathBuf>>;

/// Dispatcher tuning
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Requests that may wait for the gate before submissions are refused
    pub queue_capacity: usize,
    /// Upper bound on a single permission round trip
    pub permission_timeout: Duration,
    /// Whether `exists` requires the same permissions as writes
    pub gate_exists: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 32,
            permission_timeout: Duration::from_secs(60),
            gate_exists: true,
        }
    }
}

/// Handle to a submitted request
pub struct RequestHandle {
    id: Uuid,
    kind: ActionKind,
    rx: oneshot::Receiver<Outcome>,
}

impl RequestHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Wait for the request to resolve
    pub async fn outcome(self) -> Outcome {
        self.rx.await.unwrap_or(Err(BridgeError::Dropped))
    }
}

struct Pending {
    request: Request,
    reply: oneshot::Sender<Outcome>,
}

/// Permission-gated dispatcher for storage requests
///
/// Submissions are queued and drained by a single gate task in submission
/// order, so at most one permission request is outstanding at any time.
/// Once a request clears the gate its file operation runs on the background
/// executor and the outcome is delivered exactly once on the request's handle.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<Pending>,
}

impl Dispatcher {
    /// Start the gate task on the current tokio runtime
    pub fn spawn(
        config: DispatcherConfig,
        permissions: Arc<dyn PermissionHost>,
        materializer: FileMaterializer,
        executor: Arc<dyn BackgroundExecutor>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));

        let gate = Gate {
            config,
            permissions,
            materializer,
            executor,
        };
        tokio::spawn(gate.run(rx));

        Self { tx }
    }

    /// Submit an action by name with its positional arguments
    ///
    /// Unknown actions, missing arguments and a full queue are refused here
    /// without side effects. Everything else resolves through the handle.
    pub fn submit(&self, action: &str, args: Vec<String>) -> BridgeResult<RequestHandle> {
        let request = Request::from_args(action, args)?;
        self.enqueue(request)
    }

    /// Queue an already-built request
    pub fn enqueue(&self, request: Request) -> BridgeResult<RequestHandle> {
        let (reply, rx) = oneshot::channel();
        let handle = RequestHandle {
            id: request.id,
            kind: request.kind,
            rx,
        };

        debug!("Admitting request {:?}", request);

        self.tx
            .try_send(Pending { request, reply })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    warn!("Request queue full, refusing {}", handle.id);
                    BridgeError::Busy
                }
                mpsc::error::TrySendError::Closed(_) => BridgeError::Dropped,
            })?;

        Ok(handle)
    }

    pub async fn download_audio_file(&self, filename: &str, base64: &str) -> BridgeResult<PathBuf> {
        let handle = self.enqueue(Request::download_audio_file(filename, base64))?;
        handle
            .outcome()
            .await?
            .ok_or_else(|| BridgeError::Io(format!("No path produced for {}", filename)))
    }

    pub async fn exists(&self, filename: &str) -> Outcome {
        self.enqueue(Request::exists(filename))?.outcome().await
    }
}

struct Gate {
    config: DispatcherConfig,
    permissions: Arc<dyn PermissionHost>,
    materializer: FileMaterializer,
    executor: Arc<dyn BackgroundExecutor>,
}

impl Gate {
    async fn run(self, mut rx: mpsc::Receiver<Pending>) {
        info!("Dispatcher gate started");

        while let Some(pending) = rx.recv().await {
            self.handle(pending).await;
        }

        info!("Dispatcher gate stopped");
    }

    async fn handle(&self, pending: Pending) {
        let Pending { request, reply } = pending;

        info!(
            "Processing {} for {} (request {})",
            request.kind, request.filename, request.id
        );

        if self.requires_permissions(request.kind) {
            if let Err(e) = self.ensure_permissions().await {
                warn!("Request {} not executed: {}", request.id, e);
                if reply.send(Err(e)).is_err() {
                    debug!("Requester for {} went away", request.id);
                }
                return;
            }
        }

        self.execute(request, reply);
    }

    fn requires_permissions(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::DownloadAudioFile => true,
            ActionKind::Exists => self.config.gate_exists,
        }
    }

    /// Request missing capabilities one at a time until both are held
    ///
    /// Both capabilities are re-queried after every grant. Each capability is
    /// requested at most once per request; a capability still missing after
    /// a reported grant counts as denied.
    async fn ensure_permissions(&self) -> BridgeResult<()> {
        let mut requested: Vec<Capability> = Vec::with_capacity(2);

        while let Some(capability) = self.next_missing() {
            if requested.contains(&capability) {
                warn!("{} still missing after being granted", capability);
                return Err(BridgeError::PermissionDenied);
            }
            requested.push(capability);

            info!("Requesting permission {}", capability);
            let results = tokio::time::timeout(
                self.config.permission_timeout,
                self.permissions.request_permission(capability),
            )
            .await
            .map_err(|_| {
                error!("Permission request for {} timed out", capability);
                BridgeError::PermissionTimeout(capability)
            })?;

            if results.iter().any(|r| *r == GrantResult::Denied) {
                warn!("Permission {} denied", capability);
                return Err(BridgeError::PermissionDenied);
            }
            debug!("Permission {} granted", capability);
        }

        Ok(())
    }

    /// Storage write is asked for only once audio is held
    fn next_missing(&self) -> Option<Capability> {
        let audio = self.permissions.has_permission(Capability::RecordAudio);
        let write = self
            .permissions
            .has_permission(Capability::WriteExternalStorage);

        match (audio, write) {
            (true, true) => None,
            (true, false) => Some(Capability::WriteExternalStorage),
            (false, _) => Some(Capability::RecordAudio),
        }
    }

    fn execute(&self, request: Request, reply: oneshot::Sender<Outcome>) {
        let materializer = self.materializer.clone();

        self.executor.execute(Box::new(move || {
            let outcome = run_request(&materializer, &request);

            match &outcome {
                Ok(Some(path)) => info!("Request {} resolved to {}", request.id, path.display()),
                Ok(None) => info!("Request {} resolved to absent", request.id),
                Err(e) => error!("Request {} failed: {}", request.id, e),
            }

            if reply.send(outcome).is_err() {
                debug!("Requester for {} went away", request.id);
            }
        }));
    }
}

fn run_request(materializer: &FileMaterializer, request: &Request) -> Outcome {
    match (request.kind, request.payload.as_deref()) {
        (ActionKind::DownloadAudioFile, Some(payload)) => materializer
            .download_audio_file(&request.filename, payload)
            .map(Some),
        (ActionKind::DownloadAudioFile, None) => Err(BridgeError::MissingArgument {
            action: request.kind.as_str().to_string(),
            index: 1,
        }),
        (ActionKind::Exists, _) => materializer.exists(&request.filename),
    }
}
