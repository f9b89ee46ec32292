use tokio::runtime::Handle;

/// Unit of work handed to a background executor
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs blocking work off the caller's context
pub trait BackgroundExecutor: Send + Sync {
    /// Submit a job and return immediately
    fn execute(&self, job: Job);
}

/// Executor backed by tokio's blocking thread pool
#[derive(Debug, Clone)]
pub struct BlockingPool {
    handle: Handle,
}

impl BlockingPool {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Pool of the runtime this is called from
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl BackgroundExecutor for BlockingPool {
    fn execute(&self, job: Job) {
        drop(self.handle.spawn_blocking(job));
    }
}
