pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod permissions;
pub mod storage;

pub use config::Config;
pub use dispatcher::{
    ActionKind, BackgroundExecutor, BlockingPool, Dispatcher, DispatcherConfig, Outcome, Request,
    RequestHandle,
};
pub use error::{BridgeError, BridgeResult, ErrorPayload, PERMISSION_DENIED_ERROR};
pub use http::{create_router, AppState};
pub use permissions::{Capability, GrantResult, MemoryPermissions, PermissionHost, Response};
pub use storage::{FileMaterializer, PlatformStorage, StorageRoot};
