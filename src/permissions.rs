//! Runtime permissions required before storage operations run
//!
//! The host platform owns the actual permission UI. The gate only needs to
//! query a capability and to request one, receiving a set of grant results
//! back once the user has answered.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Mutex;
use tracing::{debug, info};

/// A capability the host can grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Microphone access
    RecordAudio,
    /// Write access to shared external storage
    WriteExternalStorage,
}

impl Capability {
    pub const ALL: [Capability; 2] = [Capability::RecordAudio, Capability::WriteExternalStorage];

    /// Platform permission name
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::RecordAudio => "android.permission.RECORD_AUDIO",
            Capability::WriteExternalStorage => "android.permission.WRITE_EXTERNAL_STORAGE",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a permission request for one capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantResult {
    Granted,
    Denied,
}

/// Permission capability exposed by the host platform
#[async_trait::async_trait]
pub trait PermissionHost: Send + Sync {
    /// Check whether a capability is currently granted
    fn has_permission(&self, capability: Capability) -> bool;

    /// Ask the user for a capability
    ///
    /// Resolves once the host delivers its grant results for the request.
    async fn request_permission(&self, capability: Capability) -> Vec<GrantResult>;
}

/// How the in-memory host answers a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Grant and record the capability as held
    Grant,
    /// Report denied
    Deny,
    /// Report granted without actually recording the grant
    GrantWithoutRecording,
    /// Never answer
    Stall,
}

/// Permission host backed by an in-memory grant table
///
/// Used by the standalone binary (answers come from configuration) and by
/// tests, which inspect the order of requests it received.
pub struct MemoryPermissions {
    granted: Mutex<HashSet<Capability>>,
    responses: HashMap<Capability, Response>,
    default_response: Response,
    requests: Mutex<Vec<Capability>>,
}

impl MemoryPermissions {
    pub fn new(default_response: Response) -> Self {
        Self {
            granted: Mutex::new(HashSet::new()),
            responses: HashMap::new(),
            default_response,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Host where everything is already granted
    pub fn all_granted() -> Self {
        Self::new(Response::Grant).with_granted(Capability::ALL)
    }

    /// Mark capabilities as held from the start
    pub fn with_granted(self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        {
            let mut granted = self.granted.lock().unwrap_or_else(|e| e.into_inner());
            granted.extend(capabilities);
        }
        self
    }

    /// Override the answer for one capability
    pub fn respond(mut self, capability: Capability, response: Response) -> Self {
        self.responses.insert(capability, response);
        self
    }

    /// Capabilities requested so far, in order
    pub fn requests(&self) -> Vec<Capability> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn response_for(&self, capability: Capability) -> Response {
        self.responses
            .get(&capability)
            .copied()
            .unwrap_or(self.default_response)
    }
}

#[async_trait::async_trait]
impl PermissionHost for MemoryPermissions {
    fn has_permission(&self, capability: Capability) -> bool {
        self.granted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&capability)
    }

    async fn request_permission(&self, capability: Capability) -> Vec<GrantResult> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(capability);

        let response = self.response_for(capability);
        info!("Permission requested: {} ({:?})", capability, response);

        match response {
            Response::Grant => {
                self.granted
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(capability);
                vec![GrantResult::Granted]
            }
            Response::Deny => vec![GrantResult::Denied],
            Response::GrantWithoutRecording => vec![GrantResult::Granted],
            Response::Stall => {
                debug!("Permission request for {} will never be answered", capability);
                std::future::pending().await
            }
        }
    }
}
