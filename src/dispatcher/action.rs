use std::fmt;
use uuid::Uuid;

use crate::error::{BridgeError, BridgeResult};

/// Operations the bridge accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Persist a base64 audio payload unless the file already exists
    DownloadAudioFile,
    /// Look up whether a file exists
    Exists,
}

impl ActionKind {
    /// Parse an action name as sent by the web layer
    pub fn parse(name: &str) -> BridgeResult<Self> {
        match name {
            "downloadAudioFile" => Ok(ActionKind::DownloadAudioFile),
            "exists" => Ok(ActionKind::Exists),
            other => Err(BridgeError::UnrecognizedAction(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::DownloadAudioFile => "downloadAudioFile",
            ActionKind::Exists => "exists",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single admitted request and everything needed to carry it out
///
/// The context travels with the request through the permission round trip
/// and into the background job, so concurrent requests never share state.
#[derive(Clone)]
pub struct Request {
    pub id: Uuid,
    pub kind: ActionKind,
    pub filename: String,
    /// Base64 payload, only present for `downloadAudioFile`
    pub payload: Option<String>,
}

impl Request {
    pub fn download_audio_file(filename: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ActionKind::DownloadAudioFile,
            filename: filename.into(),
            payload: Some(payload.into()),
        }
    }

    pub fn exists(filename: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ActionKind::Exists,
            filename: filename.into(),
            payload: None,
        }
    }

    /// Build a request from an action name and its positional arguments
    ///
    /// Extra trailing arguments are ignored.
    pub fn from_args(action: &str, args: Vec<String>) -> BridgeResult<Self> {
        let kind = ActionKind::parse(action)?;
        let mut args = args.into_iter();

        let mut next = |index: usize| {
            args.next().ok_or_else(|| BridgeError::MissingArgument {
                action: kind.as_str().to_string(),
                index,
            })
        };

        let filename = next(0)?;
        let payload = match kind {
            ActionKind::DownloadAudioFile => Some(next(1)?),
            ActionKind::Exists => None,
        };

        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            filename,
            payload,
        })
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("filename", &self.filename)
            .field("payload_len", &self.payload.as_ref().map(|p| p.len()))
            .finish()
    }
}
