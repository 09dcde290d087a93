use std::sync::Arc;

use frame_source::SourceError;
use tokio_util::sync::CancellationToken;

/// One of the three independent load channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lane {
    /// Full dataset replacement.
    Reload,
    /// Leftward extension.
    Left,
    /// Rightward extension.
    Right,
}

/// Lifecycle of a lane's most recent operation.
///
/// `Loading` is entered once per operation; each operation ends in exactly
/// one of `Loaded`, `Canceled` or `Error` before the lane can start again.
#[derive(Clone, Debug, Default)]
pub enum LaneState {
    #[default]
    Inited,
    Loading,
    Loaded,
    Canceled,
    Error(Arc<SourceError>),
}

impl LaneState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    pub fn is_inited(&self) -> bool {
        matches!(self, Self::Inited)
    }

    pub fn error(&self) -> Option<&SourceError> {
        match self {
            Self::Error(cause) => Some(cause),
            _ => None,
        }
    }
}

/// In-flight tag for a lane: either nothing is running, or one operation
/// is, holding the token that cancels it.
#[derive(Debug, Default)]
pub(crate) enum Flight {
    #[default]
    Idle,
    Running(CancellationToken),
}

impl Flight {
    pub(crate) fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    pub(crate) fn cancel(&self) {
        if let Self::Running(token) = self {
            token.cancel();
        }
    }
}
