use super::error::CaptureError;
use super::recording_result::CaptureSummary;

/// Capture writer state machine.
///
/// State transitions:
/// ```text
/// idle → capturing → stopping → stopped
///            ↓           ↓
///          failed ←──────┘
/// ```
/// `stopped` and `failed` accept a new `start`.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Capturing,
    Stopping,
    Stopped(CaptureSummary),
    Failed(CaptureError),
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped(_) | Self::Failed(_))
    }

    /// Whether a new session may be started from this state.
    pub fn can_start(&self) -> bool {
        self.is_idle() || self.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_allowed_only_when_no_session_runs() {
        assert!(CaptureState::Idle.can_start());
        assert!(CaptureState::Failed(CaptureError::Io("disk full".into())).can_start());
        assert!(!CaptureState::Capturing.can_start());
        assert!(!CaptureState::Stopping.can_start());
        assert!(!CaptureState::Stopping.is_terminal());
    }
}
