use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use crate::models::audio_models::AudioLevels;
use crate::models::error::CaptureError;
use crate::models::recording_result::{CaptureSummary, RecordingResult};
use crate::models::state::CaptureState;
use crate::traits::capture_delegate::CaptureDelegate;

/// A capture notification as a value, for hosts that prefer a channel to callbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    StateChanged(CaptureState),
    Levels(AudioLevels),
    Error(CaptureError),
    CaptureFinished(CaptureSummary),
    RecordingReady(RecordingResult),
}

/// [`CaptureDelegate`] that forwards every notification over an mpsc channel.
///
/// Events sent after the receiver is dropped are discarded.
pub struct ChannelDelegate {
    sender: Sender<CaptureEvent>,
}

impl ChannelDelegate {
    pub fn new() -> (Arc<Self>, Receiver<CaptureEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Arc::new(Self { sender }), receiver)
    }

    fn send(&self, event: CaptureEvent) {
        if self.sender.send(event).is_err() {
            log::trace!("capture event dropped: receiver is gone");
        }
    }
}

impl CaptureDelegate for ChannelDelegate {
    fn on_state_changed(&self, state: &CaptureState) {
        self.send(CaptureEvent::StateChanged(state.clone()));
    }

    fn on_levels_updated(&self, levels: &AudioLevels) {
        self.send(CaptureEvent::Levels(*levels));
    }

    fn on_error(&self, error: &CaptureError) {
        self.send(CaptureEvent::Error(error.clone()));
    }

    fn on_capture_finished(&self, summary: &CaptureSummary) {
        self.send(CaptureEvent::CaptureFinished(summary.clone()));
    }

    fn on_recording_ready(&self, result: &RecordingResult) {
        self.send(CaptureEvent::RecordingReady(result.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwards_in_order() {
        let (delegate, events) = ChannelDelegate::new();
        delegate.on_state_changed(&CaptureState::Capturing);
        delegate.on_levels_updated(&AudioLevels::measure(&[3, -3]));
        delegate.on_error(&CaptureError::Io("disk full".into()));

        let received: Vec<CaptureEvent> = events.try_iter().collect();
        assert_eq!(received.len(), 3);
        assert_eq!(received[0], CaptureEvent::StateChanged(CaptureState::Capturing));
        assert!(matches!(received[1], CaptureEvent::Levels(l) if l.rms == 3.0));
        assert_eq!(received[2], CaptureEvent::Error(CaptureError::Io("disk full".into())));
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (delegate, events) = ChannelDelegate::new();
        drop(events);
        delegate.on_state_changed(&CaptureState::Idle);
    }
}
