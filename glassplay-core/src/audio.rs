//! Audio backend abstraction and the engine-side resource wrapper.

use crate::error::{CoreError, Result};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

/// Normalized events produced by the native playable handle.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    /// Playback started or resumed.
    Playing,
    /// Playback paused.
    Paused,
    /// Playback position advanced.
    TimeUpdate(Duration),
    /// Track metadata became available; carries the track duration.
    MetadataLoaded(Duration),
    /// The track played to its natural end.
    Ended,
    /// A native playback failure; reported asynchronously, never as an
    /// immediate failure of a control call.
    Error(String),
}

/// The native playable media handle, implemented by the host.
///
/// Control calls are fire-and-forget: a failed `play` surfaces later as
/// [`AudioEvent::Error`] on the event channel the backend feeds, not as a
/// return value. Implementations must not start playback from `load`.
pub trait AudioBackend: Send + Sync {
    /// Set the source URL and begin buffering.
    fn load(&self, url: &str);

    /// Request playback start.
    fn play(&self);

    /// Request playback stop. Idempotent.
    fn pause(&self);

    /// Move the playhead. The position has already been clamped by the
    /// caller; implementations may clamp again.
    fn seek(&self, position: Duration);

    /// Set the output volume. Already clamped to `[0, 1]` by the caller.
    fn set_volume(&self, volume: f32);
}

/// Engine-side wrapper around one injected [`AudioBackend`] and its event
/// channel. Owns clamping at the resource boundary and hands the event
/// stream to exactly one controller.
pub struct AudioResource {
    backend: Box<dyn AudioBackend>,
    events: Mutex<Option<mpsc::UnboundedReceiver<AudioEvent>>>,
}

impl AudioResource {
    /// Wrap a backend together with the receiving end of the event channel
    /// the backend feeds.
    #[must_use]
    pub fn new(backend: Box<dyn AudioBackend>, events: mpsc::UnboundedReceiver<AudioEvent>) -> Self {
        Self {
            backend,
            events: Mutex::new(Some(events)),
        }
    }

    /// Take the event stream. A second take fails with
    /// [`CoreError::AlreadyAttached`]: one resource feeds one controller.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyAttached`] if the stream was taken before.
    pub fn attach(&self) -> Result<mpsc::UnboundedReceiver<AudioEvent>> {
        let mut slot = self.events.lock().map_err(|_| CoreError::AlreadyAttached)?;
        slot.take().ok_or(CoreError::AlreadyAttached)
    }

    pub fn load(&self, url: &str) {
        self.backend.load(url);
    }

    pub fn play(&self) {
        self.backend.play();
    }

    pub fn pause(&self) {
        self.backend.pause();
    }

    /// Seek after clamping to `[0, duration]`.
    pub fn seek(&self, position: Duration, duration: Duration) {
        self.backend.seek(position.min(duration));
    }

    /// Set volume after clamping to `[0, 1]`.
    pub fn set_volume(&self, volume: f32) {
        self.backend.set_volume(volume.clamp(0.0, 1.0));
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{AudioBackend, AudioEvent};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum BackendCall {
        Load(String),
        Play,
        Pause,
        Seek(Duration),
        SetVolume(f32),
    }

    /// Scripted backend: records control calls and lets tests feed events.
    pub(crate) struct MockBackend {
        calls: Mutex<Vec<BackendCall>>,
        events: mpsc::UnboundedSender<AudioEvent>,
    }

    impl MockBackend {
        pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<AudioEvent>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (
                Arc::new(Self {
                    calls: Mutex::new(Vec::new()),
                    events: tx,
                }),
                rx,
            )
        }

        pub(crate) fn emit(&self, event: AudioEvent) {
            let _ = self.events.send(event);
        }

        pub(crate) fn calls(&self) -> Vec<BackendCall> {
            self.calls.lock().unwrap().clone()
        }

        pub(crate) fn loads(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    BackendCall::Load(url) => Some(url),
                    _ => None,
                })
                .collect()
        }

        pub(crate) fn count(&self, call: &BackendCall) -> usize {
            self.calls().iter().filter(|c| *c == call).count()
        }
    }

    impl AudioBackend for MockBackend {
        fn load(&self, url: &str) {
            self.calls
                .lock()
                .unwrap()
                .push(BackendCall::Load(url.to_string()));
        }

        fn play(&self) {
            self.calls.lock().unwrap().push(BackendCall::Play);
        }

        fn pause(&self) {
            self.calls.lock().unwrap().push(BackendCall::Pause);
        }

        fn seek(&self, position: Duration) {
            self.calls.lock().unwrap().push(BackendCall::Seek(position));
        }

        fn set_volume(&self, volume: f32) {
            self.calls
                .lock()
                .unwrap()
                .push(BackendCall::SetVolume(volume));
        }
    }

    /// A backend for an `Arc`-shared mock, so tests can keep a handle while
    /// the resource owns the boxed trait object.
    pub(crate) struct SharedBackend(pub(crate) Arc<MockBackend>);

    impl AudioBackend for SharedBackend {
        fn load(&self, url: &str) {
            self.0.load(url);
        }

        fn play(&self) {
            self.0.play();
        }

        fn pause(&self) {
            self.0.pause();
        }

        fn seek(&self, position: Duration) {
            self.0.seek(position);
        }

        fn set_volume(&self, volume: f32) {
            self.0.set_volume(volume);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{BackendCall, MockBackend, SharedBackend};
    use super::*;
    use std::sync::Arc;

    fn resource() -> (Arc<MockBackend>, AudioResource) {
        let (backend, rx) = MockBackend::new();
        let resource = AudioResource::new(Box::new(SharedBackend(backend.clone())), rx);
        (backend, resource)
    }

    #[test]
    fn test_attach_is_exclusive() {
        let (_backend, resource) = resource();
        assert!(resource.attach().is_ok());
        assert!(matches!(
            resource.attach(),
            Err(CoreError::AlreadyAttached)
        ));
    }

    #[test]
    fn test_seek_clamps_to_duration() {
        let (backend, resource) = resource();
        resource.seek(Duration::from_secs(500), Duration::from_secs(120));
        resource.seek(Duration::from_secs(30), Duration::from_secs(120));
        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::Seek(Duration::from_secs(120)),
                BackendCall::Seek(Duration::from_secs(30)),
            ]
        );
    }

    #[test]
    fn test_set_volume_clamps() {
        let (backend, resource) = resource();
        resource.set_volume(-0.3);
        resource.set_volume(1.7);
        resource.set_volume(0.4);
        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::SetVolume(0.0),
                BackendCall::SetVolume(1.0),
                BackendCall::SetVolume(0.4),
            ]
        );
    }

    #[tokio::test]
    async fn test_events_flow_through_channel() {
        let (backend, resource) = resource();
        let mut rx = resource.attach().unwrap();
        backend.emit(AudioEvent::Playing);
        backend.emit(AudioEvent::Ended);
        assert_eq!(rx.recv().await, Some(AudioEvent::Playing));
        assert_eq!(rx.recv().await, Some(AudioEvent::Ended));
    }
}
