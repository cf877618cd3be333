//! The playback controller: owns the player state, orchestrates the audio
//! resource, playlist resolution, and lyric synchronization, and drives the
//! play-mode state machine.

use crate::audio::{AudioBackend, AudioEvent, AudioResource};
use crate::config::{PlayMode, PlayerConfig};
use crate::error::{CoreError, Result};
use crate::events::{EventBus, PlayerEvent};
use crate::lrc::LyricTimeline;
use crate::playlist::{resolve_playlist, PlaylistResolution, Track};
use crate::provider::{LyricsSource, PlaylistProvider};
use crate::state::PlayerState;
use crate::store::{keys, KeyValueStore};
use rand::Rng;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "glassplay::player";

/// Inbound control commands, mapped 1:1 onto the controller methods so hosts
/// can forward UI events over a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    TogglePlay,
    Next,
    Prev,
    PlayIndex(usize),
}

/// Whether a track load starts playback unconditionally or only when
/// `autoplay` is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartPolicy {
    Configured,
    Forced,
}

struct PlayerInner {
    config: PlayerConfig,
    state: RwLock<PlayerState>,
    lyrics: RwLock<LyricTimeline>,
    audio: AudioResource,
    playlists: Arc<dyn PlaylistProvider>,
    lyric_source: Option<Arc<dyn LyricsSource>>,
    store: Option<Arc<dyn KeyValueStore>>,
    events: EventBus,
    /// Bumped on every track load; lyric fetches tagged with an older value
    /// discard their result.
    generation: AtomicU64,
    /// Consecutive playback errors with no successful play in between.
    error_streak: AtomicUsize,
    /// Position to restore once the first track metadata arrives.
    resume_position: Mutex<Option<Duration>>,
    cancel: CancellationToken,
}

/// The playback engine. Construct with [`Player::builder`]; all control
/// methods absorb failures internally and report through the event bus and
/// state, never as errors.
pub struct Player {
    inner: Arc<PlayerInner>,
}

/// Builder wiring the engine's collaborators: the audio backend with its
/// event channel, the playlist provider, and optionally a lyric source and a
/// host persistence store.
pub struct PlayerBuilder {
    config: PlayerConfig,
    backend: Option<(Box<dyn AudioBackend>, mpsc::UnboundedReceiver<AudioEvent>)>,
    playlists: Option<Arc<dyn PlaylistProvider>>,
    lyric_source: Option<Arc<dyn LyricsSource>>,
    store: Option<Arc<dyn KeyValueStore>>,
    cancel: Option<CancellationToken>,
}

impl Player {
    #[must_use]
    pub fn builder(config: PlayerConfig) -> PlayerBuilder {
        PlayerBuilder {
            config,
            backend: None,
            playlists: None,
            lyric_source: None,
            store: None,
            cancel: None,
        }
    }

    /// Subscribe to outbound player events.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.inner.events.subscribe()
    }

    /// Snapshot of the current player state.
    pub async fn state(&self) -> PlayerState {
        self.inner.state.read().await.clone()
    }

    /// The lyric timeline of the current track (empty when none is loaded).
    pub async fn lyrics(&self) -> LyricTimeline {
        self.inner.lyrics.read().await.clone()
    }

    /// Request playback start. No-op when there is no current track.
    pub async fn play(&self) {
        if self.inner.state.read().await.current_track().is_none() {
            return;
        }
        self.inner.audio.play();
    }

    /// Request playback stop. Idempotent.
    pub async fn pause(&self) {
        self.inner.audio.pause();
    }

    pub async fn toggle(&self) {
        if self.inner.state.read().await.is_playing {
            self.pause().await;
        } else {
            self.play().await;
        }
    }

    /// Advance to the next track per the current play mode. Explicit calls
    /// use the list rule even in single mode; single-track looping applies
    /// only to the natural end-of-track event.
    pub async fn next(&self) {
        let (index, len, mode) = self.navigation_view().await;
        if len == 0 {
            return;
        }
        self.inner.error_streak.store(0, Ordering::SeqCst);
        self.inner
            .load_track(pick_next(mode, index, len), StartPolicy::Configured)
            .await;
    }

    /// Step back to the previous track per the current play mode.
    pub async fn prev(&self) {
        let (index, len, mode) = self.navigation_view().await;
        if len == 0 {
            return;
        }
        self.inner.error_streak.store(0, Ordering::SeqCst);
        self.inner
            .load_track(pick_prev(mode, index, len), StartPolicy::Configured)
            .await;
    }

    /// Load the track at `index` and start playback unconditionally.
    /// Out-of-range indices are ignored.
    pub async fn play_index(&self, index: usize) {
        let len = self.inner.state.read().await.playlist.len();
        if index >= len {
            return;
        }
        self.inner.error_streak.store(0, Ordering::SeqCst);
        self.inner.load_track(index, StartPolicy::Forced).await;
    }

    /// Replace the playlist. An empty list is ignored; the current index is
    /// reset to 0 when it falls outside the new list. Loads and plays.
    pub async fn set_playlist(&self, list: Vec<Track>) {
        if list.is_empty() {
            return;
        }
        let len = list.len();
        let index = {
            let mut state = self.inner.state.write().await;
            state.playlist = list;
            if state.current_index >= len {
                state.current_index = 0;
            }
            state.current_index
        };
        self.inner.error_streak.store(0, Ordering::SeqCst);
        self.inner.events.emit(PlayerEvent::PlaylistResolved { len });
        self.inner.load_track(index, StartPolicy::Forced).await;
    }

    /// Seek to a position given in seconds. Negative and non-finite inputs
    /// clamp to 0; the position is capped at the track duration.
    pub async fn seek(&self, seconds: f64) {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        let duration = self.inner.state.read().await.duration;
        // Cap in float space: inputs past the track length may not even be
        // representable as a Duration.
        let position = if seconds >= duration.as_secs_f64() {
            duration
        } else {
            Duration::from_secs_f64(seconds)
        };
        self.inner.state.write().await.position = position;
        self.inner.audio.seek(position, duration);
    }

    /// Set the output volume, clamped to `[0, 1]`.
    pub async fn set_volume(&self, volume: f32) {
        if !volume.is_finite() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        self.inner.state.write().await.volume = volume;
        self.inner.audio.set_volume(volume);
        self.inner.persist(keys::VOLUME, &volume.to_string());
    }

    /// Apply an inbound control command.
    pub async fn handle_command(&self, command: PlayerCommand) {
        match command {
            PlayerCommand::TogglePlay => self.toggle().await,
            PlayerCommand::Next => self.next().await,
            PlayerCommand::Prev => self.prev().await,
            PlayerCommand::PlayIndex(index) => self.play_index(index).await,
        }
    }

    /// Stop the engine loop and any in-flight lyric fetches.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    async fn navigation_view(&self) -> (usize, usize, PlayMode) {
        let state = self.inner.state.read().await;
        (state.current_index, state.playlist.len(), state.play_mode)
    }
}

impl PlayerBuilder {
    /// Inject the audio backend together with the receiving end of the
    /// event channel it feeds.
    #[must_use]
    pub fn backend(
        mut self,
        backend: Box<dyn AudioBackend>,
        events: mpsc::UnboundedReceiver<AudioEvent>,
    ) -> Self {
        self.backend = Some((backend, events));
        self
    }

    #[must_use]
    pub fn playlist_provider(mut self, provider: Arc<dyn PlaylistProvider>) -> Self {
        self.playlists = Some(provider);
        self
    }

    #[must_use]
    pub fn lyrics_source(mut self, source: Arc<dyn LyricsSource>) -> Self {
        self.lyric_source = Some(source);
        self
    }

    #[must_use]
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Start the engine: attach the audio event stream, resolve the
    /// playlist, load the first track, and honor `autoplay`.
    ///
    /// A configuration with nothing to play yields a player whose state
    /// reports `enabled == false`; that is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when a required collaborator is missing or the
    /// audio event stream was already attached elsewhere.
    pub async fn start(self) -> Result<Player> {
        let Self {
            config,
            backend,
            playlists,
            lyric_source,
            store,
            cancel,
        } = self;

        let (backend, events_rx) =
            backend.ok_or(CoreError::MissingDependency { field: "backend" })?;
        let playlists = playlists.ok_or(CoreError::MissingDependency {
            field: "playlist_provider",
        })?;
        let audio = AudioResource::new(backend, events_rx);

        let mut state = PlayerState::new(&config);
        if let Some(volume) = store
            .as_ref()
            .and_then(|s| s.get(keys::VOLUME))
            .and_then(|v| v.parse::<f32>().ok())
            .filter(|v| v.is_finite())
        {
            state.volume = volume.clamp(0.0, 1.0);
        }
        audio.set_volume(state.volume);

        let resume_position = store
            .as_ref()
            .filter(|_| config.remember_progress)
            .and_then(|s| s.get(keys::POSITION))
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis);

        let restored_index = store
            .as_ref()
            .filter(|_| config.remember_playlist)
            .and_then(|s| s.get(keys::INDEX))
            .and_then(|v| v.parse::<usize>().ok());

        let inner = Arc::new(PlayerInner {
            config,
            state: RwLock::new(state),
            lyrics: RwLock::new(LyricTimeline::default()),
            audio,
            playlists,
            lyric_source,
            store,
            events: EventBus::default(),
            generation: AtomicU64::new(0),
            error_streak: AtomicUsize::new(0),
            resume_position: Mutex::new(resume_position),
            cancel: cancel.unwrap_or_default(),
        });

        let rx = inner.audio.attach()?;
        tokio::spawn(run_event_loop(Arc::clone(&inner), rx));

        match resolve_playlist(&inner.config, inner.playlists.as_ref()).await {
            PlaylistResolution::Disabled => {
                let mut state = inner.state.write().await;
                state.enabled = false;
                state.is_loading = false;
                info!(target: LOG_TARGET, "player started disabled");
            }
            PlaylistResolution::Resolved(tracks) => {
                let len = tracks.len();
                {
                    let mut state = inner.state.write().await;
                    state.playlist = tracks;
                    state.is_loading = false;
                }
                inner.events.emit(PlayerEvent::PlaylistResolved { len });
                let index = restored_index.filter(|i| *i < len).unwrap_or(0);
                inner.load_track(index, StartPolicy::Configured).await;
                info!(target: LOG_TARGET, tracks = len, "player started");
            }
        }

        Ok(Player { inner })
    }
}

impl PlayerInner {
    /// Load the track at `index` into the audio resource, reset reported
    /// time/duration, kick off lyric acquisition, and announce the switch.
    async fn load_track(self: &Arc<Self>, index: usize, policy: StartPolicy) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // A remembered position applies only to the initially restored
        // track; any later load invalidates it.
        if generation > 1 {
            if let Ok(mut slot) = self.resume_position.lock() {
                slot.take();
            }
        }

        let track = {
            let mut state = self.state.write().await;
            let Some(track) = state.playlist.get(index).cloned() else {
                return;
            };
            state.current_index = index;
            state.position = Duration::ZERO;
            state.duration = Duration::ZERO;
            state.lyric_index = None;
            track
        };

        debug!(target: LOG_TARGET, index, name = %track.name, "loading track");
        self.audio.load(&track.url);

        let autostart = match policy {
            StartPolicy::Forced => true,
            StartPolicy::Configured => self.config.autoplay,
        };
        if autostart {
            self.audio.play();
        }

        *self.lyrics.write().await = LyricTimeline::default();
        if track.has_lyrics() {
            if let Some(source) = &self.lyric_source {
                spawn_lyric_fetch(
                    Arc::clone(self),
                    Arc::clone(source),
                    track.lyric_url.clone(),
                    generation,
                );
            }
        }

        if self.config.remember_playlist {
            self.persist(keys::INDEX, &index.to_string());
        }
        self.events.emit(PlayerEvent::TrackChanged { index, track });
    }

    /// Auto-advance used by end-of-track and error handling; respects the
    /// play mode's list/random rule without resetting the error streak.
    async fn advance_auto(self: &Arc<Self>) {
        let (index, len, mode) = {
            let state = self.state.read().await;
            (state.current_index, state.playlist.len(), state.play_mode)
        };
        if len == 0 {
            return;
        }
        self.load_track(pick_next(mode, index, len), StartPolicy::Configured)
            .await;
    }

    fn persist(&self, key: &str, value: &str) {
        if let Some(store) = &self.store {
            store.set(key, value);
        }
    }
}

fn pick_next(mode: PlayMode, index: usize, len: usize) -> usize {
    match mode {
        PlayMode::Random => rand::rng().random_range(0..len),
        PlayMode::List | PlayMode::Single => (index + 1) % len,
    }
}

fn pick_prev(mode: PlayMode, index: usize, len: usize) -> usize {
    match mode {
        PlayMode::Random => rand::rng().random_range(0..len),
        PlayMode::List | PlayMode::Single => (index + len - 1) % len,
    }
}

async fn run_event_loop(inner: Arc<PlayerInner>, mut rx: mpsc::UnboundedReceiver<AudioEvent>) {
    loop {
        tokio::select! {
            () = inner.cancel.cancelled() => {
                info!(target: LOG_TARGET, "player event loop shutting down");
                break;
            }
            event = rx.recv() => {
                match event {
                    Some(event) => handle_audio_event(&inner, event).await,
                    None => break,
                }
            }
        }
    }
}

async fn handle_audio_event(inner: &Arc<PlayerInner>, event: AudioEvent) {
    match event {
        AudioEvent::Playing => {
            inner.error_streak.store(0, Ordering::SeqCst);
            let index = {
                let mut state = inner.state.write().await;
                state.is_playing = true;
                state.current_index
            };
            inner.events.emit(PlayerEvent::StateChanged {
                is_playing: true,
                index,
            });
        }
        AudioEvent::Paused => {
            let index = {
                let mut state = inner.state.write().await;
                state.is_playing = false;
                state.current_index
            };
            inner.events.emit(PlayerEvent::StateChanged {
                is_playing: false,
                index,
            });
        }
        AudioEvent::TimeUpdate(position) => {
            let lyric_index = inner.lyrics.read().await.current_line_index(position);
            let duration = {
                let mut state = inner.state.write().await;
                state.position = position;
                state.lyric_index = lyric_index;
                state.duration
            };
            inner
                .events
                .emit(PlayerEvent::TimeUpdate { position, duration });
            if inner.config.remember_progress {
                inner.persist(keys::POSITION, &position.as_millis().to_string());
            }
        }
        AudioEvent::MetadataLoaded(duration) => {
            {
                let mut state = inner.state.write().await;
                state.duration = duration;
            }
            let pending = inner
                .resume_position
                .lock()
                .ok()
                .and_then(|mut slot| slot.take());
            if let Some(position) = pending {
                debug!(target: LOG_TARGET, ?position, "restoring remembered playback position");
                inner.audio.seek(position, duration);
            }
        }
        AudioEvent::Ended => {
            let (mode, duration) = {
                let state = inner.state.read().await;
                (state.play_mode, state.duration)
            };
            if mode == PlayMode::Single {
                inner.state.write().await.position = Duration::ZERO;
                inner.audio.seek(Duration::ZERO, duration);
                inner.audio.play();
            } else {
                inner.advance_auto().await;
            }
        }
        AudioEvent::Error(reason) => {
            handle_playback_error(inner, &reason).await;
        }
    }
}

/// Skip past the failing track, bounded by a circuit breaker: once every
/// track in the playlist has failed consecutively, stop advancing and
/// announce a stall instead of looping forever.
async fn handle_playback_error(inner: &Arc<PlayerInner>, reason: &str) {
    warn!(target: LOG_TARGET, reason, "audio backend reported a playback error");

    let len = inner.state.read().await.playlist.len();
    if len == 0 {
        return;
    }

    let streak = inner.error_streak.fetch_add(1, Ordering::SeqCst) + 1;
    if streak >= len {
        warn!(
            target: LOG_TARGET,
            streak,
            playlist = len,
            "every track failed consecutively, stopping auto-advance"
        );
        let index = {
            let mut state = inner.state.write().await;
            state.is_playing = false;
            state.current_index
        };
        inner.events.emit(PlayerEvent::StateChanged {
            is_playing: false,
            index,
        });
        inner.events.emit(PlayerEvent::Stalled);
        return;
    }

    inner.advance_auto().await;
}

fn spawn_lyric_fetch(
    inner: Arc<PlayerInner>,
    source: Arc<dyn LyricsSource>,
    url: String,
    generation: u64,
) {
    tokio::spawn(async move {
        let fetched = tokio::select! {
            () = inner.cancel.cancelled() => return,
            res = source.fetch_lyrics(&url) => res,
        };

        let timeline = match fetched {
            Ok(text) => LyricTimeline::parse(&text),
            Err(e) => {
                warn!(target: LOG_TARGET, %url, error = %e, "lyric fetch failed, clearing timeline");
                LyricTimeline::default()
            }
        };

        if inner.generation.load(Ordering::SeqCst) != generation {
            debug!(target: LOG_TARGET, %url, "discarding lyric response for a superseded track");
            return;
        }

        let lines = timeline.len();
        *inner.lyrics.write().await = timeline;
        inner.state.write().await.lyric_index = None;
        inner.events.emit(PlayerEvent::LyricsUpdated { lines });
    });
}
