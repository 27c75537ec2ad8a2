use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// One captured track. Capture code checks [`LocalTrack::is_live`] before
/// writing samples; the session only flips the flags.
#[derive(Debug)]
pub struct LocalTrack {
    id: String,
    kind: TrackKind,
    enabled: AtomicBool,
    stopped: AtomicBool,
}

impl LocalTrack {
    pub fn new(kind: TrackKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn is_live(&self) -> bool {
        self.is_enabled() && !self.is_stopped()
    }
}

/// The session's single local capture, shared read-only by every peer connection.
#[derive(Debug)]
pub struct LocalMedia {
    stream_id: String,
    tracks: Vec<Arc<LocalTrack>>,
}

impl LocalMedia {
    pub fn new(kinds: &[TrackKind]) -> Self {
        Self {
            stream_id: Uuid::new_v4().to_string(),
            tracks: kinds.iter().map(|k| Arc::new(LocalTrack::new(*k))).collect(),
        }
    }

    pub fn camera_and_microphone() -> Self {
        Self::new(&[TrackKind::Audio, TrackKind::Video])
    }

    /// No capture at all; peers are received only.
    pub fn receive_only() -> Self {
        Self::new(&[])
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn tracks(&self) -> &[Arc<LocalTrack>] {
        &self.tracks
    }

    pub fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &Arc<LocalTrack>> {
        self.tracks.iter().filter(move |t| t.kind() == kind)
    }

    pub fn has(&self, kind: TrackKind) -> bool {
        self.tracks_of(kind).next().is_some()
    }

    /// Session-wide toggle; affects every peer at once.
    pub fn set_enabled(&self, kind: TrackKind, enabled: bool) {
        self.tracks_of(kind).for_each(|t| t.set_enabled(enabled));
    }

    pub fn is_enabled(&self, kind: TrackKind) -> bool {
        self.tracks_of(kind).any(|t| t.is_enabled())
    }

    pub fn stop_all(&self) {
        self.tracks.iter().for_each(|t| t.stop());
    }
}
