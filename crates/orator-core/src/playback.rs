//! Playback-position synchronization between an embedded player and the
//! report views (timeline markers, transcript rows).

/// Seek surface of the embedded player. Fire-and-forget: the player answers
/// through its own progress callback, never through a return value.
pub trait PlayerHandle: Send + Sync {
    fn seek_to(&self, seconds: f64);
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackState {
    /// Current position as a fraction of total duration, 0-1.
    pub position: f64,
    /// Total duration in seconds; 0 until the player reports it.
    pub duration: f64,
    pub playing: bool,
}

/// Owns playback state for the currently displayed video.
///
/// The player drives `on_progress`/`on_duration`; timeline markers and
/// transcript rows drive `seek`. Seeks issued before the player is attached
/// and has reported a duration are dropped, not queued; report views render
/// before the player mounts and must not fail.
#[derive(Default)]
pub struct PlaybackSync {
    state: PlaybackState,
    player: Option<Box<dyn PlayerHandle>>,
}

impl PlaybackSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, player: Box<dyn PlayerHandle>) {
        self.player = Some(player);
    }

    pub fn detach(&mut self) {
        self.player = None;
    }

    /// Called by the player at its polling interval (~100 ms).
    pub fn on_progress(&mut self, fraction: f64) {
        if fraction.is_finite() {
            self.state.position = fraction.clamp(0.0, 1.0);
        }
    }

    /// Called by the player once it knows (or re-learns) the duration.
    pub fn on_duration(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.state.duration = seconds;
        }
    }

    /// Jump to an absolute time. No-op until a player is attached and the
    /// duration is known.
    pub fn seek(&mut self, seconds: f64) {
        let Some(player) = &self.player else {
            return;
        };
        if self.state.duration <= 0.0 {
            return;
        }

        self.state.position = (seconds / self.state.duration).clamp(0.0, 1.0);
        player.seek_to(seconds);
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.state.playing = playing;
    }

    pub fn toggle_play(&mut self) {
        self.state.playing = !self.state.playing;
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn position_seconds(&self) -> f64 {
        self.state.position * self.state.duration
    }
}

/// Horizontal placement of a timed marker on a proportional timeline,
/// both values fractions of the full width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerSpan {
    pub left: f64,
    pub width: f64,
}

/// Place a `[start, end]` range on a timeline of the given duration.
/// Returns `None` while the duration is unknown; markers are simply not
/// renderable yet.
pub fn marker_span(start_s: f64, end_s: f64, duration_s: f64) -> Option<MarkerSpan> {
    if !duration_s.is_finite() || duration_s <= 0.0 {
        return None;
    }
    Some(MarkerSpan {
        left: start_s / duration_s,
        width: (end_s - start_s) / duration_s,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct RecordingPlayer {
        seeks: Arc<Mutex<Vec<f64>>>,
    }

    impl PlayerHandle for RecordingPlayer {
        fn seek_to(&self, seconds: f64) {
            self.seeks.lock().unwrap().push(seconds);
        }
    }

    #[test]
    fn marker_at_ten_to_fourteen_of_hundred_is_ten_percent_and_four_wide() {
        let span = marker_span(10.0, 14.0, 100.0).unwrap();
        assert_eq!(span.left, 0.10);
        assert_eq!(span.width, 0.04);
    }

    #[test]
    fn marker_is_unrenderable_without_a_duration() {
        assert_eq!(marker_span(10.0, 14.0, 0.0), None);
        assert_eq!(marker_span(10.0, 14.0, f64::NAN), None);
        assert_eq!(marker_span(10.0, 14.0, -5.0), None);
    }

    #[test]
    fn early_seek_is_dropped_and_later_seek_lands() {
        let player = RecordingPlayer::default();
        let mut sync = PlaybackSync::new();

        // No player yet: must be a no-op, not a failure.
        sync.seek(45.0);
        assert_eq!(sync.state().position, 0.0);

        // Attached but duration unknown: still dropped.
        sync.attach(Box::new(player.clone()));
        sync.seek(45.0);
        assert!(player.seeks.lock().unwrap().is_empty());

        sync.on_duration(90.0);
        sync.seek(45.0);
        assert_eq!(player.seeks.lock().unwrap().as_slice(), &[45.0]);
        assert_eq!(sync.state().position, 0.5);
    }

    #[test]
    fn progress_updates_clamp_to_unit_range() {
        let mut sync = PlaybackSync::new();
        sync.on_duration(120.0);

        sync.on_progress(0.25);
        assert_eq!(sync.position_seconds(), 30.0);

        sync.on_progress(1.5);
        assert_eq!(sync.state().position, 1.0);

        sync.on_progress(f64::NAN);
        assert_eq!(sync.state().position, 1.0);
    }

    #[test]
    fn duration_report_ignores_nonsense() {
        let mut sync = PlaybackSync::new();
        sync.on_duration(0.0);
        sync.on_duration(-3.0);
        assert_eq!(sync.state().duration, 0.0);

        sync.on_duration(240.0);
        assert_eq!(sync.state().duration, 240.0);
    }

    #[test]
    fn toggle_play_flips_the_flag() {
        let mut sync = PlaybackSync::new();
        assert!(!sync.state().playing);
        sync.toggle_play();
        assert!(sync.state().playing);
        sync.set_playing(false);
        assert!(!sync.state().playing);
    }
}
