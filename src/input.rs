use std::{rc::Weak, time::Duration};

use serde::Deserialize;

use crate::{
    feedback::{FeedbackOverlay, OverlaySurface, Scheduler},
    player::Player,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Seconds moved per arrow key press.
    pub seek_step: f64,
    pub feedback_fade_ms: u64,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            seek_step: 5.0,
            feedback_fade_ms: 350,
        }
    }
}

impl ControlsConfig {
    pub fn feedback_fade(&self) -> Duration {
        Duration::from_millis(self.feedback_fade_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    SeekBackward,
    SeekForward,
    TogglePlayback,
    ToggleFullscreen,
}

impl Shortcut {
    /// Maps a `KeyboardEvent.key` value to a shortcut.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" => Some(Self::SeekBackward),
            "ArrowRight" => Some(Self::SeekForward),
            " " => Some(Self::TogglePlayback),
            "f" | "F" => Some(Self::ToggleFullscreen),
            _ => None,
        }
    }
}

/// The element that had focus when a key was pressed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusContext {
    pub tag_name: Option<String>,
    pub content_editable: bool,
}

impl FocusContext {
    pub fn element(tag_name: impl Into<String>, content_editable: bool) -> Self {
        Self {
            tag_name: Some(tag_name.into()),
            content_editable,
        }
    }

    pub fn accepts_text(&self) -> bool {
        if self.content_editable {
            return true;
        }
        matches!(
            self.tag_name.as_deref().map(str::to_ascii_uppercase).as_deref(),
            Some("INPUT" | "TEXTAREA")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Leave the event alone, including its default action.
    Passthrough,
    Handled,
}

impl KeyOutcome {
    pub fn prevents_default(self) -> bool {
        self == Self::Handled
    }
}

/// Clamps a relative seek to `[0, duration]`; an unknown duration leaves
/// the upper end open.
pub fn seek_target(current: f64, delta: f64, duration: Option<f64>) -> f64 {
    let target = (current + delta).max(0.0);
    match duration {
        Some(duration) if duration.is_finite() && duration > 0.0 => target.min(duration),
        _ => target,
    }
}

fn seek_label(delta: f64) -> String {
    if delta < 0.0 {
        format!("-{}s", -delta)
    } else {
        format!("+{delta}s")
    }
}

pub struct InputController<P, S: OverlaySurface, T: Scheduler> {
    player: Weak<P>,
    overlay: FeedbackOverlay<S, T>,
    seek_step: f64,
}

impl<P, S, T> InputController<P, S, T>
where
    P: Player,
    S: OverlaySurface,
    T: Scheduler,
{
    pub fn new(player: Weak<P>, overlay: FeedbackOverlay<S, T>, controls: &ControlsConfig) -> Self {
        Self {
            player,
            overlay,
            seek_step: controls.seek_step,
        }
    }

    pub fn overlay(&self) -> &FeedbackOverlay<S, T> {
        &self.overlay
    }

    pub fn handle_key(&self, key: &str, focus: &FocusContext) -> KeyOutcome {
        if focus.accepts_text() {
            return KeyOutcome::Passthrough;
        }
        let Some(shortcut) = Shortcut::from_key(key) else {
            return KeyOutcome::Passthrough;
        };
        let Some(player) = self.player.upgrade() else {
            log::debug!("Ignoring {shortcut:?}: player is gone");
            return KeyOutcome::Passthrough;
        };

        log::trace!("Shortcut {shortcut:?}");
        match shortcut {
            Shortcut::SeekBackward => self.seek(player.as_ref(), -self.seek_step),
            Shortcut::SeekForward => self.seek(player.as_ref(), self.seek_step),
            Shortcut::TogglePlayback => {
                if player.paused() {
                    player.play();
                } else {
                    player.pause();
                }
            }
            Shortcut::ToggleFullscreen => {
                if player.is_fullscreen() {
                    player.exit_fullscreen();
                } else {
                    player.request_fullscreen();
                }
            }
        }
        KeyOutcome::Handled
    }

    fn seek(&self, player: &P, delta: f64) {
        let target = seek_target(player.current_time(), delta, player.duration());
        player.set_current_time(target);
        if let Err(err) = self.overlay.flash(&seek_label(delta)) {
            log::warn!("Failed to show seek feedback: {err:?}");
        }
    }
}
