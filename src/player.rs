use std::rc::{Rc, Weak};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::classify::MediaSourceDescriptor;

pub const AUDIO_CLASS: &str = "vjs-audio";

/// Transport capabilities of the embedded player.
///
/// Implementations wrap a handle that is mutated through shared references,
/// which is how script-side player objects behave.
pub trait Player {
    fn play(&self);
    fn pause(&self);
    fn paused(&self) -> bool;
    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);
    /// `None` while the duration is not known yet.
    fn duration(&self) -> Option<f64>;
    fn is_fullscreen(&self) -> bool;
    fn request_fullscreen(&self);
    fn exit_fullscreen(&self);
}

/// The element the player is mounted on.
pub trait MountNode {
    fn add_class(&self, class: &str) -> anyhow::Result<()>;
    fn set_attribute(&self, name: &str, value: &str) -> anyhow::Result<()>;
    fn append_source(&self, url: &str, mime_type: &str) -> anyhow::Result<()>;
}

pub trait PlayerFactory {
    type Mount: MountNode;
    type Player: Player;

    fn create(&self, mount: &Self::Mount, options: &PlayerOptions)
        -> anyhow::Result<Self::Player>;
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerPolicy {
    pub preload: String,
    pub playback_rates: Vec<f64>,
    pub audio_max_width: u32,
}

impl Default for PlayerPolicy {
    fn default() -> Self {
        Self {
            preload: "auto".to_string(),
            playback_rates: vec![0.5, 0.75, 1.0, 1.25, 1.5, 2.0],
            audio_max_width: 720,
        }
    }
}

impl PlayerPolicy {
    pub fn options_for(&self, descriptor: &MediaSourceDescriptor) -> PlayerOptions {
        PlayerOptions {
            controls: true,
            preload: self.preload.clone(),
            playback_rates: self.playback_rates.clone(),
            fluid: !descriptor.is_audio,
            user_actions: UserActions { hotkeys: false },
            control_bar: ControlBar {
                volume_panel: VolumePanel {
                    inline: false,
                    vertical: true,
                },
            },
        }
    }

    fn audio_style(&self) -> String {
        format!("max-width:{}px; width:100%;", self.audio_max_width)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerOptions {
    pub controls: bool,
    pub preload: String,
    pub playback_rates: Vec<f64>,
    pub fluid: bool,
    pub user_actions: UserActions,
    pub control_bar: ControlBar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserActions {
    pub hotkeys: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlBar {
    pub volume_panel: VolumePanel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumePanel {
    pub inline: bool,
    pub vertical: bool,
}

/// Owns the page's single player instance. Other components only get a
/// [`Weak`] handle to it.
#[derive(Debug)]
pub struct PlayerAdapter<P> {
    player: Rc<P>,
    descriptor: MediaSourceDescriptor,
}

impl<P: Player> PlayerAdapter<P> {
    pub fn mount<F>(
        descriptor: MediaSourceDescriptor,
        mount: &F::Mount,
        factory: &F,
        policy: &PlayerPolicy,
    ) -> anyhow::Result<Self>
    where
        F: PlayerFactory<Player = P>,
    {
        if descriptor.is_audio {
            mount
                .add_class(AUDIO_CLASS)
                .context("Failed to mark mount node as audio")?;
            mount
                .set_attribute("style", &policy.audio_style())
                .context("Failed to apply audio layout")?;
        } else {
            mount
                .set_attribute("playsinline", "")
                .context("Failed to enable inline playback")?;
        }

        mount
            .append_source(&descriptor.url, &descriptor.mime_hint)
            .context("Failed to attach media source")?;

        let options = policy.options_for(&descriptor);
        let player = factory
            .create(mount, &options)
            .context("Failed to construct player")?;
        log::info!(
            "Player ready for {} ({:?}, type {:?})",
            descriptor.url,
            descriptor.kind(),
            descriptor.mime_hint
        );

        Ok(Self {
            player: Rc::new(player),
            descriptor,
        })
    }

    pub fn handle(&self) -> Weak<P> {
        Rc::downgrade(&self.player)
    }

    pub fn descriptor(&self) -> &MediaSourceDescriptor {
        &self.descriptor
    }
}
