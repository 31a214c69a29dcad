use std::rc::Rc;

use anyhow::Context;
use serde::Deserialize;

use crate::{
    classify::MediaSourceDescriptor,
    config::Config,
    feedback::{FeedbackOverlay, OverlaySurface, Scheduler},
    input::InputController,
    path::{extract_media_path, page_title, PageLocation},
    player::{PlayerAdapter, PlayerFactory},
};

/// Where the controller finds things on the host page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub serving_root: String,
    pub title_id: String,
    pub mount_id: String,
    pub overlay_id: String,
    pub fallback_title: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            serving_root: "/files/".to_string(),
            title_id: "fileTitle".to_string(),
            mount_id: "videoPlayer".to_string(),
            overlay_id: "seekFlash".to_string(),
            fallback_title: "Media".to_string(),
        }
    }
}

/// The page environment the controller runs in.
pub trait PageHost {
    type Factory: PlayerFactory;
    type Surface: OverlaySurface;
    type Scheduler: Scheduler;

    fn location(&self) -> anyhow::Result<PageLocation>;
    fn set_title(&self, title: &str) -> anyhow::Result<()>;
    fn mount_node(&self) -> anyhow::Result<<Self::Factory as PlayerFactory>::Mount>;
    fn player_factory(&self) -> Self::Factory;
    fn overlay_surface(&self) -> Self::Surface;
    fn scheduler(&self) -> Self::Scheduler;
}

pub type HostPlayer<H> = <<H as PageHost>::Factory as PlayerFactory>::Player;

pub type HostController<H> =
    InputController<HostPlayer<H>, <H as PageHost>::Surface, <H as PageHost>::Scheduler>;

/// Everything created for one page load: resolve, classify, construct the
/// player, and build the key handler. Binding the handler to real input is
/// left to the host.
pub struct Session<H: PageHost> {
    media_path: String,
    adapter: PlayerAdapter<HostPlayer<H>>,
    controller: Rc<HostController<H>>,
}

impl<H: PageHost> Session<H> {
    pub fn start(host: &H, config: &Config) -> anyhow::Result<Self> {
        let location = host.location().context("Failed to read page location")?;
        let media_path = extract_media_path(&location.pathname, &config.page.serving_root);
        if media_path.is_empty() {
            log::warn!(
                "No {} segment in \"{location}\"; the media URL will not resolve",
                config.page.serving_root
            );
        }

        host.set_title(page_title(&media_path, &config.page.fallback_title))
            .context("Failed to set page title")?;

        let descriptor =
            MediaSourceDescriptor::from_media_path(&media_path, &config.page.serving_root);
        let mount = host.mount_node().context("Failed to find player mount")?;
        let adapter = PlayerAdapter::mount(
            descriptor,
            &mount,
            &host.player_factory(),
            &config.player,
        )?;

        let overlay = FeedbackOverlay::new(
            host.overlay_surface(),
            host.scheduler(),
            config.controls.feedback_fade(),
        );
        let controller = Rc::new(InputController::new(
            adapter.handle(),
            overlay,
            &config.controls,
        ));

        Ok(Self {
            media_path,
            adapter,
            controller,
        })
    }

    pub fn media_path(&self) -> &str {
        &self.media_path
    }

    pub fn descriptor(&self) -> &MediaSourceDescriptor {
        self.adapter.descriptor()
    }

    pub fn controller(&self) -> Rc<HostController<H>> {
        Rc::clone(&self.controller)
    }
}
