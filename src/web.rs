//! Browser binding: DOM anchors, `window.setTimeout`, the global `videojs`
//! function, and the document-wide keydown listener.

use std::{cell::RefCell, time::Duration};

use anyhow::{anyhow, Context};
use wasm_bindgen::{closure::Closure, prelude::*, JsCast};
use web_sys::{Document, Element, HtmlElement, HtmlSourceElement, KeyboardEvent, Window};

use crate::{
    config::Config,
    feedback::{OverlayLabel, OverlaySurface, Scheduler},
    input::{FocusContext, KeyOutcome},
    path::PageLocation,
    player::{MountNode, Player, PlayerFactory, PlayerOptions},
    session::{PageConfig, PageHost, Session},
};

const CONFIG_SCRIPT_ID: &str = "playerConfig";

const OVERLAY_STYLE: &[(&str, &str)] = &[
    ("position", "fixed"),
    ("left", "50%"),
    ("top", "20%"),
    ("transform", "translateX(-50%)"),
    ("background", "rgba(0,0,0,.6)"),
    ("color", "#fff"),
    ("padding", "6px 12px"),
    ("border-radius", "20px"),
    ("font-size", "14px"),
    ("font-weight", "500"),
    ("z-index", "9999"),
    ("opacity", "0"),
    ("transition", "opacity .15s"),
];

#[wasm_bindgen]
extern "C" {
    #[derive(Debug, Clone)]
    pub type VideoJsPlayer;

    #[wasm_bindgen(catch, js_name = videojs)]
    fn videojs(element: &Element, options: &JsValue) -> Result<VideoJsPlayer, JsValue>;

    #[wasm_bindgen(method)]
    fn play(this: &VideoJsPlayer) -> JsValue;

    #[wasm_bindgen(method)]
    fn pause(this: &VideoJsPlayer);

    #[wasm_bindgen(method)]
    fn paused(this: &VideoJsPlayer) -> bool;

    #[wasm_bindgen(method, js_name = currentTime)]
    fn current_time(this: &VideoJsPlayer) -> f64;

    #[wasm_bindgen(method, js_name = currentTime)]
    fn set_current_time(this: &VideoJsPlayer, seconds: f64);

    #[wasm_bindgen(method)]
    fn duration(this: &VideoJsPlayer) -> f64;

    #[wasm_bindgen(method, js_name = isFullscreen)]
    fn is_fullscreen(this: &VideoJsPlayer) -> bool;

    #[wasm_bindgen(method, js_name = requestFullscreen)]
    fn request_fullscreen(this: &VideoJsPlayer) -> JsValue;

    #[wasm_bindgen(method, js_name = exitFullscreen)]
    fn exit_fullscreen(this: &VideoJsPlayer) -> JsValue;
}

fn js_error(value: JsValue) -> anyhow::Error {
    anyhow!("{value:?}")
}

impl Player for VideoJsPlayer {
    fn play(&self) {
        // play() returns a promise that rejects when autoplay is blocked;
        // the player shows its own error state.
        let _ = VideoJsPlayer::play(self);
    }

    fn pause(&self) {
        VideoJsPlayer::pause(self);
    }

    fn paused(&self) -> bool {
        VideoJsPlayer::paused(self)
    }

    fn current_time(&self) -> f64 {
        VideoJsPlayer::current_time(self)
    }

    fn set_current_time(&self, seconds: f64) {
        VideoJsPlayer::set_current_time(self, seconds);
    }

    fn duration(&self) -> Option<f64> {
        let duration = VideoJsPlayer::duration(self);
        (duration.is_finite() && duration > 0.0).then_some(duration)
    }

    fn is_fullscreen(&self) -> bool {
        VideoJsPlayer::is_fullscreen(self)
    }

    fn request_fullscreen(&self) {
        let _ = VideoJsPlayer::request_fullscreen(self);
    }

    fn exit_fullscreen(&self) {
        let _ = VideoJsPlayer::exit_fullscreen(self);
    }
}

#[derive(Debug, Clone)]
pub struct DomMount {
    document: Document,
    element: Element,
}

impl MountNode for DomMount {
    fn add_class(&self, class: &str) -> anyhow::Result<()> {
        self.element.class_list().add_1(class).map_err(js_error)
    }

    fn set_attribute(&self, name: &str, value: &str) -> anyhow::Result<()> {
        self.element.set_attribute(name, value).map_err(js_error)
    }

    fn append_source(&self, url: &str, mime_type: &str) -> anyhow::Result<()> {
        let source: HtmlSourceElement = self
            .document
            .create_element("source")
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| anyhow!("<source> is not an HtmlSourceElement"))?;
        source.set_src(url);
        source.set_type(mime_type);
        self.element.append_child(&source).map_err(js_error)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VideoJsFactory;

impl PlayerFactory for VideoJsFactory {
    type Mount = DomMount;
    type Player = VideoJsPlayer;

    fn create(&self, mount: &DomMount, options: &PlayerOptions) -> anyhow::Result<VideoJsPlayer> {
        let options = serde_wasm_bindgen::to_value(options)
            .map_err(|err| anyhow!("Failed to convert player options: {err}"))?;
        videojs(&mount.element, &options).map_err(js_error)
    }
}

#[derive(Debug, Clone)]
pub struct DomLabel(HtmlElement);

impl OverlayLabel for DomLabel {
    fn set_text(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn set_opacity(&self, opacity: f32) {
        if let Err(err) = self
            .0
            .style()
            .set_property("opacity", &opacity.to_string())
        {
            log::warn!("Failed to set feedback opacity: {err:?}");
        }
    }
}

#[derive(Debug, Clone)]
pub struct DomSurface {
    document: Document,
    overlay_id: String,
}

impl OverlaySurface for DomSurface {
    type Label = DomLabel;

    fn create_label(&self) -> anyhow::Result<DomLabel> {
        if let Some(existing) = self.document.get_element_by_id(&self.overlay_id) {
            let element = existing
                .dyn_into::<HtmlElement>()
                .map_err(|_| anyhow!("#{} is not an HTML element", self.overlay_id))?;
            return Ok(DomLabel(element));
        }

        let element: HtmlElement = self
            .document
            .create_element("div")
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| anyhow!("<div> is not an HtmlElement"))?;
        element.set_id(&self.overlay_id);
        let style = element.style();
        for (property, value) in OVERLAY_STYLE {
            style.set_property(property, value).map_err(js_error)?;
        }
        self.document
            .body()
            .context("Document has no body")?
            .append_child(&element)
            .map_err(js_error)?;
        Ok(DomLabel(element))
    }
}

#[derive(Debug, Clone)]
pub struct WindowScheduler(Window);

/// A pending `window.setTimeout`. Dropping it clears the timeout and frees
/// the callback along with everything the task captured.
pub struct TimeoutHandle {
    window: Window,
    id: i32,
    _callback: Closure<dyn FnMut()>,
}

impl Drop for TimeoutHandle {
    fn drop(&mut self) {
        self.window.clear_timeout_with_handle(self.id);
    }
}

impl Scheduler for WindowScheduler {
    type Handle = TimeoutHandle;

    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> anyhow::Result<TimeoutHandle> {
        let callback: Closure<dyn FnMut()> = Closure::once(move || task());
        let timeout = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let id = self
            .0
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                timeout,
            )
            .map_err(js_error)?;
        Ok(TimeoutHandle {
            window: self.0.clone(),
            id,
            _callback: callback,
        })
    }

    fn cancel(&self, handle: TimeoutHandle) {
        drop(handle);
    }
}

pub struct WebPage {
    window: Window,
    document: Document,
    page: PageConfig,
}

impl WebPage {
    pub fn current(page: PageConfig) -> anyhow::Result<Self> {
        let window = web_sys::window().context("No global window")?;
        let document = window.document().context("Window has no document")?;
        Ok(Self {
            window,
            document,
            page,
        })
    }

    fn element(&self, id: &str) -> anyhow::Result<Element> {
        self.document
            .get_element_by_id(id)
            .with_context(|| format!("No element with id {id:?}"))
    }

    fn focus(document: &Document) -> FocusContext {
        let Some(active) = document.active_element() else {
            return FocusContext::default();
        };
        let content_editable = active
            .dyn_ref::<HtmlElement>()
            .is_some_and(HtmlElement::is_content_editable);
        FocusContext::element(active.tag_name(), content_editable)
    }
}

impl PageHost for WebPage {
    type Factory = VideoJsFactory;
    type Surface = DomSurface;
    type Scheduler = WindowScheduler;

    fn location(&self) -> anyhow::Result<PageLocation> {
        let location = self.window.location();
        Ok(PageLocation::new(
            location.pathname().map_err(js_error)?,
            location.search().map_err(js_error)?,
        ))
    }

    fn set_title(&self, title: &str) -> anyhow::Result<()> {
        self.element(&self.page.title_id)?
            .set_text_content(Some(title));
        Ok(())
    }

    fn mount_node(&self) -> anyhow::Result<DomMount> {
        Ok(DomMount {
            document: self.document.clone(),
            element: self.element(&self.page.mount_id)?,
        })
    }

    fn player_factory(&self) -> VideoJsFactory {
        VideoJsFactory
    }

    fn overlay_surface(&self) -> DomSurface {
        DomSurface {
            document: self.document.clone(),
            overlay_id: self.page.overlay_id.clone(),
        }
    }

    fn scheduler(&self) -> WindowScheduler {
        WindowScheduler(self.window.clone())
    }
}

/// A registered document keydown listener. Dropping it unregisters the
/// listener.
pub struct KeyBinding {
    document: Document,
    callback: Closure<dyn FnMut(KeyboardEvent)>,
}

impl KeyBinding {
    /// Routes every keydown on `document` to `handler`, together with the
    /// focus state at the time of the event.
    pub fn bind(
        document: &Document,
        handler: impl Fn(&str, &FocusContext) -> KeyOutcome + 'static,
    ) -> anyhow::Result<Self> {
        let focus_document = document.clone();
        let callback = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            let focus = WebPage::focus(&focus_document);
            if handler(&event.key(), &focus).prevents_default() {
                event.prevent_default();
            }
        });
        document
            .add_event_listener_with_callback("keydown", callback.as_ref().unchecked_ref())
            .map_err(js_error)?;
        Ok(Self {
            document: document.clone(),
            callback,
        })
    }
}

impl Drop for KeyBinding {
    fn drop(&mut self) {
        if let Err(err) = self
            .document
            .remove_event_listener_with_callback("keydown", self.callback.as_ref().unchecked_ref())
        {
            log::error!("Failed to remove keydown listener: {err:?}");
        }
    }
}

/// The live controller for this page. Field order matters: the binding
/// goes first so the listener is removed before the player is released.
struct PageController {
    _binding: KeyBinding,
    _session: Session<WebPage>,
}

thread_local! {
    static ACTIVE: RefCell<Option<PageController>> = const { RefCell::new(None) };
}

fn read_config(document: &Document) -> anyhow::Result<Config> {
    match document
        .get_element_by_id(CONFIG_SCRIPT_ID)
        .and_then(|script| script.text_content())
    {
        Some(contents) => Config::parse(&contents),
        None => Ok(Config::default()),
    }
}

fn init() -> anyhow::Result<()> {
    // Drop any earlier controller so listeners never stack up.
    ACTIVE.with(|active| active.borrow_mut().take());

    let window = web_sys::window().context("No global window")?;
    let document = window.document().context("Window has no document")?;
    let config = read_config(&document)?;

    let page = WebPage::current(config.page.clone())?;
    let session = Session::start(&page, &config)?;
    let controller = session.controller();
    let binding = KeyBinding::bind(&document, move |key, focus| {
        controller.handle_key(key, focus)
    })?;
    log::debug!("Keyboard shortcuts bound for {:?}", session.media_path());

    ACTIVE.with(|active| {
        *active.borrow_mut() = Some(PageController {
            _binding: binding,
            _session: session,
        })
    });
    Ok(())
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("Logger already initialized: {err}").into());
    }
    if let Err(err) = init() {
        log::error!("{err:?}");
    }
}

/// Re-runs initialization, replacing the current controller.
#[wasm_bindgen]
pub fn reinitialize() -> Result<(), JsValue> {
    init().map_err(|err| JsValue::from_str(&format!("{err:?}")))
}

/// Removes the keyboard listener and releases the player handle.
#[wasm_bindgen]
pub fn teardown() {
    ACTIVE.with(|active| active.borrow_mut().take());
}
