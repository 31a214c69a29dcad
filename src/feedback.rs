use std::{
    cell::RefCell,
    rc::{Rc, Weak},
    time::Duration,
};

use anyhow::Context;

/// One-shot timers on the page's event loop.
pub trait Scheduler {
    type Handle: 'static;

    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> anyhow::Result<Self::Handle>;

    /// Cancelling a handle whose task already ran is a no-op. Either way the
    /// task and everything it captured are released.
    fn cancel(&self, handle: Self::Handle);
}

/// A floating text label. Clones refer to the same on-screen node.
pub trait OverlayLabel: Clone + 'static {
    fn set_text(&self, text: &str);
    fn set_opacity(&self, opacity: f32);
}

pub trait OverlaySurface {
    type Label: OverlayLabel;

    fn create_label(&self) -> anyhow::Result<Self::Label>;
}

/// `pending_fade` holds the handle of the last scheduled fade until the next
/// flash cancels it, even after it ran; a task never releases its own handle.
#[derive(Debug)]
struct FeedbackOverlayState<L, H> {
    element: Option<L>,
    pending_fade: Option<H>,
    visible: bool,
}

/// Transient seek indicator. The label is created on first use and only
/// ever hidden afterwards; every flash restarts the fade timer.
pub struct FeedbackOverlay<S: OverlaySurface, T: Scheduler> {
    surface: S,
    scheduler: T,
    fade_after: Duration,
    state: Rc<RefCell<FeedbackOverlayState<S::Label, T::Handle>>>,
}

impl<S: OverlaySurface, T: Scheduler> FeedbackOverlay<S, T> {
    pub fn new(surface: S, scheduler: T, fade_after: Duration) -> Self {
        Self {
            surface,
            scheduler,
            fade_after,
            state: Rc::new(RefCell::new(FeedbackOverlayState {
                element: None,
                pending_fade: None,
                visible: false,
            })),
        }
    }

    pub fn flash(&self, text: &str) -> anyhow::Result<()> {
        let label = self.label()?;
        label.set_text(text);
        label.set_opacity(1.0);

        self.state.borrow_mut().visible = true;
        self.cancel_fade();

        let state = Rc::downgrade(&self.state);
        let handle = self
            .scheduler
            .schedule(self.fade_after, Box::new(move || fade_out(label, state)))
            .context("Failed to schedule feedback fade")?;
        self.state.borrow_mut().pending_fade = Some(handle);
        Ok(())
    }

    pub fn is_fade_pending(&self) -> bool {
        let state = self.state.borrow();
        state.visible && state.pending_fade.is_some()
    }

    fn cancel_fade(&self) {
        let previous = self.state.borrow_mut().pending_fade.take();
        if let Some(previous) = previous {
            self.scheduler.cancel(previous);
        }
    }

    fn label(&self) -> anyhow::Result<S::Label> {
        if let Some(label) = &self.state.borrow().element {
            return Ok(label.clone());
        }
        let label = self
            .surface
            .create_label()
            .context("Failed to create feedback label")?;
        label.set_opacity(0.0);
        self.state.borrow_mut().element = Some(label.clone());
        Ok(label)
    }
}

impl<S: OverlaySurface, T: Scheduler> Drop for FeedbackOverlay<S, T> {
    fn drop(&mut self) {
        self.cancel_fade();
    }
}

fn fade_out<L: OverlayLabel, H>(label: L, state: Weak<RefCell<FeedbackOverlayState<L, H>>>) {
    label.set_opacity(0.0);
    if let Some(state) = state.upgrade() {
        state.borrow_mut().visible = false;
    }
}
