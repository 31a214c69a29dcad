//! In-memory doubles for the page, player, label and timer traits.

use std::{cell::RefCell, rc::Rc, time::Duration};

use anyhow::anyhow;

use crate::{
    feedback::{OverlayLabel, OverlaySurface, Scheduler},
    path::PageLocation,
    player::{MountNode, Player, PlayerFactory, PlayerOptions},
    session::PageHost,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCall {
    Play,
    Pause,
    RequestFullscreen,
    ExitFullscreen,
}

#[derive(Debug)]
struct FakePlayerState {
    time: f64,
    duration: Option<f64>,
    paused: bool,
    fullscreen: bool,
    calls: Vec<PlayerCall>,
}

#[derive(Debug, Clone)]
pub struct FakePlayer {
    state: Rc<RefCell<FakePlayerState>>,
}

impl Default for FakePlayer {
    fn default() -> Self {
        Self::at(0.0)
    }
}

impl FakePlayer {
    pub fn at(time: f64) -> Self {
        Self {
            state: Rc::new(RefCell::new(FakePlayerState {
                time,
                duration: None,
                paused: true,
                fullscreen: false,
                calls: vec![],
            })),
        }
    }

    pub fn with_duration(self, duration: f64) -> Self {
        self.state.borrow_mut().duration = Some(duration);
        self
    }

    pub fn time(&self) -> f64 {
        self.state.borrow().time
    }

    pub fn set_time(&self, time: f64) {
        self.state.borrow_mut().time = time;
    }

    pub fn calls(&self) -> Vec<PlayerCall> {
        self.state.borrow().calls.clone()
    }

    fn record(&self, call: PlayerCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl Player for FakePlayer {
    fn play(&self) {
        self.record(PlayerCall::Play);
        self.state.borrow_mut().paused = false;
    }

    fn pause(&self) {
        self.record(PlayerCall::Pause);
        self.state.borrow_mut().paused = true;
    }

    fn paused(&self) -> bool {
        self.state.borrow().paused
    }

    fn current_time(&self) -> f64 {
        self.time()
    }

    fn set_current_time(&self, seconds: f64) {
        self.set_time(seconds);
    }

    fn duration(&self) -> Option<f64> {
        self.state.borrow().duration
    }

    fn is_fullscreen(&self) -> bool {
        self.state.borrow().fullscreen
    }

    fn request_fullscreen(&self) {
        self.record(PlayerCall::RequestFullscreen);
        self.state.borrow_mut().fullscreen = true;
    }

    fn exit_fullscreen(&self) {
        self.record(PlayerCall::ExitFullscreen);
        self.state.borrow_mut().fullscreen = false;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOp {
    AddClass(String),
    SetAttribute(String, String),
    AppendSource(String, String),
}

#[derive(Debug, Clone, Default)]
pub struct FakeMount {
    ops: Rc<RefCell<Vec<MountOp>>>,
}

impl FakeMount {
    pub fn ops(&self) -> Vec<MountOp> {
        self.ops.borrow().clone()
    }
}

impl MountNode for FakeMount {
    fn add_class(&self, class: &str) -> anyhow::Result<()> {
        self.ops
            .borrow_mut()
            .push(MountOp::AddClass(class.to_string()));
        Ok(())
    }

    fn set_attribute(&self, name: &str, value: &str) -> anyhow::Result<()> {
        self.ops
            .borrow_mut()
            .push(MountOp::SetAttribute(name.to_string(), value.to_string()));
        Ok(())
    }

    fn append_source(&self, url: &str, mime_type: &str) -> anyhow::Result<()> {
        self.ops
            .borrow_mut()
            .push(MountOp::AppendSource(url.to_string(), mime_type.to_string()));
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeFactory {
    fail: bool,
    options: Rc<RefCell<Vec<PlayerOptions>>>,
    players: Rc<RefCell<Vec<FakePlayer>>>,
}

impl FakeFactory {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn created_with(&self) -> Vec<PlayerOptions> {
        self.options.borrow().clone()
    }

    pub fn last_player(&self) -> FakePlayer {
        self.players
            .borrow()
            .last()
            .cloned()
            .expect("no player was created")
    }
}

impl PlayerFactory for FakeFactory {
    type Mount = FakeMount;
    type Player = FakePlayer;

    fn create(&self, _mount: &FakeMount, options: &PlayerOptions) -> anyhow::Result<FakePlayer> {
        if self.fail {
            return Err(anyhow!("videojs is not defined"));
        }
        self.options.borrow_mut().push(options.clone());
        let player = FakePlayer::default();
        self.players.borrow_mut().push(player.clone());
        Ok(player)
    }
}

#[derive(Debug, Default)]
struct LabelState {
    text: String,
    opacity: f32,
    fade_outs: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FakeLabel {
    state: Rc<RefCell<LabelState>>,
}

impl FakeLabel {
    pub fn text(&self) -> String {
        self.state.borrow().text.clone()
    }

    pub fn opacity(&self) -> f32 {
        self.state.borrow().opacity
    }

    /// Number of visible-to-hidden transitions.
    pub fn fade_outs(&self) -> usize {
        self.state.borrow().fade_outs
    }

    /// Other live handles to this label, this one excluded.
    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.state) - 1
    }
}

impl OverlayLabel for FakeLabel {
    fn set_text(&self, text: &str) {
        self.state.borrow_mut().text = text.to_string();
    }

    fn set_opacity(&self, opacity: f32) {
        let mut state = self.state.borrow_mut();
        if opacity == 0.0 && state.opacity > 0.0 {
            state.fade_outs += 1;
        }
        state.opacity = opacity;
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeSurface {
    fail: bool,
    labels: Rc<RefCell<Vec<FakeLabel>>>,
}

impl FakeSurface {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn created(&self) -> usize {
        self.labels.borrow().len()
    }

    pub fn label(&self, index: usize) -> FakeLabel {
        self.labels.borrow()[index].clone()
    }
}

impl OverlaySurface for FakeSurface {
    type Label = FakeLabel;

    fn create_label(&self) -> anyhow::Result<FakeLabel> {
        if self.fail {
            return Err(anyhow!("document has no body"));
        }
        let label = FakeLabel::default();
        self.labels.borrow_mut().push(label.clone());
        Ok(label)
    }
}

struct ScheduledTask {
    id: u64,
    due: Duration,
    task: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct SchedulerState {
    now: Duration,
    next_id: u64,
    released: usize,
    tasks: Vec<ScheduledTask>,
}

/// Timer queue driven by a virtual clock.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl ManualScheduler {
    pub fn pending(&self) -> usize {
        self.state.borrow().tasks.len()
    }

    /// Tasks dropped by `cancel` without running.
    pub fn released(&self) -> usize {
        self.state.borrow().released
    }

    /// Runs every task that falls due within `by`, in due order.
    pub fn advance(&self, by: Duration) {
        let target = self.state.borrow().now + by;
        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                let due_idx = state
                    .tasks
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.id))
                    .map(|(idx, _)| idx);
                due_idx.map(|idx| {
                    let task = state.tasks.remove(idx);
                    state.now = task.due;
                    task.task
                })
            };
            match next {
                Some(task) => task(),
                None => break,
            }
        }
        self.state.borrow_mut().now = target;
    }
}

impl Scheduler for ManualScheduler {
    type Handle = u64;

    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> anyhow::Result<u64> {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        let due = state.now + delay;
        state.tasks.push(ScheduledTask { id, due, task });
        Ok(id)
    }

    fn cancel(&self, handle: u64) {
        let cancelled = {
            let mut state = self.state.borrow_mut();
            let idx = state.tasks.iter().position(|t| t.id == handle);
            idx.map(|idx| state.tasks.remove(idx))
        };
        if let Some(task) = cancelled {
            self.state.borrow_mut().released += 1;
            drop(task);
        }
    }
}

pub struct FakePage {
    pathname: String,
    search: String,
    title: RefCell<String>,
    pub mount: FakeMount,
    pub factory: FakeFactory,
    pub surface: FakeSurface,
    pub scheduler: ManualScheduler,
}

impl FakePage {
    pub fn at(pathname: &str) -> Self {
        Self {
            pathname: pathname.to_string(),
            search: String::new(),
            title: RefCell::new(String::new()),
            mount: FakeMount::default(),
            factory: FakeFactory::default(),
            surface: FakeSurface::default(),
            scheduler: ManualScheduler::default(),
        }
    }

    pub fn with_search(self, search: &str) -> Self {
        Self {
            search: search.to_string(),
            ..self
        }
    }

    pub fn with_failing_factory(self) -> Self {
        Self {
            factory: FakeFactory::failing(),
            ..self
        }
    }

    pub fn title(&self) -> String {
        self.title.borrow().clone()
    }
}

impl PageHost for FakePage {
    type Factory = FakeFactory;
    type Surface = FakeSurface;
    type Scheduler = ManualScheduler;

    fn location(&self) -> anyhow::Result<PageLocation> {
        Ok(PageLocation::new(self.pathname.clone(), self.search.clone()))
    }

    fn set_title(&self, title: &str) -> anyhow::Result<()> {
        *self.title.borrow_mut() = title.to_string();
        Ok(())
    }

    fn mount_node(&self) -> anyhow::Result<FakeMount> {
        Ok(self.mount.clone())
    }

    fn player_factory(&self) -> FakeFactory {
        self.factory.clone()
    }

    fn overlay_surface(&self) -> FakeSurface {
        self.surface.clone()
    }

    fn scheduler(&self) -> ManualScheduler {
        self.scheduler.clone()
    }
}
