//! The engine a host drives: one renderer, one highlight machine, one stats
//! queue and one clock, wired together and constructed explicitly.

use std::time::{Duration, Instant};

use anyhow::Result;

use crate::animation::{AnimationQueue, AnimationTask, AnimationTimer, Submitted};
use crate::config::Config;
use crate::highlight::{HighlightStateMachine, HighlightTimer};
use crate::ir::{NodeClicked, NodeId, StatsSnapshot, TreeData};
use crate::model::validate;
use crate::render::{DrawOutcome, Renderer, render_svg};
use crate::stats::{DetailedStats, PerformanceTracker, StatsDisplay, StatsFrame};
use crate::timer::{Scheduler, TimerHandle};

/// Where tree data and statistics come from.
pub trait TreeSource {
    fn tree(&mut self) -> Result<TreeData>;
    fn stats(&mut self) -> Result<StatsSnapshot>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Highlight(HighlightTimer),
    Animation(AnimationTimer),
}

impl From<HighlightTimer> for SessionEvent {
    fn from(event: HighlightTimer) -> Self {
        Self::Highlight(event)
    }
}

impl From<AnimationTimer> for SessionEvent {
    fn from(event: AnimationTimer) -> Self {
        Self::Animation(event)
    }
}

#[derive(Debug)]
pub struct Session {
    config: Config,
    renderer: Renderer,
    highlight: HighlightStateMachine,
    queue: AnimationQueue<AnimationTask>,
    display: StatsDisplay,
    timers: Scheduler<SessionEvent>,
    notifications: Vec<NodeClicked>,
    performance: PerformanceTracker,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            highlight: HighlightStateMachine::new(&config.timing),
            queue: AnimationQueue::new(config.timing.inter_step()),
            renderer: Renderer::new(),
            display: StatsDisplay::new(),
            timers: Scheduler::new(),
            notifications: Vec::new(),
            performance: PerformanceTracker::default(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn highlight(&self) -> &HighlightStateMachine {
        &self.highlight
    }

    pub fn stats_display(&self) -> &StatsDisplay {
        &self.display
    }

    pub fn performance(&self) -> &PerformanceTracker {
        &self.performance
    }

    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    /// Full redraw. Highlight state from the previous node set is dropped
    /// along with its timers.
    pub fn draw(&mut self, data: &TreeData) -> DrawOutcome {
        let validated = validate(&data.nodes());
        let ids: Vec<NodeId> = match &validated {
            Ok(tree) => tree.iter().map(|node| node.id).collect(),
            Err(_) => Vec::new(),
        };
        self.highlight.replace_rendered(ids, &mut self.timers);
        self.renderer.draw_validated(validated, &self.highlight, &self.config)
    }

    /// Pulls the tree and statistics from `source`, redraws and queues a
    /// stats update labelled `operation`.
    pub fn refresh<S>(&mut self, source: &mut S, operation: Option<&str>) -> Result<DrawOutcome>
    where
        S: TreeSource + ?Sized,
    {
        let started = Instant::now();
        let fetched = source.tree().and_then(|tree| Ok((tree, source.stats()?)));
        self.performance.track(
            operation.unwrap_or("refresh"),
            started.elapsed(),
            fetched.is_ok(),
            self.timers.now(),
        );
        let (tree, stats) = fetched?;
        let outcome = self.draw(&tree);
        self.submit_stats(stats, operation);
        Ok(outcome)
    }

    pub fn submit_stats(&mut self, stats: StatsSnapshot, operation: Option<&str>) -> Submitted {
        let submitted = self.queue.submit(AnimationTask::new(stats, operation));
        if submitted == Submitted::Started {
            self.begin_in_flight();
        }
        submitted
    }

    /// Search response from the data source. A miss changes nothing.
    pub fn on_search_result(&mut self, id: NodeId, found: bool) -> bool {
        if !found {
            return false;
        }
        let started = self.highlight.start_search(id, &mut self.timers);
        if started {
            self.renderer.restyle(&self.highlight);
        }
        started
    }

    /// Starts a left-to-right validation sweep over every rendered node.
    pub fn on_validate_result(&mut self, valid: bool) -> usize {
        let ids = self.renderer.layout().left_to_right();
        let swept = self
            .highlight
            .start_validation_sweep(&ids, valid, &mut self.timers);
        self.renderer.restyle(&self.highlight);
        swept
    }

    pub fn click_node(&mut self, id: NodeId) -> Option<NodeClicked> {
        let clicked = self.renderer.clicked(id)?;
        self.highlight.toggle_selected(id);
        self.renderer.restyle(&self.highlight);
        self.notifications.push(clicked);
        Some(clicked)
    }

    /// Click at a layout-space point.
    pub fn click_at(&mut self, x: f32, y: f32) -> Option<NodeClicked> {
        let id = self.renderer.node_at(x, y)?;
        self.click_node(id)
    }

    pub fn hover_at(&mut self, x: f32, y: f32) -> Option<NodeId> {
        self.renderer.pointer_move(x, y)
    }

    /// The host surface changed size: the canvas centre moves with it.
    pub fn resize(&mut self, width: f32, height: f32) {
        let (width, height) = (width.max(1.0), height.max(1.0));
        self.config.layout.canvas_width = width;
        self.config.layout.canvas_height = height;
        self.config.render.width = width;
        self.config.render.height = height;
        self.renderer.relayout(&self.highlight, &self.config);
    }

    pub fn center_view(&mut self) {
        self.renderer.refit(&self.config.layout);
    }

    /// Moves the clock forward by `by`, firing every timer that falls due.
    pub fn advance(&mut self, by: Duration) {
        let until = self.timers.now().saturating_add(by);
        while let Some((handle, event)) = self.timers.pop_due(until) {
            self.dispatch(handle, event);
        }
        self.timers.settle(until);
    }

    pub fn drain_notifications(&mut self) -> Vec<NodeClicked> {
        std::mem::take(&mut self.notifications)
    }

    pub fn svg(&self) -> String {
        render_svg(&self.renderer, &self.config.theme, &self.config)
    }

    pub fn stats_frame(&self) -> StatsFrame {
        self.display.frame(self.timers.now())
    }

    pub fn detailed_stats(&self) -> DetailedStats {
        DetailedStats::from_snapshot(&self.display.current())
    }

    pub fn animations_pending(&self) -> bool {
        self.queue.is_busy()
    }

    fn dispatch(&mut self, handle: TimerHandle, event: SessionEvent) {
        tracing::debug!(?event, at_ms = self.timers.now().as_millis() as u64, "timer fired");
        match event {
            SessionEvent::Highlight(event) => {
                if self.highlight.handle_timer(handle, event, &mut self.timers) {
                    self.renderer.restyle(&self.highlight);
                }
            }
            SessionEvent::Animation(AnimationTimer::Finished) => {
                self.display.finish();
                if let Some(gap) = self.queue.finish() {
                    self.timers
                        .schedule(gap, SessionEvent::Animation(AnimationTimer::StartNext));
                }
            }
            SessionEvent::Animation(AnimationTimer::StartNext) => {
                if self.queue.start_next().is_some() {
                    self.begin_in_flight();
                }
            }
        }
    }

    fn begin_in_flight(&mut self) {
        let Some(task) = self.queue.in_flight() else {
            return;
        };
        let duration = self.display.begin(task, self.timers.now());
        self.timers
            .schedule(duration, SessionEvent::Animation(AnimationTimer::Finished));
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
