//! Statistics display fed by the animation queue.
//!
//! A task runs in two phases: the last-operation label fades out and back in
//! (only when the task names an operation), then the node-count counter, the
//! height counter and the validity indicator animate together. The task is
//! done once the longest of those finishes.

use std::f32::consts::PI;
use std::time::Duration;

use serde::Serialize;

use crate::animation::AnimationTask;
use crate::ir::StatsSnapshot;

pub const LABEL_FADE: Duration = Duration::from_millis(150);
pub const COUNT_UP: Duration = Duration::from_millis(600);
pub const COUNT_DOWN: Duration = Duration::from_millis(400);
pub const HEIGHT_CHANGE: Duration = Duration::from_millis(500);
pub const INVALID_SHAKE: Duration = Duration::from_millis(300);
const SHAKE_INTENSITY: f32 = 3.0;
/// Applied tasks kept for inspection; older ones are only counted.
pub const APPLIED_HISTORY: usize = 32;

pub fn format_operation(operation: Option<&str>) -> String {
    let Some(operation) = operation else {
        return "-".to_string();
    };
    match operation.to_ascii_lowercase().as_str() {
        "insert" => "➕ Insert".to_string(),
        "delete" => "➖ Delete".to_string(),
        "search" => "🔍 Search".to_string(),
        "clear" => "🗑️ Clear".to_string(),
        "validate" => "✅ Validate".to_string(),
        "random" => "🎲 Random".to_string(),
        _ => operation.to_string(),
    }
}

fn ease_out_cubic(progress: f32) -> f32 {
    1.0 - (1.0 - progress).powi(3)
}

fn progress(now: Duration, start: Duration, duration: Duration) -> f32 {
    if duration.is_zero() || now >= start.saturating_add(duration) {
        return 1.0;
    }
    if now <= start {
        return 0.0;
    }
    (now - start).as_secs_f32() / duration.as_secs_f32()
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Counter {
    from: usize,
    to: usize,
    duration: Duration,
}

impl Counter {
    fn new(from: usize, to: usize, duration: Duration) -> Self {
        let duration = if from == to { Duration::ZERO } else { duration };
        Self { from, to, duration }
    }

    fn value_at(&self, now: Duration, start: Duration) -> usize {
        let eased = ease_out_cubic(progress(now, start, self.duration));
        let from = self.from as f32;
        let value = from + (self.to as f32 - from) * eased;
        value.round().max(0.0) as usize
    }
}

#[derive(Debug, Clone)]
struct ActiveAnimation {
    task: AnimationTask,
    started_at: Duration,
    counters_at: Duration,
    node_count: Counter,
    height: Counter,
    shake: Duration,
    total: Duration,
}

/// What the stats panel shows at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsFrame {
    pub node_count: usize,
    pub height: usize,
    pub valid: bool,
    pub last_operation: String,
    pub label_opacity: f32,
    pub shake_offset: f32,
    pub updating: bool,
}

#[derive(Debug)]
pub struct StatsDisplay {
    current: StatsSnapshot,
    last_operation: String,
    active: Option<ActiveAnimation>,
    applied: Vec<AnimationTask>,
    applied_count: usize,
}

impl StatsDisplay {
    pub fn new() -> Self {
        Self {
            current: StatsSnapshot::new(0, 0, true),
            last_operation: format_operation(None),
            active: None,
            applied: Vec::new(),
            applied_count: 0,
        }
    }

    pub fn current(&self) -> StatsSnapshot {
        self.current
    }

    pub fn last_operation(&self) -> &str {
        &self.last_operation
    }

    /// The most recently applied tasks, oldest first, at most
    /// [`APPLIED_HISTORY`] of them.
    pub fn applied(&self) -> &[AnimationTask] {
        &self.applied
    }

    pub fn applied_count(&self) -> usize {
        self.applied_count
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// Starts animating `task` at `now` and returns how long it runs.
    pub fn begin(&mut self, task: &AnimationTask, now: Duration) -> Duration {
        let fade = if task.operation.is_some() {
            LABEL_FADE * 2
        } else {
            Duration::ZERO
        };
        let next = task.stats;
        let count_duration = if next.node_count >= self.current.node_count {
            COUNT_UP
        } else {
            COUNT_DOWN
        };
        let node_count = Counter::new(self.current.node_count, next.node_count, count_duration);
        let height = Counter::new(self.current.height, next.height, HEIGHT_CHANGE);
        let shake = if self.current.valid && !next.valid {
            INVALID_SHAKE
        } else {
            Duration::ZERO
        };
        let total = fade + node_count.duration.max(height.duration).max(shake);

        tracing::debug!(
            operation = task.operation.as_deref().unwrap_or("-"),
            node_count = next.node_count,
            height = next.height,
            valid = next.valid,
            duration_ms = total.as_millis() as u64,
            "stats animation started"
        );

        self.active = Some(ActiveAnimation {
            task: task.clone(),
            started_at: now,
            counters_at: now.saturating_add(fade),
            node_count,
            height,
            shake,
            total,
        });
        total
    }

    /// Commits the in-flight task's final values.
    pub fn finish(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        self.current = active.task.stats;
        if let Some(operation) = active.task.operation.as_deref() {
            self.last_operation = format_operation(Some(operation));
        }
        if self.applied.len() == APPLIED_HISTORY {
            self.applied.remove(0);
        }
        self.applied.push(active.task);
        self.applied_count += 1;
    }

    pub fn frame(&self, now: Duration) -> StatsFrame {
        let Some(active) = &self.active else {
            return StatsFrame {
                node_count: self.current.node_count,
                height: self.current.height,
                valid: self.current.valid,
                last_operation: self.last_operation.clone(),
                label_opacity: 1.0,
                shake_offset: 0.0,
                updating: false,
            };
        };

        let (last_operation, label_opacity) = match active.task.operation.as_deref() {
            Some(operation) => {
                let fade_in_at = active.started_at.saturating_add(LABEL_FADE);
                if now < fade_in_at {
                    let p = progress(now, active.started_at, LABEL_FADE);
                    (self.last_operation.clone(), 1.0 - p)
                } else {
                    let p = progress(now, fade_in_at, LABEL_FADE);
                    (format_operation(Some(operation)), p)
                }
            }
            None => (self.last_operation.clone(), 1.0),
        };

        let counters_started = now >= active.counters_at;
        let valid = if counters_started {
            active.task.stats.valid
        } else {
            self.current.valid
        };
        let shake_offset = if counters_started && !active.shake.is_zero() {
            let p = progress(now, active.counters_at, active.shake);
            (p * PI * 4.0).sin() * SHAKE_INTENSITY * (1.0 - p)
        } else {
            0.0
        };

        StatsFrame {
            node_count: active.node_count.value_at(now, active.counters_at),
            height: active.height.value_at(now, active.counters_at),
            valid,
            last_operation,
            label_opacity,
            shake_offset,
            updating: now < active.started_at.saturating_add(active.total),
        }
    }
}

impl Default for StatsDisplay {
    fn default() -> Self {
        Self::new()
    }
}

/// Height bounds a red/black tree of `node_count` nodes can have.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedStats {
    pub node_count: usize,
    pub height: usize,
    pub valid: bool,
    pub min_height: usize,
    pub max_height: usize,
    /// 100 when the height is minimal, 0 at the red/black worst case.
    pub height_efficiency: f32,
}

impl DetailedStats {
    pub fn from_snapshot(stats: &StatsSnapshot) -> Self {
        let log = ((stats.node_count + 1) as f64).log2().floor() as usize;
        let min_height = log;
        let max_height = 2 * log + 1;
        let height_efficiency = if stats.node_count == 0 {
            100.0
        } else {
            let span = (max_height - min_height) as f32;
            let efficiency = (max_height as f32 - stats.height as f32) / span * 100.0;
            efficiency.clamp(0.0, 100.0)
        };
        Self {
            node_count: stats.node_count,
            height: stats.height,
            valid: stats.valid,
            min_height,
            max_height,
            height_efficiency,
        }
    }

    pub fn efficiency_label(&self) -> String {
        format!("{:.1}%", self.height_efficiency)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationSample {
    pub operation: String,
    pub duration: Duration,
    pub success: bool,
    pub at: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub total_operations: usize,
    pub successful_operations: usize,
    pub success_rate: f32,
    pub average_duration: Duration,
}

/// Round-trip timings of data-source operations.
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    samples: Vec<OperationSample>,
}

impl PerformanceTracker {
    pub fn track(&mut self, operation: &str, duration: Duration, success: bool, at: Duration) {
        self.samples.push(OperationSample {
            operation: operation.to_string(),
            duration,
            success,
            at,
        });
    }

    pub fn samples(&self) -> &[OperationSample] {
        &self.samples
    }

    pub fn report(&self) -> Option<PerformanceReport> {
        if self.samples.is_empty() {
            return None;
        }
        let total = self.samples.len();
        let successful = self.samples.iter().filter(|sample| sample.success).count();
        let sum: Duration = self.samples.iter().map(|sample| sample.duration).sum();
        Some(PerformanceReport {
            total_operations: total,
            successful_operations: successful,
            success_rate: successful as f32 / total as f32 * 100.0,
            average_duration: sum / total as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn formats_known_operations() {
        assert_eq!(format_operation(Some("Insert")), "➕ Insert");
        assert_eq!(format_operation(Some("rebalance")), "rebalance");
        assert_eq!(format_operation(None), "-");
    }

    #[test]
    fn duration_follows_panel_choreography() {
        let mut display = StatsDisplay::new();
        let grow = AnimationTask::new(StatsSnapshot::new(3, 2, true), Some("insert"));
        assert_eq!(display.begin(&grow, ms(0)), ms(300 + 600));
        display.finish();

        let shrink = AnimationTask::new(StatsSnapshot::new(2, 2, true), None);
        assert_eq!(display.begin(&shrink, ms(0)), ms(400));
        display.finish();

        let broken = AnimationTask::new(StatsSnapshot::new(2, 2, false), None);
        assert_eq!(display.begin(&broken, ms(0)), ms(300));
        display.finish();

        let unchanged = AnimationTask::new(StatsSnapshot::new(2, 2, false), None);
        assert_eq!(display.begin(&unchanged, ms(0)), Duration::ZERO);
    }

    #[test]
    fn counters_ease_to_target() {
        let mut display = StatsDisplay::new();
        let task = AnimationTask::new(StatsSnapshot::new(10, 4, true), Some("random"));
        display.begin(&task, ms(1000));

        let before = display.frame(ms(1100));
        assert_eq!(before.node_count, 0);
        assert_eq!(before.last_operation, "-");
        assert!(before.label_opacity < 1.0);

        let mid = display.frame(ms(1300 + 300));
        assert!(mid.node_count > 5 && mid.node_count < 10);
        assert_eq!(mid.last_operation, "🎲 Random");

        let end = display.frame(ms(1300 + 600));
        assert_eq!(end.node_count, 10);
        assert_eq!(end.height, 4);
        assert!(!end.updating);

        display.finish();
        assert_eq!(display.current(), StatsSnapshot::new(10, 4, true));
        assert_eq!(display.last_operation(), "🎲 Random");
        assert_eq!(display.applied().len(), 1);
    }

    #[test]
    fn applied_history_is_bounded() {
        let mut display = StatsDisplay::new();
        let total = APPLIED_HISTORY + 8;
        for count in 0..total {
            display.begin(&AnimationTask::new(StatsSnapshot::new(count, 1, true), None), ms(0));
            display.finish();
        }
        assert_eq!(display.applied_count(), total);
        assert_eq!(display.applied().len(), APPLIED_HISTORY);
        assert_eq!(display.applied()[0].stats.node_count, 8);
        assert_eq!(display.applied().last().map(|task| task.stats.node_count), Some(total - 1));
    }

    #[test]
    fn detailed_stats_bounds() {
        let detail = DetailedStats::from_snapshot(&StatsSnapshot::new(7, 3, true));
        assert_eq!(detail.min_height, 3);
        assert_eq!(detail.max_height, 7);
        assert_eq!(detail.efficiency_label(), "100.0%");

        let empty = DetailedStats::from_snapshot(&StatsSnapshot::new(0, 0, true));
        assert_eq!(empty.height_efficiency, 100.0);
    }

    #[test]
    fn performance_report_aggregates() {
        let mut tracker = PerformanceTracker::default();
        assert!(tracker.report().is_none());
        tracker.track("insert", ms(10), true, ms(0));
        tracker.track("delete", ms(30), false, ms(5));
        let report = tracker.report().unwrap();
        assert_eq!(report.total_operations, 2);
        assert_eq!(report.successful_operations, 1);
        assert_eq!(report.success_rate, 50.0);
        assert_eq!(report.average_duration, ms(20));
    }
}
