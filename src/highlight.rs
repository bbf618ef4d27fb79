//! Per-node transient highlight state.
//!
//! Each rendered id carries an independent set of tags:
//!
//! * `selected` toggles on click and never expires;
//! * `searching` expires after the search hold and lives on at most one id;
//! * `validating-ok` / `validating-err` are applied by a staggered sweep and
//!   expire independently per id.
//!
//! Every timed tag keeps the handle of its pending timer. Whenever a tag is
//! superseded, cleared, or its node drops out of the rendered set, the
//! handle is cancelled, so no stale timer can touch a later state.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::Serialize;

use crate::config::TimingConfig;
use crate::ir::NodeId;
use crate::timer::{Scheduler, TimerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HighlightTag {
    Selected,
    Searching,
    ValidatingOk,
    ValidatingErr,
}

impl HighlightTag {
    pub fn as_class(self) -> &'static str {
        match self {
            Self::Selected => "selected",
            Self::Searching => "searching",
            Self::ValidatingOk => "validating-ok",
            Self::ValidatingErr => "validating-err",
        }
    }

    fn for_validation(valid: bool) -> Self {
        if valid { Self::ValidatingOk } else { Self::ValidatingErr }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightTimer {
    Activate { id: NodeId, tag: HighlightTag },
    Expire { id: NodeId, tag: HighlightTag },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Scheduled but not yet visible (validation sweep stagger).
    Pending { activation: TimerHandle, hold: Duration },
    Active { expiry: Option<TimerHandle> },
}

impl Slot {
    fn handle(&self) -> Option<TimerHandle> {
        match self {
            Self::Pending { activation, .. } => Some(*activation),
            Self::Active { expiry } => *expiry,
        }
    }
}

#[derive(Debug)]
pub struct HighlightStateMachine {
    rendered: BTreeSet<NodeId>,
    entries: BTreeMap<NodeId, BTreeMap<HighlightTag, Slot>>,
    search_hold: Duration,
    validate_hold: Duration,
    stagger: Duration,
}

impl HighlightStateMachine {
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            rendered: BTreeSet::new(),
            entries: BTreeMap::new(),
            search_hold: timing.search(),
            validate_hold: timing.validate(),
            stagger: timing.stagger(),
        }
    }

    pub fn is_rendered(&self, id: NodeId) -> bool {
        self.rendered.contains(&id)
    }

    /// Installs the node set of a fresh draw. Highlight state does not
    /// survive a full refresh: every entry is dropped and its timer cancelled.
    pub fn replace_rendered<E, I>(&mut self, ids: I, timers: &mut Scheduler<E>)
    where
        I: IntoIterator<Item = NodeId>,
    {
        self.clear_all(timers);
        self.rendered = ids.into_iter().collect();
    }

    /// Visible tags on `id`, in a fixed order.
    pub fn tags(&self, id: NodeId) -> BTreeSet<HighlightTag> {
        self.entries
            .get(&id)
            .map(|slots| {
                slots
                    .iter()
                    .filter(|(_, slot)| matches!(slot, Slot::Active { .. }))
                    .map(|(tag, _)| *tag)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has(&self, id: NodeId, tag: HighlightTag) -> bool {
        matches!(
            self.entries.get(&id).and_then(|slots| slots.get(&tag)),
            Some(Slot::Active { .. })
        )
    }

    /// Ids currently showing `tag`.
    pub fn ids_with(&self, tag: HighlightTag) -> Vec<NodeId> {
        self.entries
            .iter()
            .filter(|(_, slots)| matches!(slots.get(&tag), Some(Slot::Active { .. })))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Outstanding timers owned by the machine.
    pub fn pending_timers(&self) -> usize {
        self.entries
            .values()
            .flat_map(|slots| slots.values())
            .filter(|slot| slot.handle().is_some())
            .count()
    }

    /// Flips `selected` on `id`, leaving its other tags alone. Returns the new
    /// selection state, or `None` when `id` is not rendered.
    pub fn toggle_selected(&mut self, id: NodeId) -> Option<bool> {
        if !self.is_rendered(id) {
            return None;
        }
        let slots = self.entries.entry(id).or_default();
        let selected = if slots.remove(&HighlightTag::Selected).is_some() {
            false
        } else {
            slots.insert(HighlightTag::Selected, Slot::Active { expiry: None });
            true
        };
        if slots.is_empty() {
            self.entries.remove(&id);
        }
        Some(selected)
    }

    pub fn start_search<E>(&mut self, id: NodeId, timers: &mut Scheduler<E>) -> bool
    where
        E: From<HighlightTimer>,
    {
        let hold = self.search_hold;
        self.start_search_for(id, hold, timers)
    }

    /// Marks `id` as the search hit for `hold`, clearing the mark from any
    /// other id first.
    pub fn start_search_for<E>(&mut self, id: NodeId, hold: Duration, timers: &mut Scheduler<E>) -> bool
    where
        E: From<HighlightTimer>,
    {
        if !self.is_rendered(id) {
            return false;
        }
        for other in self.ids_holding(HighlightTag::Searching) {
            self.remove_tag(other, HighlightTag::Searching, timers);
        }
        let expiry = timers.schedule(
            hold,
            E::from(HighlightTimer::Expire {
                id,
                tag: HighlightTag::Searching,
            }),
        );
        self.entries.entry(id).or_default().insert(
            HighlightTag::Searching,
            Slot::Active {
                expiry: Some(expiry),
            },
        );
        true
    }

    pub fn start_validation_sweep<E>(
        &mut self,
        ids: &[NodeId],
        valid: bool,
        timers: &mut Scheduler<E>,
    ) -> usize
    where
        E: From<HighlightTimer>,
    {
        let (stagger, hold) = (self.stagger, self.validate_hold);
        self.start_validation_sweep_with(ids, valid, stagger, hold, timers)
    }

    /// Applies the validation tag to every rendered id in `ids`, the i-th one
    /// `i * stagger` after the sweep starts, each expiring `hold` after its own
    /// activation. Ids that are not rendered are skipped and do not consume a
    /// stagger slot. Returns how many ids the sweep covers.
    pub fn start_validation_sweep_with<E>(
        &mut self,
        ids: &[NodeId],
        valid: bool,
        stagger: Duration,
        hold: Duration,
        timers: &mut Scheduler<E>,
    ) -> usize
    where
        E: From<HighlightTimer>,
    {
        let tag = HighlightTag::for_validation(valid);
        let targets: Vec<NodeId> = ids
            .iter()
            .copied()
            .filter(|id| self.is_rendered(*id))
            .collect();

        for (index, &id) in targets.iter().enumerate() {
            self.remove_tag(id, HighlightTag::ValidatingOk, timers);
            self.remove_tag(id, HighlightTag::ValidatingErr, timers);

            let delay = stagger.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));
            let slot = if delay.is_zero() {
                Slot::Active {
                    expiry: Some(timers.schedule(hold, E::from(HighlightTimer::Expire { id, tag }))),
                }
            } else {
                Slot::Pending {
                    activation: timers.schedule(delay, E::from(HighlightTimer::Activate { id, tag })),
                    hold,
                }
            };
            self.entries.entry(id).or_default().insert(tag, slot);
        }
        tracing::debug!(nodes = targets.len(), valid, "validation sweep scheduled");
        targets.len()
    }

    /// Applies a fired timer. Events whose handle no longer matches the slot
    /// are stale and ignored. Returns whether any visible tag changed.
    pub fn handle_timer<E>(
        &mut self,
        handle: TimerHandle,
        event: HighlightTimer,
        timers: &mut Scheduler<E>,
    ) -> bool
    where
        E: From<HighlightTimer>,
    {
        match event {
            HighlightTimer::Activate { id, tag } => {
                let Some(slot) = self.entries.get_mut(&id).and_then(|slots| slots.get_mut(&tag)) else {
                    return false;
                };
                let Slot::Pending { activation, hold } = *slot else {
                    return false;
                };
                if activation != handle {
                    return false;
                }
                let expiry = timers.schedule(hold, E::from(HighlightTimer::Expire { id, tag }));
                *slot = Slot::Active {
                    expiry: Some(expiry),
                };
                true
            }
            HighlightTimer::Expire { id, tag } => {
                let current = self
                    .entries
                    .get(&id)
                    .and_then(|slots| slots.get(&tag))
                    .and_then(Slot::handle);
                if current != Some(handle) {
                    tracing::trace!(id, ?tag, "stale highlight expiry ignored");
                    return false;
                }
                self.drop_slot(id, tag);
                true
            }
        }
    }

    /// Removes every tag from every id and cancels all timers.
    pub fn clear_all<E>(&mut self, timers: &mut Scheduler<E>) {
        for slots in std::mem::take(&mut self.entries).into_values() {
            for slot in slots.into_values() {
                if let Some(handle) = slot.handle() {
                    timers.cancel(handle);
                }
            }
        }
    }

    fn ids_holding(&self, tag: HighlightTag) -> Vec<NodeId> {
        self.entries
            .iter()
            .filter(|(_, slots)| slots.contains_key(&tag))
            .map(|(id, _)| *id)
            .collect()
    }

    fn remove_tag<E>(&mut self, id: NodeId, tag: HighlightTag, timers: &mut Scheduler<E>) {
        if let Some(slot) = self.drop_slot(id, tag)
            && let Some(handle) = slot.handle()
        {
            timers.cancel(handle);
        }
    }

    fn drop_slot(&mut self, id: NodeId, tag: HighlightTag) -> Option<Slot> {
        let slots = self.entries.get_mut(&id)?;
        let slot = slots.remove(&tag);
        if slots.is_empty() {
            self.entries.remove(&id);
        }
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn machine(ids: &[NodeId], timers: &mut Scheduler<HighlightTimer>) -> HighlightStateMachine {
        let mut machine = HighlightStateMachine::new(&TimingConfig::default());
        machine.replace_rendered(ids.iter().copied(), timers);
        machine
    }

    fn advance(
        machine: &mut HighlightStateMachine,
        timers: &mut Scheduler<HighlightTimer>,
        until: Duration,
    ) {
        while let Some((handle, event)) = timers.pop_due(until) {
            machine.handle_timer(handle, event, timers);
        }
        timers.settle(until);
    }

    #[test]
    fn far_future_holds_do_not_overflow() {
        let mut timers = Scheduler::new();
        let mut machine = machine(&[1, 2, 3], &mut timers);
        timers.settle(ms(5));
        assert!(machine.start_search_for(1, Duration::MAX, &mut timers));
        assert_eq!(
            machine.start_validation_sweep_with(&[1, 2, 3], true, Duration::MAX, ms(10), &mut timers),
            3
        );
        advance(&mut machine, &mut timers, ms(1000));
        assert!(machine.has(1, HighlightTag::Searching));
        assert!(!machine.has(1, HighlightTag::ValidatingOk));
        assert!(!machine.has(2, HighlightTag::ValidatingOk));
        assert_eq!(timers.next_due(), Some(Duration::MAX));
    }

    #[test]
    fn selection_round_trips() {
        let mut timers = Scheduler::new();
        let mut machine = machine(&[10], &mut timers);
        assert_eq!(machine.toggle_selected(10), Some(true));
        assert!(machine.has(10, HighlightTag::Selected));
        assert_eq!(machine.toggle_selected(10), Some(false));
        assert!(machine.tags(10).is_empty());
        assert_eq!(machine.toggle_selected(99), None);
    }

    #[test]
    fn click_leaves_search_tag_alone() {
        let mut timers = Scheduler::new();
        let mut machine = machine(&[10], &mut timers);
        machine.start_search(10, &mut timers);
        machine.toggle_selected(10);
        machine.toggle_selected(10);
        assert!(machine.has(10, HighlightTag::Searching));
    }

    #[test]
    fn only_one_search_at_a_time() {
        let mut timers = Scheduler::new();
        let mut machine = machine(&[1, 2, 3], &mut timers);
        assert!(machine.start_search(1, &mut timers));
        assert!(machine.start_search(2, &mut timers));
        assert_eq!(machine.ids_with(HighlightTag::Searching), vec![2]);
        assert_eq!(timers.pending(), 1);
        assert!(!machine.start_search(42, &mut timers));
        assert_eq!(machine.ids_with(HighlightTag::Searching), vec![2]);
    }

    #[test]
    fn search_expires_after_hold() {
        let mut timers = Scheduler::new();
        let mut machine = machine(&[1], &mut timers);
        machine.start_search(1, &mut timers);
        advance(&mut machine, &mut timers, ms(5999));
        assert!(machine.has(1, HighlightTag::Searching));
        advance(&mut machine, &mut timers, ms(6000));
        assert!(!machine.has(1, HighlightTag::Searching));
    }

    #[test]
    fn restarting_search_extends_hold() {
        let mut timers = Scheduler::new();
        let mut machine = machine(&[1], &mut timers);
        machine.start_search(1, &mut timers);
        advance(&mut machine, &mut timers, ms(4000));
        machine.start_search(1, &mut timers);
        advance(&mut machine, &mut timers, ms(7000));
        assert!(machine.has(1, HighlightTag::Searching));
        advance(&mut machine, &mut timers, ms(10_000));
        assert!(!machine.has(1, HighlightTag::Searching));
    }

    #[test]
    fn sweep_staggers_activation() {
        let mut timers = Scheduler::new();
        let mut machine = machine(&[1, 2, 3], &mut timers);
        assert_eq!(machine.start_validation_sweep(&[1, 2, 3], true, &mut timers), 3);
        assert!(machine.has(1, HighlightTag::ValidatingOk));
        assert!(!machine.has(2, HighlightTag::ValidatingOk));

        advance(&mut machine, &mut timers, ms(50));
        assert!(machine.has(2, HighlightTag::ValidatingOk));
        assert!(!machine.has(3, HighlightTag::ValidatingOk));

        advance(&mut machine, &mut timers, ms(1000));
        assert!(!machine.has(1, HighlightTag::ValidatingOk));
        assert!(machine.has(2, HighlightTag::ValidatingOk));
        assert!(machine.has(3, HighlightTag::ValidatingOk));

        advance(&mut machine, &mut timers, ms(1100));
        assert!(machine.ids_with(HighlightTag::ValidatingOk).is_empty());
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn sweep_skips_unrendered_ids() {
        let mut timers = Scheduler::new();
        let mut machine = machine(&[1, 2], &mut timers);
        assert_eq!(machine.start_validation_sweep(&[7, 2, 1], false, &mut timers), 2);
        assert!(machine.has(2, HighlightTag::ValidatingErr));
        advance(&mut machine, &mut timers, ms(50));
        assert!(machine.has(1, HighlightTag::ValidatingErr));
    }

    #[test]
    fn repeated_sweep_supersedes_previous() {
        let mut timers = Scheduler::new();
        let mut machine = machine(&[1, 2], &mut timers);
        machine.start_validation_sweep(&[1, 2], true, &mut timers);
        machine.start_validation_sweep(&[1, 2], false, &mut timers);
        assert!(!machine.has(1, HighlightTag::ValidatingOk));
        assert!(machine.has(1, HighlightTag::ValidatingErr));
        assert_eq!(timers.pending(), 2);
        advance(&mut machine, &mut timers, ms(2000));
        assert!(machine.tags(1).is_empty());
        assert!(machine.tags(2).is_empty());
    }

    #[test]
    fn sweep_and_search_are_independent() {
        let mut timers = Scheduler::new();
        let mut machine = machine(&[1, 2], &mut timers);
        machine.start_search(1, &mut timers);
        machine.start_validation_sweep(&[1, 2], true, &mut timers);
        assert!(machine.has(1, HighlightTag::Searching));
        assert!(machine.has(1, HighlightTag::ValidatingOk));
        advance(&mut machine, &mut timers, ms(1100));
        assert!(machine.has(1, HighlightTag::Searching));
    }

    #[test]
    fn redraw_cancels_everything() {
        let mut timers = Scheduler::new();
        let mut machine = machine(&[1, 2, 3], &mut timers);
        machine.toggle_selected(1);
        machine.start_search(2, &mut timers);
        machine.start_validation_sweep(&[1, 2, 3], true, &mut timers);
        assert!(timers.pending() > 0);

        machine.replace_rendered([1, 2], &mut timers);
        assert_eq!(timers.pending(), 0);
        assert_eq!(machine.pending_timers(), 0);
        assert!(machine.tags(1).is_empty());
        assert!(!machine.is_rendered(3));
        assert_eq!(machine.toggle_selected(3), None);
    }
}
