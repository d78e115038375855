//! Effect scheduler: the state machine deciding which instances are live.
//!
//! Mutation of the Active set happens only inside `tick()`. Each tick runs a
//! fixed sequence:
//! 0. apply pending cancellations (`clear_all`, `cancel`, preemption losers);
//! 1. expire finished instances and drop those whose lines were evicted;
//! 2. promote Queued instances (FIFO), then resolve intake requests (FIFO);
//! 3. ambient rolls driven by the corruption profile.
//!
//! `submit` answers synchronously. The request is checked against the state
//! projected to the next tick (Active instances still alive then, plus
//! instances already Queued) and, when accepted, waits Queued until step 2.
//! A newcomer beats colliding instances only with strictly higher priority;
//! the losers are condemned and leave at the next boundary.
//!
//! The renderer never sees this type: hosts pass `active_snapshot()` along.

use core_config::SchedulerConfig;
use core_effects::{
    CancelReason, CooldownKey, EffectDuration, EffectInstance, EffectRegistry, EffectRequest,
    InstanceId, InstanceState, Origin, Rejection, Ticket,
};
use core_state::CorruptionProfile;
use core_text::TextBuffer;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use smallvec::SmallVec;
use std::collections::{BTreeMap, VecDeque};
use std::ops::Range;
use std::sync::atomic::Ordering;
use tracing::{debug, trace};

mod ambient;
pub mod metrics;
pub mod report;

pub use metrics::{SchedulerMetrics, SchedulerMetricsSnapshot};
pub use report::{CancelOutcome, TickReport};

/// Intensity used when a request leaves it out.
pub const DEFAULT_INTENSITY: f32 = 0.5;

/// Terminal states kept around for `instance_state` queries.
const HISTORY_LIMIT: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    /// Outside a tick: queue for the next boundary.
    Deferred,
    /// Inside a tick: straight into the Active set.
    Immediate,
}

#[derive(Debug)]
pub struct EffectScheduler<R: RngCore = StdRng> {
    registry: EffectRegistry,
    now: u64,
    next_id: u64,
    active: Vec<EffectInstance>,
    queued: VecDeque<EffectInstance>,
    /// Instances leaving at the next boundary and why.
    condemned: BTreeMap<InstanceId, CancelReason>,
    intake: VecDeque<(Ticket, EffectRequest)>,
    history: VecDeque<(InstanceId, InstanceState)>,
    ambient_cursor: usize,
    max_ambient_rolls: usize,
    rng: R,
    metrics: SchedulerMetrics,
}

impl EffectScheduler<StdRng> {
    pub fn new(registry: EffectRegistry, cfg: &SchedulerConfig) -> Self {
        Self::with_rng(registry, cfg, StdRng::seed_from_u64(cfg.seed))
    }
}

impl<R: RngCore> EffectScheduler<R> {
    /// Scheduler drawing randomness from `rng` (tests inject scripted sources).
    pub fn with_rng(registry: EffectRegistry, cfg: &SchedulerConfig, rng: R) -> Self {
        Self {
            registry,
            now: 0,
            next_id: 1,
            active: Vec::new(),
            queued: VecDeque::new(),
            condemned: BTreeMap::new(),
            intake: VecDeque::new(),
            history: VecDeque::new(),
            ambient_cursor: 0,
            max_ambient_rolls: cfg.max_ambient_rolls,
            rng,
            metrics: SchedulerMetrics::default(),
        }
    }

    /// Last processed tick (0 before the first `tick()`).
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &SchedulerMetrics {
        &self.metrics
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Validate and accept a request for the next tick.
    pub fn submit(
        &mut self,
        request: EffectRequest,
        profile: &mut CorruptionProfile,
        buffer: &TextBuffer,
    ) -> Result<InstanceId, Rejection> {
        let activation = self.now + 1;
        let result = self.admit(
            &request,
            Origin::Explicit,
            activation,
            Admission::Deferred,
            profile,
            buffer,
        );
        self.note_outcome(&request, &result);
        result
    }

    /// Park a request from another execution context; it is resolved during
    /// step 2 of the next tick and reported under `ticket`.
    pub fn enqueue(&mut self, ticket: Ticket, request: EffectRequest) {
        trace!(target: "effects.scheduler", ticket = ticket.0, kind = request.kind.as_str(), "intake_enqueued");
        self.intake.push_back((ticket, request));
    }

    pub fn pending_intake(&self) -> usize {
        self.intake.len()
    }

    /// Cancel every Active and Queued instance. Affected instances disappear
    /// from `active_snapshot()` immediately and leave at the next boundary.
    pub fn clear_all(&mut self) -> usize {
        let mut hidden = 0;
        for inst in self.active.iter().chain(self.queued.iter()) {
            let prev = self.condemned.insert(inst.id, CancelReason::Cleared);
            if !matches!(
                prev,
                Some(CancelReason::Cleared | CancelReason::Explicit)
            ) {
                hidden += 1;
            }
        }
        debug!(target: "effects.scheduler", tick = self.now, hidden, "clear_all");
        hidden
    }

    /// Cancel a single Queued or Active instance.
    pub fn cancel(&mut self, id: InstanceId) -> CancelOutcome {
        let live = self.active.iter().chain(self.queued.iter()).any(|i| i.id == id);
        if !live || self.is_hidden(id) {
            return CancelOutcome::NotFound;
        }
        self.condemned.insert(id, CancelReason::Explicit);
        debug!(target: "effects.scheduler", %id, "cancel_requested");
        CancelOutcome::Cancelled
    }

    /// Instances the renderer should draw, ordered by id.
    pub fn active_snapshot(&self) -> Vec<&EffectInstance> {
        self.active
            .iter()
            .filter(|i| !self.is_hidden(i.id))
            .collect()
    }

    pub fn instance_state(&self, id: InstanceId) -> Option<InstanceState> {
        if self.active.iter().any(|i| i.id == id) {
            return Some(InstanceState::Active);
        }
        if self.queued.iter().any(|i| i.id == id) {
            return Some(InstanceState::Queued);
        }
        self.history
            .iter()
            .rev()
            .find(|(h, _)| *h == id)
            .map(|(_, s)| *s)
    }

    pub fn get(&self, id: InstanceId) -> Option<&EffectInstance> {
        self.active
            .iter()
            .chain(self.queued.iter())
            .find(|i| i.id == id)
    }

    /// Advance one tick. `visible` is the absolute index range of buffer lines
    /// on screen; it scopes ambient rolls.
    pub fn tick(
        &mut self,
        profile: &mut CorruptionProfile,
        buffer: &TextBuffer,
        visible: Range<usize>,
    ) -> TickReport {
        self.now += 1;
        let now = self.now;
        let mut report = TickReport::new(now);
        self.metrics.ticks.fetch_add(1, Ordering::Relaxed);

        // 0. pending cancellations
        self.apply_condemned(&mut report);

        // 1. expiry and eviction
        self.expire(buffer, &mut report);
        profile.prune_cooldowns(now);

        // 2. promotion, then intake
        while let Some(inst) = self.queued.pop_front() {
            if Self::evicted(&inst, buffer) {
                self.retire_cancelled(inst.id, CancelReason::TargetEvicted, &mut report);
                continue;
            }
            report.promoted.push(inst.id);
            self.active.push(inst);
        }
        while let Some((ticket, request)) = self.intake.pop_front() {
            let result = self.admit(
                &request,
                Origin::Explicit,
                now,
                Admission::Immediate,
                profile,
                buffer,
            );
            self.note_outcome(&request, &result);
            report.intake.push((ticket, result));
        }

        // 3. ambient
        self.ambient_rolls(profile, buffer, visible, &mut report);

        // Zero-length instances and losers of this tick's admissions.
        self.expire(buffer, &mut report);
        self.apply_condemned(&mut report);

        trace!(
            target: "effects.scheduler",
            tick = now,
            active = self.active.len(),
            promoted = report.promoted.len(),
            expired = report.expired.len(),
            cancelled = report.cancelled.len(),
            ambient = report.ambient_spawned.len(),
            "tick"
        );
        report
    }

    fn is_hidden(&self, id: InstanceId) -> bool {
        matches!(
            self.condemned.get(&id),
            Some(CancelReason::Cleared | CancelReason::Explicit)
        )
    }

    fn evicted(inst: &EffectInstance, buffer: &TextBuffer) -> bool {
        inst.target
            .range()
            .is_some_and(|r| !buffer.intersects(&r))
    }

    /// Instances that would be live at `activation`, excluding condemned ones.
    fn live<'a>(
        &'a self,
        activation: u64,
        buffer: &'a TextBuffer,
    ) -> impl Iterator<Item = &'a EffectInstance> + 'a {
        self.active
            .iter()
            .filter(move |i| !i.is_expired_at(activation))
            .chain(self.queued.iter())
            .filter(move |i| !self.condemned.contains_key(&i.id))
            .filter(move |i| !Self::evicted(i, buffer))
    }

    /// Shared validation and conflict resolution for every request source.
    fn admit(
        &mut self,
        request: &EffectRequest,
        origin: Origin,
        activation: u64,
        mode: Admission,
        profile: &mut CorruptionProfile,
        buffer: &TextBuffer,
    ) -> Result<InstanceId, Rejection> {
        let descriptor = *self.registry.lookup(&request.kind)?;
        let target = request.target;
        descriptor
            .applies_to(&target)
            .map_err(|reason| Rejection::InvalidTarget { target, reason })?;
        if let Some(range) = target.range()
            && !buffer.contains_range(&range)
        {
            return Err(Rejection::InvalidTarget {
                target,
                reason: "lines not in buffer",
            });
        }
        let intensity = match request.intensity {
            None => DEFAULT_INTENSITY,
            Some(v) if !v.is_finite() => return Err(Rejection::InvalidIntensity),
            Some(v) => v.clamp(0.0, 1.0),
        };
        let key = CooldownKey {
            kind: descriptor.kind,
            target,
        };
        profile
            .cooldown_ready(&key, activation)
            .map_err(|ready_at| Rejection::CooldownActive { ready_at })?;

        let priority = request.priority.unwrap_or(match origin {
            Origin::Explicit => descriptor.priority,
            Origin::Ambient => descriptor.ambient_priority,
        });
        let mut losers: SmallVec<[InstanceId; 4]> = SmallVec::new();
        let mut holder: Option<(i32, InstanceId)> = None;
        for inst in self.live(activation, buffer) {
            if !inst.collides_with(descriptor.group, &target) {
                continue;
            }
            if inst.priority >= priority {
                if holder.is_none_or(|(p, _)| inst.priority > p) {
                    holder = Some((inst.priority, inst.id));
                }
            } else {
                losers.push(inst.id);
            }
        }
        if let Some((_, holder)) = holder {
            return Err(Rejection::ConflictLost { holder });
        }

        let id = InstanceId(self.next_id);
        self.next_id += 1;
        let instance = EffectInstance {
            id,
            kind: descriptor.kind,
            target,
            start_tick: activation,
            duration: request
                .duration
                .unwrap_or(EffectDuration::Ticks(descriptor.duration.midpoint())),
            intensity,
            priority,
            group: descriptor.group,
            cooldown_key: key,
            seed: self.rng.next_u64(),
            origin,
        };
        let cooldown = profile.cooldown_ticks(&descriptor);
        if cooldown > 0 {
            profile.arm_cooldown(key, activation + cooldown);
        }
        for loser in losers {
            debug!(target: "effects.scheduler", %loser, winner = %id, "instance_preempted");
            self.condemned
                .entry(loser)
                .or_insert(CancelReason::Preempted { by: id });
            self.metrics.preemptions.fetch_add(1, Ordering::Relaxed);
        }
        match mode {
            Admission::Deferred => self.queued.push_back(instance),
            Admission::Immediate => self.active.push(instance),
        }
        self.metrics.accepted.fetch_add(1, Ordering::Relaxed);
        Ok(id)
    }

    fn note_outcome(&self, request: &EffectRequest, result: &Result<InstanceId, Rejection>) {
        match result {
            Ok(id) => debug!(
                target: "effects.scheduler",
                %id,
                kind = request.kind.as_str(),
                target = %request.target,
                "request_accepted"
            ),
            Err(rejection) => {
                self.metrics.record_rejection(rejection);
                debug!(
                    target: "effects.scheduler",
                    kind = request.kind.as_str(),
                    target = %request.target,
                    reason = rejection.label(),
                    detail = %rejection,
                    "request_rejected"
                );
            }
        }
    }

    fn expire(&mut self, buffer: &TextBuffer, report: &mut TickReport) {
        let now = self.now;
        let mut expired: SmallVec<[InstanceId; 8]> = SmallVec::new();
        let mut evicted: SmallVec<[InstanceId; 8]> = SmallVec::new();
        self.active.retain(|inst| {
            if inst.is_expired_at(now) {
                expired.push(inst.id);
                false
            } else if Self::evicted(inst, buffer) {
                evicted.push(inst.id);
                false
            } else {
                true
            }
        });
        SchedulerMetrics::bump(&self.metrics.expirations, expired.len() as u64);
        for id in expired {
            self.condemned.remove(&id);
            self.retire(id, InstanceState::Expired);
            report.expired.push(id);
        }
        for id in evicted {
            self.condemned.remove(&id);
            self.retire_cancelled(id, CancelReason::TargetEvicted, report);
        }
    }

    fn apply_condemned(&mut self, report: &mut TickReport) {
        if self.condemned.is_empty() {
            return;
        }
        let condemned = std::mem::take(&mut self.condemned);
        let mut removed: Vec<(InstanceId, CancelReason)> = Vec::new();
        self.active.retain(|inst| match condemned.get(&inst.id) {
            Some(reason) => {
                removed.push((inst.id, *reason));
                false
            }
            None => true,
        });
        self.queued.retain(|inst| match condemned.get(&inst.id) {
            Some(reason) => {
                removed.push((inst.id, *reason));
                false
            }
            None => true,
        });
        for (id, reason) in removed {
            self.retire_cancelled(id, reason, report);
        }
    }

    fn retire_cancelled(&mut self, id: InstanceId, reason: CancelReason, report: &mut TickReport) {
        debug!(target: "effects.scheduler", %id, ?reason, "instance_cancelled");
        self.retire(id, InstanceState::Cancelled);
        self.metrics.cancellations.fetch_add(1, Ordering::Relaxed);
        report.cancelled.push((id, reason));
    }

    fn retire(&mut self, id: InstanceId, state: InstanceState) {
        self.history.push_back((id, state));
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
    }
}
