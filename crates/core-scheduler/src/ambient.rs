//! Ambient rolls: spontaneous corruption proportional to the level.
//!
//! Slots are `(target, category)` pairs over the visible lines (ascending)
//! followed by `Global`, each target trying every category in `Category::ALL`
//! order. A rotating cursor picks where this tick's capped run of rolls
//! starts so every slot gets its turn across ticks.

use crate::report::TickReport;
use crate::{Admission, EffectScheduler};
use core_effects::{
    Applicability, Category, EffectDuration, EffectKindDescriptor, EffectRequest, Origin, Target,
};
use core_state::CorruptionProfile;
use core_text::TextBuffer;
use rand::{Rng, RngCore};
use smallvec::SmallVec;
use std::ops::Range;
use std::sync::atomic::Ordering;
use tracing::trace;

/// Longest block an ambient block-kind instance spans.
const MAX_AMBIENT_BLOCK: usize = 3;

impl<R: RngCore> EffectScheduler<R> {
    pub(crate) fn ambient_rolls(
        &mut self,
        profile: &mut CorruptionProfile,
        buffer: &TextBuffer,
        visible: Range<usize>,
        report: &mut TickReport,
    ) {
        let lines = visible.start.max(buffer.first_index())..visible.end.min(buffer.next_index());
        let line_count = lines.len();
        let slots = (line_count + 1) * Category::ALL.len();
        let budget = self.max_ambient_rolls.min(slots);
        if budget == 0 {
            return;
        }
        let start = self.ambient_cursor % slots;
        for step in 0..budget {
            let slot = (start + step) % slots;
            let category = Category::ALL[slot % Category::ALL.len()];
            let target_slot = slot / Category::ALL.len();
            let target = if target_slot < line_count {
                Target::line(lines.start + target_slot)
            } else {
                Target::Global
            };
            let probability = profile.trigger_probability(category);
            let roll: f64 = self.rng.random();
            report.ambient_rolls += 1;
            if roll < probability {
                self.spawn_ambient(category, target, lines.end, profile, buffer, report);
            }
        }
        self.ambient_cursor = (start + budget) % slots;
        self.metrics
            .ambient_rolls
            .fetch_add(budget as u64, Ordering::Relaxed);
    }

    fn spawn_ambient(
        &mut self,
        category: Category,
        target: Target,
        visible_end: usize,
        profile: &mut CorruptionProfile,
        buffer: &TextBuffer,
        report: &mut TickReport,
    ) {
        let candidates: SmallVec<[EffectKindDescriptor; 8]> = self
            .registry
            .in_category(category)
            .filter(|d| (d.applicability == Applicability::Global) == (target == Target::Global))
            .copied()
            .collect();
        if candidates.is_empty() {
            return;
        }
        let descriptor = candidates[self.rng.random_range(0..candidates.len())];
        let target = match (descriptor.applicability, target) {
            (Applicability::Block, Target::Lines { start, .. }) => {
                let span = self.rng.random_range(1..=MAX_AMBIENT_BLOCK);
                Target::Lines {
                    start,
                    end: (start + span).min(visible_end).max(start + 1),
                }
            }
            (_, t) => t,
        };
        let request = EffectRequest {
            kind: descriptor.name.to_string(),
            target,
            intensity: Some(profile.ambient_intensity(self.rng.random())),
            priority: Some(descriptor.ambient_priority),
            duration: Some(EffectDuration::Ticks(
                descriptor.duration.pick(self.rng.next_u32()),
            )),
        };
        let now = self.now;
        match self.admit(
            &request,
            Origin::Ambient,
            now,
            Admission::Immediate,
            profile,
            buffer,
        ) {
            Ok(id) => {
                trace!(target: "effects.scheduler", %id, kind = descriptor.name, %target, "ambient_spawned");
                self.metrics.ambient_spawns.fetch_add(1, Ordering::Relaxed);
                report.ambient_spawned.push(id);
            }
            Err(rejection) => {
                trace!(target: "effects.scheduler", kind = descriptor.name, %target, reason = rejection.label(), "ambient_discarded");
            }
        }
    }
}
