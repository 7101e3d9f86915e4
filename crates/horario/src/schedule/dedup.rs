//! Collapses course records into one course per identity.

use super::types::{Course, CourseId, SlotKey, TimeSlot};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Appends every slot of `incoming` whose `(day, start, finish, place)` key is
/// not already present in `slots`.
///
/// A matching slot is never overwritten: the teacher already on it wins.
/// Returns the number of slots appended.
pub(crate) fn union_slots(
    slots: &mut Vec<TimeSlot>,
    incoming: impl IntoIterator<Item = TimeSlot>,
) -> usize {
    let mut seen: HashSet<SlotKey> = slots.iter().map(TimeSlot::key).collect();
    let before = slots.len();

    for slot in incoming {
        if seen.insert(slot.key()) {
            slots.push(slot);
        }
    }

    slots.len() - before
}

/// Deduplicates course records by identity (`code-section`).
///
/// - the first record seen for an identity seeds the entry
/// - later records only contribute slots not already present
/// - every entry's slots end up sorted by day, then start time
/// - output order is the order in which identities were first seen
///
/// Records with an empty `code` are skipped. Running this on its own output
/// is a no-op.
pub fn deduplicate(courses: impl IntoIterator<Item = Course>) -> Vec<Course> {
    let mut index: HashMap<CourseId, usize> = HashMap::new();
    let mut unique: Vec<Course> = Vec::new();
    let mut combined = 0usize;

    for course in courses {
        if course.code.is_empty() {
            continue;
        }

        let id = course.id();
        match index.get(&id) {
            Some(&position) => {
                combined += 1;
                let existing = &mut unique[position];
                if existing.course.is_empty() {
                    existing.course = course.course;
                }
                existing.was_updated |= course.was_updated;
                union_slots(&mut existing.time_slots, course.time_slots);
            }
            None => {
                let mut seed = course;
                let slots = std::mem::take(&mut seed.time_slots);
                union_slots(&mut seed.time_slots, slots);
                index.insert(id, unique.len());
                unique.push(seed);
            }
        }
    }

    for course in &mut unique {
        course.sort_slots();
    }

    let multi_slot = unique.iter().filter(|c| c.time_slots.len() > 1).count();
    debug!(
        unique = unique.len(),
        combined, multi_slot, "Deduplicated course records"
    );

    unique
}
