//! Reconciles a freshly fetched course list against the persisted snapshot.

use super::dedup::union_slots;
use super::selection::Selection;
use super::types::{Course, CourseCache, SlotKey, TimeSlot};
use std::collections::HashMap;
use tracing::{debug, info};

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// The fetched courses, plus cached copies of selected courses the feed omitted.
    pub courses: Vec<Course>,
    /// The snapshot to persist, replacing the previous one wholesale.
    pub cache: CourseCache,
    /// Fetched courses whose slots differ from the cached ones.
    pub changes: Vec<Course>,
    /// Number of selected courses re-injected from the snapshot.
    pub restored: usize,
}

fn slot_multiset(slots: &[TimeSlot]) -> HashMap<SlotKey, usize> {
    let mut counts = HashMap::new();
    for slot in slots {
        *counts.entry(slot.key()).or_insert(0) += 1;
    }
    counts
}

/// Returns true if the two slot lists differ as multisets of
/// `(day, start, finish, place)`. Order and teachers are ignored.
pub fn slots_changed(cached: &[TimeSlot], fetched: &[TimeSlot]) -> bool {
    cached.len() != fetched.len() || slot_multiset(cached) != slot_multiset(fetched)
}

/// Merges `fetched` (already deduplicated) into `previous`.
///
/// `selection` must be captured once by the caller for the whole cycle and
/// `now` is the shared timestamp of this fetch.
pub fn reconcile(
    fetched: Vec<Course>,
    previous: &CourseCache,
    selection: &Selection,
    now: i64,
) -> Reconciliation {
    let mut cache = previous.clone();
    let mut courses = Vec::with_capacity(fetched.len());
    let mut changes = Vec::new();

    for mut course in fetched {
        let id = course.id();
        course.last_seen = Some(now);
        course.was_updated = false;

        let entry = match cache.get(&id) {
            Some(cached) => {
                if slots_changed(&cached.time_slots, &course.time_slots) {
                    debug!(course_id = %id, "Course slots changed since last fetch");
                    course.was_updated = true;
                    changes.push(course.clone());
                }

                let mut merged = Course {
                    was_updated: false,
                    ..course.clone()
                };
                union_slots(&mut merged.time_slots, cached.time_slots.iter().cloned());
                merged.sort_slots();
                merged
            }
            None => Course {
                was_updated: false,
                ..course.clone()
            },
        };

        cache.insert(id, entry);
        courses.push(course);
    }

    let mut restored = 0;
    for (id, cached) in &cache {
        if cached.last_seen != Some(now) && selection.contains(id) {
            debug!(course_id = %id, last_seen = ?cached.last_seen, "Restoring selected course missing from feed");
            courses.push(cached.clone());
            restored += 1;
        }
    }

    info!(
        fetched = courses.len() - restored,
        cached = cache.len(),
        changed = changes.len(),
        restored,
        "Reconciled feed against cached snapshot"
    );

    Reconciliation {
        courses,
        cache,
        changes,
        restored,
    }
}
