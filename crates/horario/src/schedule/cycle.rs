//! One fetch cycle: feed -> normalise -> deduplicate -> reconcile -> persist.

use super::client::{generate_cycle_id, CourseFeed};
use super::dedup::deduplicate;
use super::error::ScheduleError;
use super::normalize::ingest_nodes;
use super::reconcile::reconcile;
use super::selection::Selection;
use super::types::{Course, CourseCache};
use crate::db::{self, KeyValueStore, StoreKey};
use serde::Serialize;
use tracing::{error, info, warn};

/// Where the courses of a cycle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleSource {
    /// Freshly fetched and reconciled
    Live,
    /// The feed failed; the cached snapshot was projected as-is
    CacheFallback,
}

/// Everything a cycle produced.
#[derive(Debug, Clone, Serialize)]
pub struct CycleOutcome {
    pub courses: Vec<Course>,
    pub changes: Vec<Course>,
    pub source: CycleSource,
    /// Timestamp shared by every course stamped in this cycle
    pub fetched_at: i64,
    pub invalid_records: usize,
}

/// Projects the cached snapshot directly, ignoring `lastSeen` and selection.
pub fn fallback_from_cache(cache: &CourseCache) -> Vec<Course> {
    deduplicate(cache.values().cloned())
}

/// Runs one complete fetch cycle against `feed` and `store`.
///
/// The selection is read once, up front, and used for the whole pass. On a
/// feed failure the cached snapshot is served instead; only a failure with
/// an empty snapshot is returned as an error ([`ScheduleError::NoData`]).
pub async fn run_fetch_cycle<F>(
    feed: &F,
    store: &dyn KeyValueStore,
    now: i64,
) -> Result<CycleOutcome, ScheduleError>
where
    F: CourseFeed + Sync,
{
    let cycle_id = generate_cycle_id();
    let selection: Selection = db::load_or_default(store, StoreKey::SelectedCourses);
    let previous: CourseCache = db::load_or_default(store, StoreKey::StoredApiCourses);

    info!(
        cycle = %cycle_id,
        selected = selection.len(),
        cached = previous.len(),
        "Starting fetch cycle"
    );

    match feed.fetch_nodes().await {
        Ok(nodes) => {
            let ingested = ingest_nodes(nodes);
            if !ingested.invalid.is_empty() {
                warn!(
                    cycle = %cycle_id,
                    invalid = ingested.invalid.len(),
                    "Feed contained malformed records"
                );
            }

            let unique = deduplicate(ingested.courses);
            let reconciliation = reconcile(unique, &previous, &selection, now);

            for changed in &reconciliation.changes {
                info!(cycle = %cycle_id, course_id = %changed.id(), "Course schedule updated");
            }

            if !db::save(store, StoreKey::StoredApiCourses, &reconciliation.cache) {
                warn!(cycle = %cycle_id, "Course snapshot was not persisted");
            }

            Ok(CycleOutcome {
                courses: reconciliation.courses,
                changes: reconciliation.changes,
                source: CycleSource::Live,
                fetched_at: now,
                invalid_records: ingested.invalid.len(),
            })
        }
        Err(e) => {
            error!(cycle = %cycle_id, error = %e, "Course feed unavailable");

            if previous.is_empty() {
                return Err(ScheduleError::NoData {
                    reason: e.to_string(),
                });
            }

            warn!(
                cycle = %cycle_id,
                cached = previous.len(),
                "Serving cached course snapshot"
            );
            Ok(CycleOutcome {
                courses: fallback_from_cache(&previous),
                changes: Vec::new(),
                source: CycleSource::CacheFallback,
                fetched_at: now,
                invalid_records: 0,
            })
        }
    }
}
