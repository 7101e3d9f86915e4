//! Application-level operations over the store and the course feed.

use super::catalog::{build_catalog, Catalog, CatalogQuery};
use super::client::CourseFeed;
use super::cycle::{run_fetch_cycle, CycleOutcome, CycleSource};
use super::error::ScheduleError;
use super::selection::{
    add_manual_course, combine_with_manual, remove_manual_course, ManualCourseRequest, Selection,
};
use super::transfer::{decode_import, encode_export};
use super::types::{Course, CourseEdge, CourseId};
use crate::db::{self, KeyValueStore, StoreKey};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{info, warn};

/// The combined course list handed to the UI layer.
#[derive(Debug, Clone, Serialize)]
pub struct Schedule {
    pub courses: Vec<CourseEdge>,
    pub selected: Selection,
    pub source: CycleSource,
    pub fetched_at: i64,
}

/// Owns the store, the feed and the outcome of the last fetch cycle.
pub struct ScheduleService<F> {
    store: Arc<dyn KeyValueStore>,
    feed: F,
    last_cycle: RwLock<Option<CycleOutcome>>,
    /// Serialises fetch cycles
    cycle_lock: tokio::sync::Mutex<()>,
    /// Serialises read-modify-write of the selection and manual list
    mutation_lock: Mutex<()>,
}

impl<F> ScheduleService<F>
where
    F: CourseFeed + Sync,
{
    pub fn new(store: Arc<dyn KeyValueStore>, feed: F) -> Self {
        Self {
            store,
            feed,
            last_cycle: RwLock::new(None),
            cycle_lock: tokio::sync::Mutex::new(()),
            mutation_lock: Mutex::new(()),
        }
    }

    fn lock_mutations(&self) -> Result<MutexGuard<'_, ()>, ScheduleError> {
        self.mutation_lock.lock().map_err(|_| ScheduleError::Store {
            message: "mutation lock poisoned".to_string(),
        })
    }

    fn last_outcome(&self) -> Result<CycleOutcome, ScheduleError> {
        let guard = self.last_cycle.read().map_err(|_| ScheduleError::Store {
            message: "cycle state lock poisoned".to_string(),
        })?;
        guard.clone().ok_or_else(|| ScheduleError::NoData {
            reason: "no fetch cycle has completed yet".to_string(),
        })
    }

    /// Runs a fetch cycle. Only one cycle runs at a time; a failed cycle
    /// leaves the previous outcome in place.
    pub async fn refresh(&self) -> Result<CycleOutcome, ScheduleError> {
        let _cycle = self.cycle_lock.lock().await;
        let now = chrono::Utc::now().timestamp_millis();

        let outcome = run_fetch_cycle(&self.feed, self.store.as_ref(), now).await?;
        info!(
            courses = outcome.courses.len(),
            changes = outcome.changes.len(),
            source = ?outcome.source,
            "Fetch cycle complete"
        );

        if let Ok(mut last) = self.last_cycle.write() {
            *last = Some(outcome.clone());
        } else {
            warn!("Cycle state lock poisoned; outcome not retained");
        }
        Ok(outcome)
    }

    pub fn manual_courses(&self) -> Vec<Course> {
        db::load_or_default(self.store.as_ref(), StoreKey::ManualCourses)
    }

    pub fn selection(&self) -> Selection {
        db::load_or_default(self.store.as_ref(), StoreKey::SelectedCourses)
    }

    fn combined(&self) -> Result<(CycleOutcome, Vec<Course>), ScheduleError> {
        let outcome = self.last_outcome()?;
        let courses = combine_with_manual(&outcome.courses, &self.manual_courses());
        Ok((outcome, courses))
    }

    /// The fetched courses merged with the manual ones.
    pub fn courses(&self) -> Result<Vec<Course>, ScheduleError> {
        self.combined().map(|(_, courses)| courses)
    }

    pub fn schedule(&self) -> Result<Schedule, ScheduleError> {
        let (outcome, courses) = self.combined()?;
        Ok(Schedule {
            courses: courses.into_iter().map(CourseEdge::from).collect(),
            selected: self.selection(),
            source: outcome.source,
            fetched_at: outcome.fetched_at,
        })
    }

    pub fn catalog(&self, query: &CatalogQuery) -> Result<Catalog, ScheduleError> {
        let courses = self.courses()?;
        Ok(build_catalog(&courses, &self.selection(), query))
    }

    /// Courses flagged as updated by the last cycle.
    pub fn changes(&self) -> Result<Vec<Course>, ScheduleError> {
        self.last_outcome().map(|outcome| outcome.changes)
    }

    /// Adds or removes `id` from the selection. Returns true if it changed.
    pub fn toggle_selection(&self, id: CourseId, selected: bool) -> Result<bool, ScheduleError> {
        let _guard = self.lock_mutations()?;
        let mut selection = self.selection();
        let changed = selection.toggle(id.clone(), selected);
        if changed {
            self.persist(StoreKey::SelectedCourses, &selection)?;
            info!(course_id = %id, selected, "Selection updated");
        }
        Ok(changed)
    }

    pub fn add_manual(&self, request: ManualCourseRequest) -> Result<Course, ScheduleError> {
        let course = request.into_course()?;
        let _guard = self.lock_mutations()?;

        let mut manual = self.manual_courses();
        let mut selection = self.selection();
        let id = add_manual_course(&mut manual, &mut selection, course.clone());

        self.persist_user_state(&manual, &selection)?;
        info!(course_id = %id, "Manual course added");
        Ok(course)
    }

    /// Removes the manual course `id` and deselects it. Returns how many
    /// manual records were removed.
    pub fn remove_manual(&self, id: &CourseId) -> Result<usize, ScheduleError> {
        let _guard = self.lock_mutations()?;
        let mut manual = self.manual_courses();
        let removed = remove_manual_course(&mut manual, id);
        if removed > 0 {
            let mut selection = self.selection();
            selection.toggle(id.clone(), false);
            self.persist_user_state(&manual, &selection)?;
            info!(course_id = %id, removed, "Manual course removed");
        }
        Ok(removed)
    }

    pub fn export(&self) -> Result<String, ScheduleError> {
        encode_export(&self.selection(), &self.manual_courses(), chrono::Utc::now())
    }

    /// Replaces the selection and the manual list with the content of an
    /// export code. Nothing is written unless the whole code is valid.
    pub fn import(&self, code: &str) -> Result<Selection, ScheduleError> {
        let imported = decode_import(code)?;
        let _guard = self.lock_mutations()?;

        self.persist_user_state(&imported.manual_courses, &imported.selection)?;
        info!(
            selected = imported.selection.len(),
            manual = imported.manual_courses.len(),
            "Imported selection"
        );
        Ok(imported.selection)
    }

    /// Writes the manual list and the selection together, or neither.
    fn persist_user_state(&self, manual: &[Course], selection: &Selection) -> Result<(), ScheduleError> {
        let entries = [
            (StoreKey::ManualCourses, db::encode(StoreKey::ManualCourses, manual)?),
            (StoreKey::SelectedCourses, db::encode(StoreKey::SelectedCourses, selection)?),
        ];
        db::save_all(self.store.as_ref(), &entries)
    }

    fn persist<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) -> Result<(), ScheduleError> {
        if db::save(self.store.as_ref(), key, value) {
            Ok(())
        } else {
            Err(ScheduleError::Store {
                message: format!("failed to save {key}"),
            })
        }
    }
}
