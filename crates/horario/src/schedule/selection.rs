//! User selection and manually entered courses.

use super::dedup::deduplicate;
use super::error::ScheduleError;
use super::types::{clock_key, is_clock_time, Course, CourseId, TimeSlot, UNDEFINED_LABEL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The set of course identities the user has chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(BTreeSet<CourseId>);

impl Selection {
    pub fn contains(&self, id: &CourseId) -> bool {
        self.0.contains(id)
    }

    /// Adds or removes `id`. Returns true if the set changed.
    pub fn toggle(&mut self, id: CourseId, selected: bool) -> bool {
        if selected {
            self.0.insert(id)
        } else {
            self.0.remove(&id)
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CourseId> {
        self.0.iter()
    }
}

impl FromIterator<CourseId> for Selection {
    fn from_iter<I: IntoIterator<Item = CourseId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A course as typed in by the user: one time range repeated on several days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualCourseRequest {
    pub code: String,
    #[serde(default)]
    pub section: Option<u32>,
    pub course: String,
    #[serde(default)]
    pub place: Option<String>,
    pub start: String,
    pub finish: String,
    pub days: Vec<u8>,
    #[serde(default)]
    pub teacher: Option<String>,
}

fn invalid_course(message: impl Into<String>) -> ScheduleError {
    ScheduleError::InvalidCourse {
        message: message.into(),
    }
}

impl ManualCourseRequest {
    /// Validates the request and builds a canonical course with one slot per day.
    pub fn into_course(self) -> Result<Course, ScheduleError> {
        let code = self.code.trim().to_string();
        let title = self.course.trim().to_string();
        if code.is_empty() {
            return Err(invalid_course("course code is required"));
        }
        if title.is_empty() {
            return Err(invalid_course("course name is required"));
        }
        if self.days.is_empty() {
            return Err(invalid_course("select at least one day"));
        }
        if let Some(day) = self.days.iter().find(|d| **d > 6) {
            return Err(invalid_course(format!("day {day} is out of range")));
        }
        if !is_clock_time(&self.start) || !is_clock_time(&self.finish) {
            return Err(invalid_course("start and finish must be H:MM times"));
        }
        if clock_key(&self.start) >= clock_key(&self.finish) {
            return Err(invalid_course("start must be earlier than finish"));
        }
        let section = match self.section {
            Some(0) => return Err(invalid_course("section must be at least 1")),
            Some(section) => section,
            None => 1,
        };

        let label = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| UNDEFINED_LABEL.to_string())
        };
        let place = label(self.place);
        let teacher = label(self.teacher);

        let mut days = self.days;
        days.sort_unstable();
        days.dedup();

        let mut course = Course {
            code,
            section,
            course: title,
            time_slots: days
                .into_iter()
                .map(|day| TimeSlot {
                    day,
                    start: self.start.trim().to_string(),
                    finish: self.finish.trim().to_string(),
                    place: place.clone(),
                    teacher: teacher.clone(),
                })
                .collect(),
            is_manual: true,
            was_updated: false,
            last_seen: None,
        };
        course.sort_slots();
        Ok(course)
    }
}

/// Appends a manual course and selects it. Returns its identity.
pub fn add_manual_course(
    manual: &mut Vec<Course>,
    selection: &mut Selection,
    mut course: Course,
) -> CourseId {
    course.is_manual = true;
    let id = course.id();
    manual.push(course);
    selection.toggle(id.clone(), true);
    id
}

/// Removes every manual record with identity `id`. Returns how many were removed.
pub fn remove_manual_course(manual: &mut Vec<Course>, id: &CourseId) -> usize {
    let before = manual.len();
    manual.retain(|course| &course.id() != id);
    before - manual.len()
}

/// Combines the reconciled feed output with the manual courses, merging any
/// manual course that shares an identity with a fetched one.
pub fn combine_with_manual(fetched: &[Course], manual: &[Course]) -> Vec<Course> {
    deduplicate(fetched.iter().chain(manual.iter()).cloned())
}
