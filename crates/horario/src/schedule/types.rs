/// Types for course schedule data
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Label used whenever the feed leaves a place or teacher blank.
pub const UNDEFINED_LABEL: &str = "No definido";

/// Prefix of the placeholder identity handed to malformed records.
pub const INVALID_ID_PREFIX: &str = "invalid-";

static CLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,2}):([0-9]{2})(?::([0-9]{2}))?$").unwrap());

fn undefined_label() -> String {
    UNDEFINED_LABEL.to_string()
}

fn default_section() -> u32 {
    1
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Identity of a course offering: `code-section` (e.g. `CIT1337-1`).
///
/// This is the only key used for selection, the persisted cache and
/// cross-run matching.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(String);

impl CourseId {
    pub fn new(code: &str, section: u32) -> Self {
        Self(format!("{code}-{section}"))
    }

    /// Wraps an identity received from outside (URL path, import payload).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns true for the `invalid-...` identities given to malformed records.
    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(INVALID_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One concrete meeting occurrence of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// 0 = Sunday ... 6 = Saturday
    pub day: u8,
    pub start: String,
    pub finish: String,
    #[serde(default = "undefined_label")]
    pub place: String,
    #[serde(default = "undefined_label")]
    pub teacher: String,
}

impl TimeSlot {
    /// The dedup key of a slot. Teacher is deliberately not part of it.
    pub fn key(&self) -> SlotKey {
        SlotKey {
            day: self.day,
            start: clock_key(&self.start),
            finish: clock_key(&self.finish),
            place: self.place.clone(),
        }
    }
}

/// `(day, start, finish, place)` with times normalised through [`clock_key`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    pub day: u8,
    pub start: String,
    pub finish: String,
    pub place: String,
}

/// One offering of a subject, one section, in canonical multi-slot shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub code: String,
    #[serde(default = "default_section")]
    pub section: u32,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_manual: bool,
    /// Set only on the cycle in which a cached course's slots changed.
    #[serde(default, skip_serializing_if = "is_false")]
    pub was_updated: bool,
    /// Feed-fetch epoch (milliseconds) of the last cycle that contained this course.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,
}

impl Course {
    pub fn id(&self) -> CourseId {
        CourseId::new(&self.code, self.section)
    }

    /// Sorts slots ascending by day, then by start time.
    pub fn sort_slots(&mut self) {
        self.time_slots
            .sort_by(|a, b| (a.day, clock_key(&a.start)).cmp(&(b.day, clock_key(&b.start))));
    }

    /// Distinct teachers across all slots, in slot order.
    pub fn teachers(&self) -> Vec<&str> {
        let mut teachers: Vec<&str> = Vec::new();
        for slot in &self.time_slots {
            if !slot.teacher.is_empty() && !teachers.contains(&slot.teacher.as_str()) {
                teachers.push(&slot.teacher);
            }
        }
        teachers
    }
}

/// Wrapper matching the feed's `{ node: ... }` edge shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseEdge {
    pub node: Course,
}

impl From<Course> for CourseEdge {
    fn from(node: Course) -> Self {
        Self { node }
    }
}

/// The persisted snapshot: one fully merged course per identity.
pub type CourseCache = BTreeMap<CourseId, Course>;

/// Normalises a wall-clock string so that `8:30`, `08:30` and `08:30:00`
/// compare equal and order correctly.
///
/// Unparseable values fall back to their trimmed text.
pub fn clock_key(raw: &str) -> String {
    let trimmed = raw.trim();
    match CLOCK_REGEX.captures(trimmed) {
        Some(caps) => {
            let hours: u32 = caps[1].parse().unwrap_or(0);
            let seconds = caps.get(3).map(|m| m.as_str()).unwrap_or("00");
            format!("{:02}:{}:{}", hours, &caps[2], seconds)
        }
        None => trimmed.to_string(),
    }
}

/// Returns true if the string is a `H:MM[:SS]` wall-clock time.
pub fn is_clock_time(raw: &str) -> bool {
    match CLOCK_REGEX.captures(raw.trim()) {
        Some(caps) => {
            let hours: u32 = caps[1].parse().unwrap_or(99);
            let minutes: u32 = caps[2].parse().unwrap_or(99);
            let seconds: u32 = caps.get(3).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
            hours < 24 && minutes < 60 && seconds < 60
        }
        None => false,
    }
}
