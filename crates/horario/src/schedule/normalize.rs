//! Identity computation and normalisation of raw feed records.
//!
//! The feed has shipped two record shapes over time:
//! - legacy flat: `day/start/finish/place/teacher` directly on the course
//! - canonical: a `timeSlots` array, optionally with a course-level `teacher`
//!
//! Both are resolved here, once, into [`Course`]. Nothing downstream looks
//! at the raw shape again.

use super::error::ScheduleError;
use super::types::{Course, TimeSlot, INVALID_ID_PREFIX, UNDEFINED_LABEL};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

/// A course record exactly as the feed (or an old export) delivers it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCourse {
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub section: Option<Value>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub time_slots: Option<Vec<RawTimeSlot>>,
    #[serde(default)]
    pub day: Option<Value>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub finish: Option<String>,
    /// Outer `None`: key absent. `Some(None)`: key present but null.
    #[serde(default, deserialize_with = "present_field")]
    pub place: Option<Option<String>>,
    #[serde(default)]
    pub teacher: Option<String>,
    #[serde(default)]
    pub is_manual: bool,
    #[serde(default)]
    pub last_seen: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTimeSlot {
    pub day: Value,
    pub start: String,
    pub finish: String,
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub teacher: Option<String>,
}

/// Keeps a present-but-null field distinct from an absent one.
fn present_field<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Where a raw record keeps its time data.
enum RecordShape {
    Canonical(Vec<RawTimeSlot>),
    LegacyFlat(RawTimeSlot),
    Unscheduled,
}

impl RawCourse {
    fn into_shape(self) -> (RecordShape, Option<String>) {
        let teacher = self.teacher;
        let shape = match self.time_slots {
            Some(slots) => RecordShape::Canonical(slots),
            None => match (self.day, self.start, self.finish, self.place) {
                (Some(day), Some(start), Some(finish), Some(place)) => {
                    RecordShape::LegacyFlat(RawTimeSlot {
                        day,
                        start,
                        finish,
                        place,
                        teacher: teacher.clone(),
                    })
                }
                _ => RecordShape::Unscheduled,
            },
        };
        (shape, teacher)
    }
}

/// Builds the `invalid-xxxxxxx` marker handed to records without a usable identity.
pub fn placeholder_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();
    format!("{INVALID_ID_PREFIX}{suffix}")
}

fn invalid(reason: impl Into<String>) -> ScheduleError {
    ScheduleError::InvalidRecord {
        placeholder: placeholder_id(),
        reason: reason.into(),
    }
}

/// JavaScript-style falsiness of the `code` node: such records are dropped
/// without being reported.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

fn parse_day(value: &Value) -> Result<u8, ScheduleError> {
    value
        .as_u64()
        .filter(|d| *d <= 6)
        .map(|d| d as u8)
        .ok_or_else(|| invalid(format!("day {value} is not an integer between 0 and 6")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn resolve_slot(raw: RawTimeSlot, course_teacher: Option<&str>) -> Result<TimeSlot, ScheduleError> {
    let teacher = non_empty(raw.teacher)
        .or_else(|| course_teacher.map(str::to_string))
        .unwrap_or_else(|| UNDEFINED_LABEL.to_string());

    Ok(TimeSlot {
        day: parse_day(&raw.day)?,
        start: raw.start,
        finish: raw.finish,
        place: non_empty(raw.place).unwrap_or_else(|| UNDEFINED_LABEL.to_string()),
        teacher,
    })
}

/// Normalises one raw record into a canonical [`Course`].
///
/// Returns `Ok(None)` when the record has no `code` at all (dropped silently),
/// and `Err(ScheduleError::InvalidRecord)` when the code or section are malformed.
pub fn normalize(raw: RawCourse) -> Result<Option<Course>, ScheduleError> {
    let code = match &raw.code {
        None => return Ok(None),
        Some(value) if is_falsy(value) => return Ok(None),
        Some(Value::String(code)) => code.clone(),
        Some(other) => return Err(invalid(format!("code {other} is not a string"))),
    };

    let section = match &raw.section {
        None | Some(Value::Null) => 1,
        Some(value) => value
            .as_u64()
            .filter(|s| *s >= 1 && *s <= u64::from(u32::MAX))
            .map(|s| s as u32)
            .ok_or_else(|| invalid(format!("section {value} of {code} is not a positive integer")))?,
    };

    let title = raw.course.clone().unwrap_or_default();
    let is_manual = raw.is_manual;
    let last_seen = raw.last_seen;

    let (shape, course_teacher) = raw.into_shape();
    let course_teacher = non_empty(course_teacher);

    let time_slots = match shape {
        RecordShape::Canonical(slots) => slots
            .into_iter()
            .map(|slot| resolve_slot(slot, course_teacher.as_deref()))
            .collect::<Result<Vec<_>, _>>()?,
        RecordShape::LegacyFlat(slot) => vec![resolve_slot(slot, None)?],
        RecordShape::Unscheduled => {
            debug!(code = %code, section, "Record carries no schedule data");
            Vec::new()
        }
    };

    Ok(Some(Course {
        code,
        section,
        course: title,
        time_slots,
        is_manual,
        was_updated: false,
        last_seen,
    }))
}

/// Normalises a JSON node. Falsy nodes (null, false, "", 0) are dropped;
/// nodes that fail to deserialize are invalid records.
pub fn normalize_value(node: Value) -> Result<Option<Course>, ScheduleError> {
    if is_falsy(&node) {
        return Ok(None);
    }
    let raw: RawCourse = serde_json::from_value(node)
        .map_err(|e| invalid(format!("record does not match any known shape: {e}")))?;
    normalize(raw)
}

/// Result of normalising a whole batch of feed nodes.
#[derive(Debug, Default)]
pub struct Ingested {
    pub courses: Vec<Course>,
    pub invalid: Vec<ScheduleError>,
    pub dropped: usize,
}

/// Normalises every node of a feed page. One bad row never stops the rest.
pub fn ingest_nodes(nodes: Vec<Value>) -> Ingested {
    let mut ingested = Ingested::default();

    for node in nodes {
        match normalize_value(node) {
            Ok(Some(course)) => ingested.courses.push(course),
            Ok(None) => ingested.dropped += 1,
            Err(e) => {
                warn!(error = %e, "Skipping malformed course record");
                ingested.invalid.push(e);
            }
        }
    }

    ingested
}
