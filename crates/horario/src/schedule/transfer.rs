//! Export/import of the user's selection and manual courses as a
//! copy-paste code (base64 of a JSON envelope).

use super::error::ScheduleError;
use super::normalize::normalize_value;
use super::selection::Selection;
use super::types::{Course, CourseId};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Version written into every export.
pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub selected_course_ids: Vec<CourseId>,
    pub manual_courses: Vec<Course>,
    pub version: u32,
    pub export_date: String,
}

/// State recovered from an import code, ready to replace the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedState {
    pub selection: Selection,
    pub manual_courses: Vec<Course>,
}

fn invalid_import(message: impl Into<String>) -> ScheduleError {
    ScheduleError::InvalidImport {
        message: message.into(),
    }
}

/// Builds the export code for the given state.
pub fn encode_export(
    selection: &Selection,
    manual_courses: &[Course],
    exported_at: DateTime<Utc>,
) -> Result<String, ScheduleError> {
    let envelope = ExportEnvelope {
        selected_course_ids: selection.iter().cloned().collect(),
        manual_courses: manual_courses.to_vec(),
        version: EXPORT_VERSION,
        export_date: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    let json = serde_json::to_string(&envelope).map_err(|e| ScheduleError::InvalidCourse {
        message: format!("failed to encode export: {e}"),
    })?;
    Ok(STANDARD.encode(json))
}

/// Decodes and validates an import code.
///
/// Both `selectedCourseIds` and `manualCourses` must be present arrays. Manual
/// courses go through normalisation, so codes exported with the legacy flat
/// shape are accepted; any unusable entry rejects the whole import.
pub fn decode_import(code: &str) -> Result<ImportedState, ScheduleError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(invalid_import("import code is empty"));
    }

    let bytes = STANDARD
        .decode(code)
        .map_err(|e| invalid_import(format!("not a valid base64 code: {e}")))?;
    let json = String::from_utf8(bytes).map_err(|_| invalid_import("code is not UTF-8 text"))?;
    let payload: Value =
        serde_json::from_str(&json).map_err(|e| invalid_import(format!("not valid JSON: {e}")))?;

    let ids = payload
        .get("selectedCourseIds")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid_import("selectedCourseIds is missing or not an array"))?;
    let manual = payload
        .get("manualCourses")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid_import("manualCourses is missing or not an array"))?;

    let selection = ids
        .iter()
        .map(|id| {
            id.as_str()
                .map(CourseId::from_raw)
                .ok_or_else(|| invalid_import(format!("course id {id} is not a string")))
        })
        .collect::<Result<Selection, _>>()?;

    let manual_courses = manual
        .iter()
        .map(|node| match normalize_value(node.clone()) {
            Ok(Some(mut course)) => {
                course.is_manual = true;
                Ok(course)
            }
            Ok(None) => Err(invalid_import("a manual course has no code")),
            Err(e) => Err(invalid_import(format!("a manual course is malformed: {e}"))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ImportedState {
        selection,
        manual_courses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::selection::ManualCourseRequest;
    use serde_json::json;

    fn manual_course() -> Course {
        ManualCourseRequest {
            code: "ELE300".to_string(),
            section: Some(2),
            course: "Electivo".to_string(),
            place: Some("Sala 4".to_string()),
            start: "14:30".to_string(),
            finish: "16:00".to_string(),
            days: vec![2, 4],
            teacher: Some("Vera".to_string()),
        }
        .into_course()
        .unwrap()
    }

    fn encode_value(value: Value) -> String {
        STANDARD.encode(value.to_string())
    }

    #[test]
    fn test_export_then_import_restores_state() {
        let selection: Selection = vec![CourseId::new("ELE300", 2), CourseId::new("MAT100", 1)]
            .into_iter()
            .collect();
        let manual = vec![manual_course()];

        let code = encode_export(&selection, &manual, Utc::now()).unwrap();
        let imported = decode_import(&format!("  {code}\n")).unwrap();

        assert_eq!(imported.selection, selection);
        assert_eq!(imported.manual_courses, manual);
    }

    #[test]
    fn test_export_envelope_fields() {
        let code = encode_export(&Selection::default(), &[], Utc::now()).unwrap();
        let json: Value = serde_json::from_slice(&STANDARD.decode(code).unwrap()).unwrap();

        assert_eq!(json["version"], EXPORT_VERSION);
        assert!(json["exportDate"].as_str().unwrap().ends_with('Z'));
        assert!(json["selectedCourseIds"].is_array());
        assert!(json["manualCourses"].is_array());
    }

    #[test]
    fn test_import_accepts_legacy_manual_courses() {
        let code = encode_value(json!({
            "selectedCourseIds": ["ELE300-1"],
            "manualCourses": [{
                "code": "ELE300", "section": 1, "course": "Electivo",
                "day": 3, "days": [3], "start": "14:30", "finish": "16:00",
                "place": "Sala 4", "teacher": "Vera", "isManual": true
            }],
            "version": 1,
            "exportDate": "2025-03-01T12:00:00.000Z"
        }));

        let imported = decode_import(&code).unwrap();
        assert_eq!(imported.manual_courses.len(), 1);
        assert_eq!(imported.manual_courses[0].time_slots[0].day, 3);
        assert!(imported.manual_courses[0].is_manual);
    }

    #[test]
    fn test_import_rejects_invalid_payloads() {
        assert!(decode_import("").is_err());
        assert!(decode_import("***").is_err());
        assert!(decode_import(&STANDARD.encode("not json")).is_err());
        assert!(decode_import(&encode_value(json!({ "manualCourses": [] }))).is_err());
        assert!(decode_import(&encode_value(json!({
            "selectedCourseIds": "A-1", "manualCourses": []
        })))
        .is_err());
        assert!(decode_import(&encode_value(json!({
            "selectedCourseIds": [], "manualCourses": [{ "code": 7 }]
        })))
        .is_err());
        assert!(decode_import(&encode_value(json!({
            "selectedCourseIds": [1], "manualCourses": []
        })))
        .is_err());
    }
}
