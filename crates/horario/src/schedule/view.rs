/// Day and week projections of the selected courses
use super::selection::Selection;
use super::types::{clock_key, is_clock_time, Course, CourseId};
use chrono::{Datelike, Local};
use serde::Serialize;
use std::collections::HashSet;

const DAY_NAMES: [&str; 7] = [
    "Domingo",
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
];

/// One class meeting, flattened for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledClass {
    pub id: CourseId,
    pub code: String,
    pub section: u32,
    pub course: String,
    pub day: u8,
    pub start: String,
    pub finish: String,
    pub place: String,
    pub teacher: String,
    pub is_manual: bool,
    pub was_updated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySchedule {
    pub day: u8,
    pub name: &'static str,
    pub classes: Vec<ScheduledClass>,
}

/// Today's weekday, 0 = Sunday.
pub fn current_weekday() -> u8 {
    Local::now().weekday().num_days_from_sunday() as u8
}

/// Spanish name of a weekday number.
pub fn day_name(day: u8) -> &'static str {
    DAY_NAMES.get(usize::from(day)).copied().unwrap_or("")
}

/// Shortens `H:MM[:SS]` to `HH:MM`. Anything else is returned trimmed.
pub fn format_time(raw: &str) -> String {
    let key = clock_key(raw);
    if !is_clock_time(raw) {
        return key;
    }
    key.get(..5).map(str::to_string).unwrap_or(key)
}

/// Every selected course's meetings on `day`, sorted by start time.
pub fn classes_for_day(courses: &[Course], selection: &Selection, day: u8) -> Vec<ScheduledClass> {
    let mut seen = HashSet::new();
    let mut classes: Vec<ScheduledClass> = courses
        .iter()
        .filter(|course| selection.contains(&course.id()))
        .flat_map(|course| {
            course
                .time_slots
                .iter()
                .filter(move |slot| slot.day == day)
                .map(move |slot| ScheduledClass {
                    id: course.id(),
                    code: course.code.clone(),
                    section: course.section,
                    course: course.course.clone(),
                    day: slot.day,
                    start: format_time(&slot.start),
                    finish: format_time(&slot.finish),
                    place: slot.place.clone(),
                    teacher: slot.teacher.clone(),
                    is_manual: course.is_manual,
                    was_updated: course.was_updated,
                })
        })
        .filter(|class| {
            seen.insert((
                class.id.clone(),
                class.start.clone(),
                class.finish.clone(),
                class.place.clone(),
            ))
        })
        .collect();

    classes.sort_by(|a, b| a.start.cmp(&b.start));
    classes
}

/// The selected courses grouped by each of `days`.
pub fn week_view(courses: &[Course], selection: &Selection, days: &[u8]) -> Vec<DaySchedule> {
    days.iter()
        .map(|&day| DaySchedule {
            day,
            name: day_name(day),
            classes: classes_for_day(courses, selection, day),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::types::TimeSlot;

    fn slot(day: u8, start: &str, place: &str) -> TimeSlot {
        TimeSlot {
            day,
            start: start.to_string(),
            finish: "23:00:00".to_string(),
            place: place.to_string(),
            teacher: "Soto".to_string(),
        }
    }

    fn course(code: &str, slots: Vec<TimeSlot>) -> Course {
        Course {
            code: code.to_string(),
            section: 1,
            course: format!("Curso {code}"),
            time_slots: slots,
            is_manual: false,
            was_updated: false,
            last_seen: None,
        }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time("8:30:00"), "08:30");
        assert_eq!(format_time("10:00"), "10:00");
        assert_eq!(format_time("TBA"), "TBA");
    }

    #[test]
    fn test_format_time_keeps_non_clock_text() {
        assert_eq!(format_time("12:3é"), "12:3é");
        assert_eq!(format_time(" 9:4ñ0 "), "9:4ñ0");
    }

    #[test]
    fn test_day_view_survives_garbled_times() {
        let courses = vec![course("A", vec![slot(1, "12:3é", "X")])];
        let selection: Selection = vec![CourseId::new("A", 1)].into_iter().collect();

        let monday = classes_for_day(&courses, &selection, 1);
        assert_eq!(monday.len(), 1);
        assert_eq!(monday[0].start, "12:3é");
        assert_eq!(monday[0].finish, "23:00");
    }

    #[test]
    fn test_day_names() {
        assert_eq!(day_name(0), "Domingo");
        assert_eq!(day_name(3), "Miércoles");
        assert_eq!(day_name(9), "");
    }

    #[test]
    fn test_classes_for_day_only_selected_and_sorted() {
        let courses = vec![
            course("B", vec![slot(1, "10:00", "X"), slot(3, "08:00", "X")]),
            course("A", vec![slot(1, "8:30", "Y")]),
            course("C", vec![slot(1, "07:00", "Z")]),
        ];
        let selection: Selection = vec![CourseId::new("A", 1), CourseId::new("B", 1)]
            .into_iter()
            .collect();

        let monday = classes_for_day(&courses, &selection, 1);
        let codes: Vec<&str> = monday.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B"]);
        assert_eq!(monday[0].start, "08:30");
    }

    #[test]
    fn test_week_view_covers_requested_days() {
        let courses = vec![course("A", vec![slot(1, "08:00", "X"), slot(5, "08:00", "X")])];
        let selection: Selection = vec![CourseId::new("A", 1)].into_iter().collect();

        let week = week_view(&courses, &selection, &[1, 2, 3, 4, 5]);
        assert_eq!(week.len(), 5);
        assert_eq!(week[0].name, "Lunes");
        assert_eq!(week[0].classes.len(), 1);
        assert!(week[1].classes.is_empty());
        assert_eq!(week[4].classes.len(), 1);
    }

    #[test]
    fn test_same_meeting_listed_once_per_day() {
        let courses = vec![
            course("A", vec![slot(2, "08:00", "X")]),
            course("A", vec![slot(2, "08:00:00", "X")]),
        ];
        let selection: Selection = vec![CourseId::new("A", 1)].into_iter().collect();
        assert_eq!(classes_for_day(&courses, &selection, 2).len(), 1);
    }
}
