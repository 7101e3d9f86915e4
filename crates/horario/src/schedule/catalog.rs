/// Course listing for the selector: search, "selected only" filter, ordering
use super::selection::Selection;
use super::types::{Course, CourseId, TimeSlot};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Filters applied to the catalogue.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub selected_only: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub id: CourseId,
    pub code: String,
    pub section: u32,
    pub course: String,
    pub teachers: Vec<String>,
    pub time_slots: Vec<TimeSlot>,
    pub is_manual: bool,
    pub was_updated: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
    /// Courses in the whole catalogue (before filtering)
    pub total: usize,
    /// Catalogue courses that are currently selected
    pub selected_count: usize,
}

/// Sort key that orders Spanish titles the way a reader expects: case and
/// accents are ignored, and `ñ` sorts between `n` and `o`.
fn collation_key(text: &str) -> String {
    let mut key = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        match c {
            'á' | 'à' | 'â' | 'ä' => key.push('a'),
            'é' | 'è' | 'ê' | 'ë' => key.push('e'),
            'í' | 'ì' | 'î' | 'ï' => key.push('i'),
            'ó' | 'ò' | 'ô' | 'ö' => key.push('o'),
            'ú' | 'ù' | 'û' | 'ü' => key.push('u'),
            'ñ' => {
                key.push('n');
                key.push(char::MAX);
            }
            other => key.push(other),
        }
    }
    key
}

fn matches_search(course: &Course, needle: &str) -> bool {
    course.course.to_lowercase().contains(needle)
        || course.code.to_lowercase().contains(needle)
        || course
            .teachers()
            .iter()
            .any(|teacher| teacher.to_lowercase().contains(needle))
        || course.section.to_string().contains(needle)
}

/// Builds the catalogue from the combined course list.
pub fn build_catalog(courses: &[Course], selection: &Selection, query: &CatalogQuery) -> Catalog {
    let mut seen = HashSet::new();
    let mut unique: Vec<&Course> = courses
        .iter()
        .filter(|course| {
            let id = course.id();
            !id.is_placeholder() && seen.insert(id)
        })
        .collect();

    unique.sort_by_cached_key(|course| {
        (
            collation_key(&course.course),
            course.course.clone(),
            course.code.clone(),
            course.section,
        )
    });

    let total = unique.len();
    let selected_count = unique
        .iter()
        .filter(|course| selection.contains(&course.id()))
        .count();

    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();

    let entries = unique
        .into_iter()
        .filter(|course| needle.is_empty() || matches_search(course, &needle))
        .map(|course| {
            let id = course.id();
            let selected = selection.contains(&id);
            CatalogEntry {
                id,
                code: course.code.clone(),
                section: course.section,
                course: course.course.clone(),
                teachers: course.teachers().into_iter().map(str::to_string).collect(),
                time_slots: course.time_slots.clone(),
                is_manual: course.is_manual,
                was_updated: course.was_updated,
                selected,
            }
        })
        .filter(|entry| !query.selected_only || entry.selected)
        .collect();

    Catalog {
        entries,
        total,
        selected_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(code: &str, section: u32, title: &str, teacher: &str) -> Course {
        Course {
            code: code.to_string(),
            section,
            course: title.to_string(),
            time_slots: vec![TimeSlot {
                day: 1,
                start: "08:30".to_string(),
                finish: "10:00".to_string(),
                place: "A1".to_string(),
                teacher: teacher.to_string(),
            }],
            is_manual: false,
            was_updated: false,
            last_seen: None,
        }
    }

    fn sample() -> Vec<Course> {
        vec![
            course("MAT100", 2, "Cálculo", "Soto"),
            course("CIT1337", 1, "Redes", "Pérez"),
            course("MAT100", 1, "Cálculo", "Rojas"),
            course("MAT100", 1, "Cálculo duplicado", "Rojas"),
        ]
    }

    #[test]
    fn test_sorted_by_title_code_section_without_duplicates() {
        let catalog = build_catalog(&sample(), &Selection::default(), &CatalogQuery::default());
        let ids: Vec<String> = catalog.entries.iter().map(|e| e.id.to_string()).collect();
        assert_eq!(ids, vec!["MAT100-1", "MAT100-2", "CIT1337-1"]);
        assert_eq!(catalog.total, 3);
    }

    #[test]
    fn test_titles_sort_ignoring_case_and_accents() {
        let courses = vec![
            course("ZOO1", 1, "Zoología", "Soto"),
            course("ALG1", 1, "Álgebra", "Soto"),
            course("ANO1", 1, "Año sabático", "Soto"),
            course("ANZ1", 1, "anzuelos", "Soto"),
            course("AOR1", 1, "Aorta", "Soto"),
            course("BIO1", 1, "biología", "Soto"),
        ];
        let catalog = build_catalog(&courses, &Selection::default(), &CatalogQuery::default());
        let titles: Vec<&str> = catalog.entries.iter().map(|e| e.course.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Álgebra", "anzuelos", "Año sabático", "Aorta", "biología", "Zoología"]
        );
    }

    #[test]
    fn test_search_matches_teacher_and_section() {
        let selection = Selection::default();
        let by_teacher = build_catalog(
            &sample(),
            &selection,
            &CatalogQuery {
                search: Some("pérez".to_string()),
                selected_only: false,
            },
        );
        assert_eq!(by_teacher.entries.len(), 1);
        assert_eq!(by_teacher.entries[0].code, "CIT1337");

        let by_section = build_catalog(
            &sample(),
            &selection,
            &CatalogQuery {
                search: Some("2".to_string()),
                selected_only: false,
            },
        );
        assert!(by_section.entries.iter().any(|e| e.id.as_str() == "MAT100-2"));
    }

    #[test]
    fn test_selected_only_filter() {
        let selection: Selection = vec![CourseId::new("CIT1337", 1), CourseId::new("GONE", 1)]
            .into_iter()
            .collect();
        let catalog = build_catalog(
            &sample(),
            &selection,
            &CatalogQuery {
                search: None,
                selected_only: true,
            },
        );
        assert_eq!(catalog.entries.len(), 1);
        assert!(catalog.entries[0].selected);
        assert_eq!(catalog.selected_count, 1);
    }
}
