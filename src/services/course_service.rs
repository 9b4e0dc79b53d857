//! Course service - courses, sections and per-kind problem counts

use super::{ServiceError, ServiceResult};
use crate::models::{BlockCategory, ResolveError, ResponseKind};
use crate::store::{descendants, ContentResolver};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// A course as listed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseSummary {
    pub id: String,
    pub name: String,
}

/// A section with the number of single-kind problems per supported kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub counts: BTreeMap<String, usize>,
}

/// The supported response kind tags
pub fn problem_types() -> Vec<&'static str> {
    ResponseKind::ALL.iter().map(|kind| kind.tag()).collect()
}

/// Courses running on `today`, sorted by name, optionally filtered by a title substring
pub fn list_courses<R>(resolver: &R, title: Option<&str>, today: NaiveDate) -> Vec<CourseSummary>
where
    R: ContentResolver + ?Sized,
{
    let mut courses: Vec<CourseSummary> = resolver
        .courses()
        .into_iter()
        .filter(|course| course.is_running(today))
        .filter(|course| title.map_or(true, |title| course.display_name.contains(title)))
        .map(|course| CourseSummary {
            id: course.key.clone(),
            name: course.display_name.clone(),
        })
        .collect();
    courses.sort_by(|a, b| a.name.cmp(&b.name));
    courses
}

/// Per-kind counts of the problems under a block
///
/// Only problems declaring exactly one kind are counted; composite
/// documents count toward no kind.
pub fn kind_counts<R>(resolver: &R, id: &str) -> Result<BTreeMap<String, usize>, ResolveError>
where
    R: ContentResolver + ?Sized,
{
    let blocks = descendants(resolver, id)?;
    let counts = ResponseKind::ALL
        .iter()
        .map(|kind| {
            let count = blocks
                .iter()
                .filter(|block| block.is_problem())
                .filter(|block| block.kinds().is_some_and(|kinds| kinds.is_exactly(kind.tag())))
                .count();
            (kind.tag().to_string(), count)
        })
        .collect();
    Ok(counts)
}

fn summarize<R>(resolver: &R, id: &str) -> Result<SectionSummary, ResolveError>
where
    R: ContentResolver + ?Sized,
{
    let block = resolver.block(id)?;
    Ok(SectionSummary {
        id: block.usage_id.clone(),
        name: block.display_name.clone(),
        counts: kind_counts(resolver, id)?,
    })
}

/// Sections of a course that contain at least one problem
pub fn list_sections<R>(resolver: &R, course_id: &str) -> ServiceResult<Vec<SectionSummary>>
where
    R: ContentResolver + ?Sized,
{
    let blocks = descendants(resolver, course_id)?;
    let mut sections = Vec::new();
    for block in blocks {
        if block.category != BlockCategory::Sequential || block.children.is_empty() {
            continue;
        }
        let has_problem = descendants(resolver, &block.usage_id)?
            .iter()
            .any(|b| b.is_problem());
        if has_problem {
            sections.push(summarize(resolver, &block.usage_id)?);
        }
    }

    tracing::debug!(course = %course_id, sections = sections.len(), "Listed sections");
    Ok(sections)
}

/// Per-kind counts for each of `section_ids`, in request order
pub fn section_counts<R>(resolver: &R, section_ids: &[String]) -> ServiceResult<Vec<SectionSummary>>
where
    R: ContentResolver + ?Sized,
{
    section_ids
        .iter()
        .map(|id| summarize(resolver, id).map_err(ServiceError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CourseFile;
    use crate::store::CourseStore;
    use std::path::Path;

    const COURSE: &str = r#"
course: "course-v1:Org+CS101+2024"
display_name: Programming
start: 2024-01-01
end: 2024-12-31
children:
  - id: ch1
    category: chapter
    display_name: Basics
    children:
      - id: seq1
        category: sequential
        display_name: Warmup
        children:
          - id: v1
            category: vertical
            children:
              - id: p1
                category: problem
                data: '<problem><stringresponse answer="a"/></problem>'
              - id: p2
                category: problem
                data: '<problem><stringresponse answer="b"/></problem>'
              - id: p3
                category: problem
                problem_types: [stringresponse, choiceresponse]
                data: '<problem><stringresponse answer="a"/><choiceresponse/></problem>'
      - id: seq2
        category: sequential
        display_name: Reading
        children:
          - id: h1
            category: html
      - id: seq3
        category: sequential
        display_name: Empty
"#;

    fn store() -> CourseStore {
        let mut store = CourseStore::default();
        let course: CourseFile = serde_yaml::from_str(COURSE).unwrap();
        store.add_course(course, Path::new(".")).unwrap();
        for (key, name, end) in [
            ("course-v1:Org+Art+2024", "Art", "2024-12-31"),
            ("course-v1:Org+Old+2020", "Archive", "2020-12-31"),
        ] {
            let yaml = format!(
                "course: \"{}\"\ndisplay_name: {}\nstart: 2020-01-01\nend: {}\n",
                key, name, end
            );
            let course: CourseFile = serde_yaml::from_str(&yaml).unwrap();
            store.add_course(course, Path::new(".")).unwrap();
        }
        store
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_problem_types() {
        assert_eq!(
            problem_types(),
            vec!["multiplechoiceresponse", "choiceresponse", "stringresponse"]
        );
    }

    #[test]
    fn test_list_courses_running_sorted() {
        let store = store();
        let courses = list_courses(&store, None, day("2024-06-01"));
        let names: Vec<&str> = courses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Art", "Programming"]);

        let filtered = list_courses(&store, Some("Prog"), day("2024-06-01"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "course-v1:Org+CS101+2024");

        assert!(list_courses(&store, None, day("2030-01-01")).is_empty());
    }

    #[test]
    fn test_list_sections_only_with_problems() {
        let store = store();
        let sections = list_sections(&store, "course-v1:Org+CS101+2024").unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "Warmup");
        assert_eq!(sections[0].counts["stringresponse"], 2);
        assert_eq!(sections[0].counts["choiceresponse"], 0);
        assert_eq!(sections[0].counts["multiplechoiceresponse"], 0);
    }

    #[test]
    fn test_section_summary_serializes_flat() {
        let store = store();
        let sections = section_counts(
            &store,
            &["block-v1:Org+CS101+2024+type@sequential+block@seq1".to_string()],
        )
        .unwrap();
        let json = serde_json::to_value(&sections[0]).unwrap();
        assert_eq!(json["name"], "Warmup");
        assert_eq!(json["stringresponse"], 2);
    }

    #[test]
    fn test_section_counts_invalid_id() {
        let store = store();
        let err = section_counts(&store, &["nope".to_string()]).unwrap_err();
        assert!(matches!(err, ServiceError::Resolve(ResolveError::InvalidId(_))));
    }
}
