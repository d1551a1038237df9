//! Field and reference validation for decoded courses.
//!
//! Every rule is a plain function from a record (and the catalogs) to a list
//! of [`ValidationError`]s. Rules never stop early: a record with five
//! problems yields five errors, so a user can fix the sheet in one pass.
//!
//! # Rules
//!
//! | Field | Rule |
//! |-------|------|
//! | Course Title | at most 100 chars |
//! | Course Subtitle | at most 150 chars |
//! | Course Description | at least 20 chars if present |
//! | Category / Language / Level | matches a catalog name (case-insensitive) |
//! | `* Codes` | each code matches a catalog code (case-insensitive) |
//! | Duration | 3-50 chars if present |
//! | Section / Lesson title | 3-100 chars |
//! | Section / Lesson overview | 5-500 chars if present |
//! | Content type | video, attachment, assignment or quiz |
//! | Content title | 3-100 chars |
//! | Content path | required for video and attachment |
//! | Assignment | path or instructions; instructions at least 10 chars |

use std::collections::HashMap;

use crate::models::{
    CatalogKind, ContentItemRecord, ContentKind, CourseRecord, LessonRecord, ReferenceCatalogs,
    SectionRecord, ValidationError,
};
use crate::parser::headers;

const TITLE_MAX: usize = 100;
const SUBTITLE_MAX: usize = 150;
const DESCRIPTION_MIN: usize = 20;
const DURATION_RANGE: (usize, usize) = (3, 50);
const NESTED_TITLE_RANGE: (usize, usize) = (3, 100);
const OVERVIEW_RANGE: (usize, usize) = (5, 500);
const INSTRUCTIONS_MIN: usize = 10;

/// Validate a whole batch: every record, then the duplicate-title check.
pub fn validate_batch(courses: &[CourseRecord], catalogs: &ReferenceCatalogs) -> Vec<ValidationError> {
    let mut errors: Vec<ValidationError> = courses
        .iter()
        .flat_map(|course| validate_course(course, course.source_row, catalogs))
        .collect();
    errors.extend(check_duplicate_titles(courses));
    errors
}

/// Validate one record. Errors come back in field order.
pub fn validate_course(
    course: &CourseRecord,
    row: usize,
    catalogs: &ReferenceCatalogs,
) -> Vec<ValidationError> {
    let mut errors = check_course_fields(course, row);
    errors.extend(check_named_references(course, row, catalogs));
    errors.extend(check_codes(course, row, catalogs));
    errors.extend(check_duration(course, row));
    errors.extend(check_sections(&course.sections, row));
    errors
}

/// Character length, not byte length.
fn len(value: &str) -> usize {
    value.trim().chars().count()
}

fn within(value: &str, (min, max): (usize, usize)) -> bool {
    (min..=max).contains(&len(value))
}

/// Title, subtitle and description length rules.
pub fn check_course_fields(course: &CourseRecord, row: usize) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if len(&course.course_title) > TITLE_MAX {
        errors.push(ValidationError::new(
            row,
            headers::COURSE_TITLE,
            "Title must be 100 characters or less",
        ));
    }

    if len(&course.course_subtitle) > SUBTITLE_MAX {
        errors.push(ValidationError::new(
            row,
            headers::COURSE_SUBTITLE,
            "Subtitle must be 150 characters or less",
        ));
    }

    let description = len(&course.course_description);
    if description > 0 && description < DESCRIPTION_MIN {
        errors.push(ValidationError::new(
            row,
            headers::COURSE_DESCRIPTION,
            "Description must be at least 20 characters if provided",
        ));
    }

    errors
}

/// Category, language and level must name an existing catalog entry.
pub fn check_named_references(
    course: &CourseRecord,
    row: usize,
    catalogs: &ReferenceCatalogs,
) -> Vec<ValidationError> {
    [CatalogKind::Categories, CatalogKind::Languages, CatalogKind::Levels]
        .into_iter()
        .filter_map(|kind| {
            let value = course.named_reference(kind)?.trim();
            if value.is_empty() || catalogs.find_by_name(kind, value).is_some() {
                return None;
            }
            let noun = kind.noun();
            Some(ValidationError::new(
                row,
                kind.header(),
                format!(
                    "{} \"{}\" does not exist, please create the {}",
                    capitalize(noun),
                    value,
                    noun
                ),
            ))
        })
        .collect()
}

/// Every listed code must exist in its catalog.
pub fn check_codes(
    course: &CourseRecord,
    row: usize,
    catalogs: &ReferenceCatalogs,
) -> Vec<ValidationError> {
    CatalogKind::ALL
        .into_iter()
        .filter(CatalogKind::is_coded)
        .flat_map(|kind| {
            course
                .codes(kind)
                .iter()
                .filter(move |code| catalogs.find_by_code(kind, code).is_none())
                .map(move |code| {
                    let noun = kind.noun();
                    ValidationError::new(
                        row,
                        kind.header(),
                        format!(
                            "{} code \"{}\" does not exist, please create the {}",
                            capitalize(noun),
                            code,
                            noun
                        ),
                    )
                })
        })
        .collect()
}

pub fn check_duration(course: &CourseRecord, row: usize) -> Vec<ValidationError> {
    if len(&course.duration) == 0 || within(&course.duration, DURATION_RANGE) {
        return Vec::new();
    }
    vec![ValidationError::new(
        row,
        headers::DURATION,
        "Duration must be 3-50 characters if provided",
    )]
}

/// Nested structure rules. An empty section list is a valid draft.
pub fn check_sections(sections: &[SectionRecord], row: usize) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (i, section) in sections.iter().enumerate() {
        let s = i + 1;

        if !within(&section.title, NESTED_TITLE_RANGE) {
            errors.push(ValidationError::new(
                row,
                headers::section_title(s),
                "Section title must be 3-100 characters",
            ));
        }

        if len(&section.overview) > 0 && !within(&section.overview, OVERVIEW_RANGE) {
            errors.push(ValidationError::new(
                row,
                headers::section_overview(s),
                "Section overview must be 5-500 characters if provided",
            ));
        }

        for (j, lesson) in section.lessons.iter().enumerate() {
            errors.extend(check_lesson(lesson, row, s, j + 1));
        }
    }

    errors
}

fn check_lesson(lesson: &LessonRecord, row: usize, s: usize, l: usize) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !within(&lesson.title, NESTED_TITLE_RANGE) {
        errors.push(ValidationError::new(
            row,
            headers::lesson_title(s, l),
            "Lesson title must be 3-100 characters",
        ));
    }

    if len(&lesson.overview) > 0 && !within(&lesson.overview, OVERVIEW_RANGE) {
        errors.push(ValidationError::new(
            row,
            headers::lesson_overview(s, l),
            "Lesson overview must be 5-500 characters if provided",
        ));
    }

    for (k, item) in lesson.content_items.iter().enumerate() {
        errors.extend(check_content_item(item, row, (s, l, k + 1)));
    }

    errors
}

/// Content item rules. Due dates are not checked here; drafts may leave them
/// unset until publishing.
pub fn check_content_item(
    item: &ContentItemRecord,
    row: usize,
    (s, l, c): (usize, usize, usize),
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let kind = item.content_type.kind();

    if kind.is_none() {
        errors.push(ValidationError::new(
            row,
            headers::content_type(s, l, c),
            "Content type must be one of: video, attachment, assignment, quiz",
        ));
    }

    if !within(&item.title, NESTED_TITLE_RANGE) {
        errors.push(ValidationError::new(
            row,
            headers::content_title(s, l, c),
            "Content title must be 3-100 characters",
        ));
    }

    if kind.is_some_and(|k| k.requires_path()) && !item.has_path() {
        errors.push(ValidationError::new(
            row,
            headers::content_path(s, l, c),
            "Path is required for video and attachment content types",
        ));
    }

    if kind == Some(ContentKind::Assignment) {
        if !item.has_path() && !item.has_instructions() {
            errors.push(ValidationError::new(
                row,
                headers::content_label(s, l, c),
                "Assignment must have either a content path (attachment) or assignment instructions",
            ));
        }

        let instructions = item.assignment_instructions.as_deref().map(len).unwrap_or(0);
        if instructions > 0 && instructions < INSTRUCTIONS_MIN {
            errors.push(ValidationError::new(
                row,
                headers::content_instructions(s, l, c),
                "Assignment instructions must be at least 10 characters if provided",
            ));
        }
    }

    errors
}

/// Flag every occurrence of a course title used more than once in the batch.
pub fn check_duplicate_titles(courses: &[CourseRecord]) -> Vec<ValidationError> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for course in courses {
        let title = title_key(course);
        if !title.is_empty() {
            *counts.entry(title).or_default() += 1;
        }
    }

    courses
        .iter()
        .filter(|course| counts.get(&title_key(course)).is_some_and(|&n| n > 1))
        .map(|course| {
            ValidationError::new(course.source_row, headers::COURSE_TITLE, "Duplicate course title")
        })
        .collect()
}

fn title_key(course: &CourseRecord) -> String {
    course.course_title.trim().to_lowercase()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
