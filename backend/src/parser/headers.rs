//! Spreadsheet header vocabulary.
//!
//! Header names are exact and case-sensitive. Nested headers carry their
//! position in the name: `Section 2 Title`, `Lesson 2.1 Overview`,
//! `Content 2.1.3 Path`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

pub const COURSE_TITLE: &str = "Course Title";
pub const COURSE_SUBTITLE: &str = "Course Subtitle";
pub const COURSE_DESCRIPTION: &str = "Course Description";
pub const CATEGORY: &str = "Category";
pub const LANGUAGE: &str = "Language";
pub const LEVEL: &str = "Level";
pub const COUNTRY_CODES: &str = "Country Codes";
pub const REGION_CODES: &str = "Region Codes";
pub const CITY_CODES: &str = "City Codes";
pub const PROJECT_CODES: &str = "Project Codes";
pub const BOARD_CODES: &str = "Board Codes";
pub const SCHOOL_CODES: &str = "School Codes";
pub const CLASS_CODES: &str = "Class Codes";
pub const REQUIREMENTS: &str = "Requirements";
pub const LEARNING_OUTCOMES: &str = "Learning Outcomes";
pub const DURATION: &str = "Duration";

/// Headers that must appear in the header row.
pub const REQUIRED_HEADERS: [&str; 4] = [COURSE_TITLE, CATEGORY, LANGUAGE, LEVEL];

/// Flat course columns in template order.
pub const COURSE_HEADERS: [&str; 16] = [
    COURSE_TITLE,
    COURSE_SUBTITLE,
    COURSE_DESCRIPTION,
    CATEGORY,
    LANGUAGE,
    LEVEL,
    COUNTRY_CODES,
    REGION_CODES,
    CITY_CODES,
    PROJECT_CODES,
    BOARD_CODES,
    SCHOOL_CODES,
    CLASS_CODES,
    REQUIREMENTS,
    LEARNING_OUTCOMES,
    DURATION,
];

pub fn section_title(s: usize) -> String {
    format!("Section {s} Title")
}

pub fn section_overview(s: usize) -> String {
    format!("Section {s} Overview")
}

pub fn lesson_title(s: usize, l: usize) -> String {
    format!("Lesson {s}.{l} Title")
}

pub fn lesson_overview(s: usize, l: usize) -> String {
    format!("Lesson {s}.{l} Overview")
}

pub fn content_type(s: usize, l: usize, c: usize) -> String {
    format!("Content {s}.{l}.{c} Type")
}

pub fn content_title(s: usize, l: usize, c: usize) -> String {
    format!("Content {s}.{l}.{c} Title")
}

pub fn content_path(s: usize, l: usize, c: usize) -> String {
    format!("Content {s}.{l}.{c} Path")
}

pub fn content_due_date(s: usize, l: usize, c: usize) -> String {
    format!("Content {s}.{l}.{c} Due Date (YYYY-MM-DD)")
}

pub fn content_instructions(s: usize, l: usize, c: usize) -> String {
    format!("Content {s}.{l}.{c} Assignment Instructions")
}

/// Content item reference used for item-level errors ("Content 1.2.3").
pub fn content_label(s: usize, l: usize, c: usize) -> String {
    format!("Content {s}.{l}.{c}")
}

/// Full header row for a sheet with the given nesting shape.
pub fn header_template(sections: usize, lessons: usize, contents: usize) -> Vec<String> {
    let mut headers: Vec<String> = COURSE_HEADERS.iter().map(|h| h.to_string()).collect();

    for s in 1..=sections {
        headers.push(section_title(s));
        headers.push(section_overview(s));
        for l in 1..=lessons {
            headers.push(lesson_title(s, l));
            headers.push(lesson_overview(s, l));
            for c in 1..=contents {
                headers.push(content_type(s, l, c));
                headers.push(content_title(s, l, c));
                headers.push(content_path(s, l, c));
                headers.push(content_due_date(s, l, c));
                headers.push(content_instructions(s, l, c));
            }
        }
    }

    headers
}

// =============================================================================
// Header layout scan
// =============================================================================

static NESTED_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Section|Lesson|Content)\b").expect("valid regex"));

static SECTION_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Section (\d+) (Title|Overview)$").expect("valid regex"));

static LESSON_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Lesson (\d+)\.(\d+) (Title|Overview)$").expect("valid regex"));

static CONTENT_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^Content (\d+)\.(\d+)\.(\d+) (Type|Title|Path|Due Date \(YYYY-MM-DD\)|Assignment Instructions)$",
    )
    .expect("valid regex")
});

/// Position of a nested header: section, lesson, content (0 when absent).
type Position = (usize, usize, usize);

/// Problems with nested headers that decoding would silently ignore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderLayout {
    /// Nested headers whose index can never be reached by contiguous probing.
    pub unreachable: Vec<String>,
    /// Headers that start like a nested header but do not match the vocabulary.
    pub malformed: Vec<String>,
}

impl HeaderLayout {
    pub fn is_clean(&self) -> bool {
        self.unreachable.is_empty() && self.malformed.is_empty()
    }

    pub fn warnings(&self) -> Vec<String> {
        let unreachable = self
            .unreachable
            .iter()
            .map(|h| format!("Column \"{h}\" will be ignored: an earlier index is missing"));
        let malformed = self
            .malformed
            .iter()
            .map(|h| format!("Column \"{h}\" does not match the template naming"));
        unreachable.chain(malformed).collect()
    }
}

/// Scan a header row for nested columns that decoding cannot reach.
///
/// Probing walks each level from index 1 and stops at the first missing title
/// column (the type column for content items), so any nested header sitting
/// behind a gap is dead weight in the sheet.
pub fn scan_layout(headers: &[String]) -> HeaderLayout {
    let present: HashSet<&str> = headers.iter().map(String::as_str).collect();
    let mut layout = HeaderLayout::default();

    for header in headers {
        if !NESTED_PREFIX.is_match(header) {
            continue;
        }

        let position = match parse_position(header) {
            Some(p) => p,
            None => {
                layout.malformed.push(header.clone());
                continue;
            }
        };

        if !is_reachable(position, &present) {
            layout.unreachable.push(header.clone());
        }
    }

    layout
}

fn parse_position(header: &str) -> Option<Position> {
    let num = |caps: &regex::Captures, i: usize| caps[i].parse::<usize>().ok();

    if let Some(caps) = SECTION_HEADER.captures(header) {
        return Some((num(&caps, 1)?, 0, 0));
    }
    if let Some(caps) = LESSON_HEADER.captures(header) {
        return Some((num(&caps, 1)?, num(&caps, 2)?, 0));
    }
    if let Some(caps) = CONTENT_HEADER.captures(header) {
        return Some((num(&caps, 1)?, num(&caps, 2)?, num(&caps, 3)?));
    }
    None
}

fn is_reachable((s, l, c): Position, present: &HashSet<&str>) -> bool {
    if s == 0 || (1..=s).any(|i| !present.contains(section_title(i).as_str())) {
        return false;
    }
    if l > 0 && (1..=l).any(|j| !present.contains(lesson_title(s, j).as_str())) {
        return false;
    }
    if c > 0 {
        return (1..=c).all(|k| {
            present.contains(content_type(s, l, k).as_str())
                || present.contains(content_title(s, l, k).as_str())
        });
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_template_shape() {
        let headers = header_template(1, 1, 1);
        assert_eq!(headers.len(), 16 + 2 + 2 + 5);
        assert_eq!(headers[0], "Course Title");
        assert_eq!(headers[16], "Section 1 Title");
        assert_eq!(headers[18], "Lesson 1.1 Title");
        assert_eq!(headers[23], "Content 1.1.1 Due Date (YYYY-MM-DD)");
    }

    #[test]
    fn test_template_layout_is_clean() {
        let layout = scan_layout(&header_template(3, 2, 2));
        assert!(layout.is_clean(), "{:?}", layout);
    }

    #[test]
    fn test_gap_makes_later_sections_unreachable() {
        let headers = strings(&[
            "Course Title",
            "Section 1 Title",
            "Section 3 Title",
            "Section 3 Overview",
            "Lesson 3.1 Title",
        ]);
        let layout = scan_layout(&headers);
        assert_eq!(
            layout.unreachable,
            strings(&["Section 3 Title", "Section 3 Overview", "Lesson 3.1 Title"])
        );
        assert!(layout.malformed.is_empty());
    }

    #[test]
    fn test_content_reachable_through_title_only() {
        let headers = strings(&[
            "Section 1 Title",
            "Lesson 1.1 Title",
            "Content 1.1.1 Title",
            "Content 1.1.2 Type",
        ]);
        assert!(scan_layout(&headers).is_clean());
    }

    #[test]
    fn test_malformed_nested_header() {
        let headers = strings(&["Section 1 Title", "Lesson 1 Title", "Content 1.1.1 Notes"]);
        let layout = scan_layout(&headers);
        assert_eq!(layout.malformed, strings(&["Lesson 1 Title", "Content 1.1.1 Notes"]));
        assert_eq!(layout.warnings().len(), 2);
    }

    #[test]
    fn test_flat_headers_ignored() {
        let headers = strings(&["Course Title", "Sectional Notes", "Duration"]);
        assert!(scan_layout(&headers).is_clean());
    }
}
