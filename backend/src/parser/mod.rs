//! XLSX workbook decoder for bulk course uploads.
//!
//! Reads the first worksheet, treats row 1 as headers and turns every other
//! non-blank row into a [`CourseRecord`]. Nested sections, lessons and content
//! items are discovered by probing numbered header names until the first gap.
//!
//! ```text
//!  Course Title | Category | ... | Section 1 Title | Lesson 1.1 Title | Content 1.1.1 Type | ...
//!  ─────────────┼──────────┼─────┼─────────────────┼──────────────────┼────────────────────┼────
//!  Algebra I    | Maths    | ... | Foundations     | Variables        | video              | ...
//! ```

pub mod cell;
pub mod headers;

#[cfg(test)]
pub(crate) mod fixture;

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use std::collections::HashMap;
use std::io::Cursor;

use crate::error::{DecodeError, DecodeResult};
use crate::models::{
    ContentItemRecord, ContentType, CourseRecord, LessonRecord, SectionRecord,
};

pub use cell::{cell_text, CellValue};
pub use headers::{header_template, scan_layout, HeaderLayout, REQUIRED_HEADERS};

/// Result of decoding a workbook, with metadata for logging.
#[derive(Debug, Clone)]
pub struct DecodedWorkbook {
    /// Name of the worksheet that was read.
    pub sheet_name: String,
    /// Header row, trimmed, in column order.
    pub headers: Vec<String>,
    /// Decoded courses in sheet order.
    pub courses: Vec<CourseRecord>,
    /// Worksheet rows skipped as blank.
    pub skipped_rows: Vec<usize>,
    /// Nested-header problems found in the header row.
    pub layout: HeaderLayout,
}

/// Decode raw `.xlsx` bytes into course records.
pub fn decode_courses(bytes: &[u8]) -> DecodeResult<Vec<CourseRecord>> {
    decode_workbook(bytes).map(|decoded| decoded.courses)
}

/// Decode raw `.xlsx` bytes, keeping sheet metadata.
///
/// Only the first worksheet is read. The first row must contain every header
/// in [`REQUIRED_HEADERS`].
pub fn decode_workbook(bytes: &[u8]) -> DecodeResult<DecodedWorkbook> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(DecodeError::NoWorksheet)?;
    let range = workbook.worksheet_range(&sheet_name)?;

    decode_range(&range, sheet_name)
}

/// Decode an already-loaded worksheet range.
pub fn decode_range(range: &Range<Data>, sheet_name: String) -> DecodeResult<DecodedWorkbook> {
    if range.height() < 2 {
        return Err(DecodeError::InsufficientData);
    }

    // Absolute (0-based) sheet row of the header row
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut rows = range.rows();

    let headers: Vec<String> = rows
        .next()
        .ok_or(DecodeError::InsufficientData)?
        .iter()
        .map(cell_text)
        .collect();

    if let Some(missing) = REQUIRED_HEADERS
        .iter()
        .find(|required| !headers.iter().any(|h| h == *required))
    {
        return Err(DecodeError::MissingHeader(missing.to_string()));
    }

    let columns = column_index(&headers);
    let mut courses = Vec::new();
    let mut skipped_rows = Vec::new();

    for (offset, row) in rows.enumerate() {
        // +1 for the header row, +1 for 1-based numbering
        let sheet_row = first_row + offset + 2;
        let values = RowValues::new(&columns, row);

        if values.is_blank() || REQUIRED_HEADERS.iter().all(|h| values.text(h).is_empty()) {
            skipped_rows.push(sheet_row);
            continue;
        }

        courses.push(decode_course(&values, sheet_row));
    }

    Ok(DecodedWorkbook {
        layout: scan_layout(&headers),
        sheet_name,
        headers,
        courses,
        skipped_rows,
    })
}

/// Header name to column index. A repeated header maps to its last column.
fn column_index(headers: &[String]) -> HashMap<&str, usize> {
    headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.is_empty())
        .map(|(i, h)| (h.as_str(), i))
        .collect()
}

/// One data row viewed through the header map, with cells already normalized.
struct RowValues<'h> {
    values: HashMap<&'h str, String>,
}

impl<'h> RowValues<'h> {
    fn new(columns: &HashMap<&'h str, usize>, row: &[Data]) -> Self {
        let values = columns
            .iter()
            .filter_map(|(header, &idx)| {
                let text = row.get(idx).map(cell_text).unwrap_or_default();
                (!text.is_empty()).then_some((*header, text))
            })
            .collect();
        Self { values }
    }

    fn is_blank(&self) -> bool {
        self.values.is_empty()
    }

    /// Trimmed cell text, empty when the column or cell is absent.
    fn text(&self, header: &str) -> &str {
        self.values.get(header).map(String::as_str).unwrap_or("")
    }

    fn owned(&self, header: &str) -> String {
        self.text(header).to_string()
    }

    fn optional(&self, header: &str) -> Option<String> {
        self.values.get(header).cloned()
    }

    /// Comma-separated cell as a list of trimmed, non-empty entries.
    fn list(&self, header: &str) -> Vec<String> {
        split_list(self.text(header))
    }
}

/// Split a multi-value cell on commas, trimming and dropping empty segments.
pub fn split_list(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn decode_course(row: &RowValues, sheet_row: usize) -> CourseRecord {
    CourseRecord {
        source_row: sheet_row,
        course_title: row.owned(headers::COURSE_TITLE),
        course_subtitle: row.owned(headers::COURSE_SUBTITLE),
        course_description: row.owned(headers::COURSE_DESCRIPTION),
        category: row.owned(headers::CATEGORY),
        language: row.owned(headers::LANGUAGE),
        level: row.owned(headers::LEVEL),
        country_codes: row.list(headers::COUNTRY_CODES),
        region_codes: row.list(headers::REGION_CODES),
        city_codes: row.list(headers::CITY_CODES),
        project_codes: row.list(headers::PROJECT_CODES),
        board_codes: row.list(headers::BOARD_CODES),
        school_codes: row.list(headers::SCHOOL_CODES),
        class_codes: row.list(headers::CLASS_CODES),
        requirements: row.list(headers::REQUIREMENTS),
        learning_outcomes: row.list(headers::LEARNING_OUTCOMES),
        duration: row.owned(headers::DURATION),
        sections: decode_sections(row),
    }
}

/// Probe `Section n Title` from n = 1 until the first empty title.
fn decode_sections(row: &RowValues) -> Vec<SectionRecord> {
    (1..)
        .map_while(|s| {
            let title = row.text(&headers::section_title(s));
            (!title.is_empty()).then(|| SectionRecord {
                title: title.to_string(),
                overview: row.owned(&headers::section_overview(s)),
                lessons: decode_lessons(row, s),
            })
        })
        .collect()
}

/// Probe `Lesson s.m Title` from m = 1 until the first empty title.
fn decode_lessons(row: &RowValues, s: usize) -> Vec<LessonRecord> {
    (1..)
        .map_while(|l| {
            let title = row.text(&headers::lesson_title(s, l));
            (!title.is_empty()).then(|| LessonRecord {
                title: title.to_string(),
                overview: row.owned(&headers::lesson_overview(s, l)),
                content_items: decode_content_items(row, s, l),
            })
        })
        .collect()
}

/// Probe `Content s.l.k` from k = 1 until both type and title are empty.
///
/// Items with a missing or unknown type are kept so validation can report them.
fn decode_content_items(row: &RowValues, s: usize, l: usize) -> Vec<ContentItemRecord> {
    (1..)
        .map_while(|c| {
            let kind = row.text(&headers::content_type(s, l, c));
            let title = row.text(&headers::content_title(s, l, c));
            if kind.is_empty() && title.is_empty() {
                return None;
            }
            Some(ContentItemRecord {
                content_type: ContentType::from_cell(kind),
                title: title.to_string(),
                path: row.optional(&headers::content_path(s, l, c)),
                due_date: row.optional(&headers::content_due_date(s, l, c)),
                assignment_instructions: row.optional(&headers::content_instructions(s, l, c)),
            })
        })
        .collect()
}
