//! In-memory `.xlsx` workbooks for tests.
//!
//! Writes a minimal OOXML package (content types, relationships, workbook and
//! one inline-string worksheet) so tests exercise the real decoder path.

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::headers;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Courses" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const EMPTY_WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets/></workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// A cell in a fixture row.
#[derive(Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Builds a single-sheet workbook keyed by header name.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl SheetBuilder {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Headers for the flat course columns plus the given nesting shape.
    pub fn template(sections: usize, lessons: usize, contents: usize) -> Self {
        Self {
            headers: headers::header_template(sections, lessons, contents),
            rows: Vec::new(),
        }
    }

    /// Append a row from `(header, value)` pairs; unknown headers panic.
    pub fn row(mut self, values: &[(&str, &str)]) -> Self {
        let mut cells = vec![Cell::Empty; self.headers.len()];
        for (header, value) in values {
            let idx = self
                .headers
                .iter()
                .position(|h| h == header)
                .unwrap_or_else(|| panic!("fixture has no header {header:?}"));
            cells[idx] = Cell::from(*value);
        }
        self.rows.push(cells);
        self
    }

    /// Append a row of raw cells in header order.
    pub fn raw_row(mut self, cells: Vec<Cell>) -> Self {
        self.rows.push(cells);
        self
    }

    /// Append a completely empty row.
    pub fn blank_row(self) -> Self {
        self.raw_row(Vec::new())
    }

    pub fn build(&self) -> Vec<u8> {
        let mut grid: Vec<Vec<Cell>> = vec![self.headers.iter().map(|h| Cell::from(h.as_str())).collect()];
        grid.extend(self.rows.iter().cloned());
        package(WORKBOOK, Some(&sheet_xml(&grid)))
    }
}

/// A valid archive with a workbook that lists no sheets.
pub fn workbook_without_sheets() -> Vec<u8> {
    package(EMPTY_WORKBOOK, None)
}

/// A minimal valid course row for a template sheet.
pub fn minimal_course<'a>(title: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("Course Title", title),
        ("Category", "Mathematics"),
        ("Language", "English"),
        ("Level", "Beginner"),
    ]
}

fn package(workbook: &str, sheet: Option<&str>) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut parts = vec![
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", workbook.to_string()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
    ];
    if let Some(sheet) = sheet {
        parts.push(("xl/worksheets/sheet1.xml", sheet.to_string()));
    }

    for (name, body) in parts {
        zip.start_file(name, opts).expect("start zip entry");
        zip.write_all(body.as_bytes()).expect("write zip entry");
    }

    zip.finish().expect("finish zip").into_inner()
}

fn sheet_xml(grid: &[Vec<Cell>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    for (r, row) in grid.iter().enumerate() {
        let row_num = r + 1;
        xml.push_str(&format!(r#"<row r="{row_num}">"#));
        for (c, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", column_name(c), row_num);
            match cell {
                Cell::Text(s) => xml.push_str(&format!(
                    r#"<c r="{reference}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                    escape(s)
                )),
                Cell::Number(n) => {
                    xml.push_str(&format!(r#"<c r="{reference}"><v>{n}</v></c>"#))
                }
                Cell::Empty => {}
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn column_name(mut idx: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    name.reverse();
    String::from_utf8(name).expect("ascii column name")
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[test]
fn test_column_names() {
    assert_eq!(column_name(0), "A");
    assert_eq!(column_name(25), "Z");
    assert_eq!(column_name(26), "AA");
    assert_eq!(column_name(27), "AB");
    assert_eq!(column_name(701), "ZZ");
    assert_eq!(column_name(702), "AAA");
}
