//! Domain models for the course import pipeline.
//!
//! - [`CourseRecord`] - One decoded course row with its nested structure
//! - [`SectionRecord`] / [`LessonRecord`] / [`ContentItemRecord`] - Nested entities
//! - [`ContentType`] - Closed set of content item types
//! - [`CatalogKind`] / [`CatalogEntry`] / [`ReferenceCatalogs`] - Lookup sets
//! - [`ValidationError`] - A single failed rule, reported to the caller

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Course Records
// =============================================================================

/// One course decoded from a worksheet row.
///
/// Serialized with the same camelCase keys the batch-insert step consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    /// Worksheet row (1-based, header is row 1) this course came from.
    pub source_row: usize,
    pub course_title: String,
    pub course_subtitle: String,
    pub course_description: String,
    pub category: String,
    pub language: String,
    pub level: String,
    pub country_codes: Vec<String>,
    pub region_codes: Vec<String>,
    pub city_codes: Vec<String>,
    pub project_codes: Vec<String>,
    pub board_codes: Vec<String>,
    pub school_codes: Vec<String>,
    pub class_codes: Vec<String>,
    pub requirements: Vec<String>,
    pub learning_outcomes: Vec<String>,
    pub duration: String,
    pub sections: Vec<SectionRecord>,
}

impl CourseRecord {
    /// Codes listed for a code-bearing catalog, empty for name catalogs.
    pub fn codes(&self, kind: CatalogKind) -> &[String] {
        match kind {
            CatalogKind::Countries => &self.country_codes,
            CatalogKind::Regions => &self.region_codes,
            CatalogKind::Cities => &self.city_codes,
            CatalogKind::Projects => &self.project_codes,
            CatalogKind::Boards => &self.board_codes,
            CatalogKind::Schools => &self.school_codes,
            CatalogKind::Classes => &self.class_codes,
            CatalogKind::Categories | CatalogKind::Languages | CatalogKind::Levels => &[],
        }
    }

    /// Name referenced in a name catalog, `None` for code catalogs.
    pub fn named_reference(&self, kind: CatalogKind) -> Option<&str> {
        match kind {
            CatalogKind::Categories => Some(&self.category),
            CatalogKind::Languages => Some(&self.language),
            CatalogKind::Levels => Some(&self.level),
            _ => None,
        }
    }

    /// Total lessons across all sections.
    pub fn lesson_count(&self) -> usize {
        self.sections.iter().map(|s| s.lessons.len()).sum()
    }

    /// Total content items across all lessons.
    pub fn content_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.lessons)
            .map(|l| l.content_items.len())
            .sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRecord {
    pub title: String,
    pub overview: String,
    pub lessons: Vec<LessonRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRecord {
    pub title: String,
    pub overview: String,
    pub content_items: Vec<ContentItemRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItemRecord {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_instructions: Option<String>,
}

impl ContentItemRecord {
    pub fn has_path(&self) -> bool {
        self.path.as_deref().is_some_and(|p| !p.trim().is_empty())
    }

    pub fn has_instructions(&self) -> bool {
        self.assignment_instructions
            .as_deref()
            .is_some_and(|i| !i.trim().is_empty())
    }
}

// =============================================================================
// Content Type
// =============================================================================

/// The four supported content item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Video,
    Attachment,
    Assignment,
    Quiz,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Video,
        ContentKind::Attachment,
        ContentKind::Assignment,
        ContentKind::Quiz,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Video => "video",
            ContentKind::Attachment => "attachment",
            ContentKind::Assignment => "assignment",
            ContentKind::Quiz => "quiz",
        }
    }

    /// Exact, case-sensitive match against the closed set.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == value)
    }

    /// Video and attachment items point at a stored file.
    pub fn requires_path(&self) -> bool {
        matches!(self, ContentKind::Video | ContentKind::Attachment)
    }
}

/// Content type as read from the sheet.
///
/// Values outside the closed set are kept verbatim so they can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentType {
    Known(ContentKind),
    Unrecognized(String),
}

impl ContentType {
    pub fn from_cell(value: &str) -> Self {
        match ContentKind::parse(value) {
            Some(kind) => ContentType::Known(kind),
            None => ContentType::Unrecognized(value.to_string()),
        }
    }

    pub fn kind(&self) -> Option<ContentKind> {
        match self {
            ContentType::Known(kind) => Some(*kind),
            ContentType::Unrecognized(_) => None,
        }
    }
}

// =============================================================================
// Reference Catalogs
// =============================================================================

/// The ten reference catalogs consulted during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CatalogKind {
    Categories,
    Languages,
    Levels,
    Countries,
    Regions,
    Cities,
    Projects,
    Boards,
    Schools,
    Classes,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 10] = [
        CatalogKind::Categories,
        CatalogKind::Languages,
        CatalogKind::Levels,
        CatalogKind::Countries,
        CatalogKind::Regions,
        CatalogKind::Cities,
        CatalogKind::Projects,
        CatalogKind::Boards,
        CatalogKind::Schools,
        CatalogKind::Classes,
    ];

    /// Backing table name.
    pub fn table(&self) -> &'static str {
        match self {
            CatalogKind::Categories => "course_categories",
            CatalogKind::Languages => "course_languages",
            CatalogKind::Levels => "course_levels",
            CatalogKind::Countries => "countries",
            CatalogKind::Regions => "regions",
            CatalogKind::Cities => "cities",
            CatalogKind::Projects => "projects",
            CatalogKind::Boards => "boards",
            CatalogKind::Schools => "schools",
            CatalogKind::Classes => "classes",
        }
    }

    /// Courses reference these by code rather than by name.
    pub fn is_coded(&self) -> bool {
        !matches!(
            self,
            CatalogKind::Categories | CatalogKind::Languages | CatalogKind::Levels
        )
    }

    /// Columns selected from the backing table.
    pub fn columns(&self) -> &'static str {
        if self.is_coded() {
            "id,name,code"
        } else {
            "id,name"
        }
    }

    /// Singular noun used in error messages ("country", "class").
    pub fn noun(&self) -> &'static str {
        match self {
            CatalogKind::Categories => "category",
            CatalogKind::Languages => "language",
            CatalogKind::Levels => "level",
            CatalogKind::Countries => "country",
            CatalogKind::Regions => "region",
            CatalogKind::Cities => "city",
            CatalogKind::Projects => "project",
            CatalogKind::Boards => "board",
            CatalogKind::Schools => "school",
            CatalogKind::Classes => "class",
        }
    }

    /// Spreadsheet column this catalog validates.
    pub fn header(&self) -> &'static str {
        match self {
            CatalogKind::Categories => "Category",
            CatalogKind::Languages => "Language",
            CatalogKind::Levels => "Level",
            CatalogKind::Countries => "Country Codes",
            CatalogKind::Regions => "Region Codes",
            CatalogKind::Cities => "City Codes",
            CatalogKind::Projects => "Project Codes",
            CatalogKind::Boards => "Board Codes",
            CatalogKind::Schools => "School Codes",
            CatalogKind::Classes => "Class Codes",
        }
    }
}

/// One row of a reference catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, code: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            code: code.map(str::to_string),
        }
    }

    pub fn name_matches(&self, value: &str) -> bool {
        self.name.to_lowercase() == value.to_lowercase()
    }

    pub fn code_matches(&self, value: &str) -> bool {
        self.code
            .as_deref()
            .is_some_and(|c| c.to_lowercase() == value.to_lowercase())
    }
}

/// Ids come back as UUID strings or integers depending on the table.
fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(i) => i.to_string(),
    })
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// All ten catalogs, loaded once per import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCatalogs {
    #[serde(default)]
    pub categories: Vec<CatalogEntry>,
    #[serde(default)]
    pub languages: Vec<CatalogEntry>,
    #[serde(default)]
    pub levels: Vec<CatalogEntry>,
    #[serde(default)]
    pub countries: Vec<CatalogEntry>,
    #[serde(default)]
    pub regions: Vec<CatalogEntry>,
    #[serde(default)]
    pub cities: Vec<CatalogEntry>,
    #[serde(default)]
    pub projects: Vec<CatalogEntry>,
    #[serde(default)]
    pub boards: Vec<CatalogEntry>,
    #[serde(default)]
    pub schools: Vec<CatalogEntry>,
    #[serde(default)]
    pub classes: Vec<CatalogEntry>,
}

impl ReferenceCatalogs {
    pub fn entries(&self, kind: CatalogKind) -> &[CatalogEntry] {
        match kind {
            CatalogKind::Categories => &self.categories,
            CatalogKind::Languages => &self.languages,
            CatalogKind::Levels => &self.levels,
            CatalogKind::Countries => &self.countries,
            CatalogKind::Regions => &self.regions,
            CatalogKind::Cities => &self.cities,
            CatalogKind::Projects => &self.projects,
            CatalogKind::Boards => &self.boards,
            CatalogKind::Schools => &self.schools,
            CatalogKind::Classes => &self.classes,
        }
    }

    fn entries_mut(&mut self, kind: CatalogKind) -> &mut Vec<CatalogEntry> {
        match kind {
            CatalogKind::Categories => &mut self.categories,
            CatalogKind::Languages => &mut self.languages,
            CatalogKind::Levels => &mut self.levels,
            CatalogKind::Countries => &mut self.countries,
            CatalogKind::Regions => &mut self.regions,
            CatalogKind::Cities => &mut self.cities,
            CatalogKind::Projects => &mut self.projects,
            CatalogKind::Boards => &mut self.boards,
            CatalogKind::Schools => &mut self.schools,
            CatalogKind::Classes => &mut self.classes,
        }
    }

    /// Set one catalog's entries, replacing what was there.
    pub fn with(mut self, kind: CatalogKind, entries: Vec<CatalogEntry>) -> Self {
        *self.entries_mut(kind) = entries;
        self
    }

    /// Assemble from fan-out results.
    pub fn from_parts(parts: impl IntoIterator<Item = (CatalogKind, Vec<CatalogEntry>)>) -> Self {
        parts
            .into_iter()
            .fold(Self::default(), |catalogs, (kind, entries)| catalogs.with(kind, entries))
    }

    pub fn find_by_name(&self, kind: CatalogKind, name: &str) -> Option<&CatalogEntry> {
        self.entries(kind).iter().find(|e| e.name_matches(name))
    }

    pub fn find_by_code(&self, kind: CatalogKind, code: &str) -> Option<&CatalogEntry> {
        self.entries(kind).iter().find(|e| e.code_matches(code))
    }

    /// Total entries across all catalogs.
    pub fn total_entries(&self) -> usize {
        CatalogKind::ALL.iter().map(|k| self.entries(*k).len()).sum()
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// A single failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub row: usize,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(row: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Row {}, {}: {}", self.row, self.field, self.message)
    }
}
