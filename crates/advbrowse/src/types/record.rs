//! Records, groups and group schema fields.

use serde::{Deserialize, Serialize};

/// Identifier of a record (a card).
pub type RecordId = i64;

/// Identifier of a group (a note).
pub type GroupId = i64;

/// Identifier of a group schema (a note type).
pub type SchemaId = i64;

/// Separator between field values in a group's stored field list.
pub const FIELD_SEPARATOR: char = '\u{1f}';

/// A single browsable record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Record id.
    pub id: RecordId,
    /// Owning group.
    pub group_id: GroupId,
    /// Deck the record belongs to.
    pub deck_id: i64,
    /// Template ordinal within the group's schema.
    pub ordinal: i64,
    /// Last modification time (seconds).
    pub modified: i64,
    /// Learning state: 0 new, 1 learning, 2 review, 3 relearning.
    pub card_type: i64,
    /// Scheduling queue; negative values mean suspended or buried.
    pub queue: i64,
    /// Due position or day.
    pub due: i64,
    /// Current interval in days.
    pub interval: i64,
    /// Ease factor in permille.
    pub ease_factor: i64,
    /// Number of reviews.
    pub reps: i64,
    /// Number of lapses.
    pub lapses: i64,
}

impl Record {
    /// Creates a new record in the given group with zeroed scheduling state.
    pub fn new(id: RecordId, group_id: GroupId) -> Self {
        Self {
            id,
            group_id,
            deck_id: 1,
            ordinal: 0,
            modified: 0,
            card_type: 0,
            queue: 0,
            due: 0,
            interval: 0,
            ease_factor: 0,
            reps: 0,
            lapses: 0,
        }
    }
}

/// The logical parent of one or more records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group id.
    pub id: GroupId,
    /// Schema describing the group's fields.
    pub schema_id: SchemaId,
    /// Last modification time (seconds).
    pub modified: i64,
    /// Space separated tags.
    pub tags: String,
    /// Field values in schema order.
    pub fields: Vec<String>,
    /// The value used by the built-in "sort field" column.
    pub sort_field: String,
}

impl Group {
    /// Creates a group whose sort field is its first field.
    pub fn new(id: GroupId, schema_id: SchemaId, fields: Vec<String>) -> Self {
        let sort_field = fields.first().cloned().unwrap_or_default();
        Self {
            id,
            schema_id,
            modified: 0,
            tags: String::new(),
            fields,
            sort_field,
        }
    }

    /// Sets the tags.
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    /// Overrides the sort field.
    pub fn with_sort_field(mut self, sort_field: impl Into<String>) -> Self {
        self.sort_field = sort_field.into();
        self
    }

    /// Joins the field values into their stored form.
    pub fn joined_fields(&self) -> String {
        self.fields.join(&FIELD_SEPARATOR.to_string())
    }

    /// Splits a stored field list. An empty string holds no fields.
    pub fn split_fields(stored: &str) -> Vec<String> {
        if stored.is_empty() {
            return Vec::new();
        }
        stored.split(FIELD_SEPARATOR).map(str::to_string).collect()
    }

    /// Returns the value of the field at `ordinal`.
    pub fn field(&self, ordinal: usize) -> Option<&str> {
        self.fields.get(ordinal).map(String::as_str)
    }
}

/// One field of a group schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name, unique within its schema.
    pub name: String,
    /// Position of the field in the group's field list.
    #[serde(default, rename = "ord")]
    pub ordinal: usize,
    /// Whether the field's text is right-to-left.
    #[serde(default)]
    pub rtl: bool,
    /// Editor font.
    #[serde(default = "default_font")]
    pub font: String,
    /// Editor font size.
    #[serde(default = "default_font_size")]
    pub size: u32,
}

fn default_font() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u32 {
    20
}

impl FieldDescriptor {
    /// Creates a left-to-right field descriptor.
    pub fn new(name: impl Into<String>, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            ordinal,
            rtl: false,
            font: default_font(),
            size: default_font_size(),
        }
    }

    /// Marks the field as right-to-left.
    pub fn right_to_left(mut self) -> Self {
        self.rtl = true;
        self
    }
}
