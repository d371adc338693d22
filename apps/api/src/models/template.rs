use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::engine::conditions::Condition;

pub const DEFAULT_MAX_VERSIONS: usize = 10;

/// A versioned offer-letter template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "initial_version")]
    pub version: i32,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "universal_industry")]
    pub industry: String,
    #[serde(default = "universal_company_type")]
    pub company_type: String,
    #[serde(default)]
    pub department_id: Option<Uuid>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub salary_structure_type: Option<String>,
    pub content: TemplateContent,
    #[serde(default)]
    pub version_history: VersionHistory,
    #[serde(default = "default_max_versions")]
    pub max_versions: usize,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn initial_version() -> i32 {
    1
}

fn active_by_default() -> bool {
    true
}

fn universal_industry() -> String {
    "Universal".to_string()
}

fn universal_company_type() -> String {
    "universal".to_string()
}

fn default_max_versions() -> usize {
    DEFAULT_MAX_VERSIONS
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateContent {
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub placeholders: Vec<PlaceholderDefinition>,
    #[serde(default)]
    pub global_styling: GlobalStyling,
}

/// Document-wide presentation defaults. Company branding overrides these at render time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStyling {
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: String,
    #[serde(default = "default_line_height")]
    pub line_height: String,
    #[serde(default = "default_text_color")]
    pub color: String,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub secondary_color: Option<String>,
}

impl Default for GlobalStyling {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            font_size: default_font_size(),
            line_height: default_line_height(),
            color: default_text_color(),
            primary_color: None,
            secondary_color: None,
        }
    }
}

fn default_font_family() -> String {
    "Arial, sans-serif".to_string()
}

fn default_font_size() -> String {
    "14px".to_string()
}

fn default_line_height() -> String {
    "1.6".to_string()
}

fn default_text_color() -> String {
    "#333333".to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

/// The kind of a section. Unknown type strings are preserved in `Unsupported`
/// so that a malformed section degrades to a visible marker instead of failing
/// deserialization of the whole template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Header,
    Paragraph,
    Table,
    List,
    RichText,
    Conditional,
    SalaryTable,
    DocumentList,
    CompanyInfo,
    BenefitsTable,
    TermsConditions,
    ComplianceSection,
    #[serde(untagged)]
    Unsupported(String),
}

impl SectionKind {
    pub fn as_str(&self) -> &str {
        match self {
            SectionKind::Header => "header",
            SectionKind::Paragraph => "paragraph",
            SectionKind::Table => "table",
            SectionKind::List => "list",
            SectionKind::RichText => "rich_text",
            SectionKind::Conditional => "conditional",
            SectionKind::SalaryTable => "salary_table",
            SectionKind::DocumentList => "document_list",
            SectionKind::CompanyInfo => "company_info",
            SectionKind::BenefitsTable => "benefits_table",
            SectionKind::TermsConditions => "terms_conditions",
            SectionKind::ComplianceSection => "compliance_section",
            SectionKind::Unsupported(raw) => raw,
        }
    }

    /// Company-branded kinds read from the company policy and honour `companyConditions`.
    pub fn is_company_branded(&self) -> bool {
        matches!(
            self,
            SectionKind::CompanyInfo
                | SectionKind::BenefitsTable
                | SectionKind::TermsConditions
                | SectionKind::ComplianceSection
        )
    }

    /// Kinds filled from the salary breakdown or the company policy; they render
    /// without any authored content.
    pub fn is_data_driven(&self) -> bool {
        matches!(self, SectionKind::SalaryTable) || self.is_company_branded()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    #[serde(default)]
    pub title: Option<String>,
    /// Shape depends on `kind`; see the section renderer.
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
    #[serde(default)]
    pub formatting: Formatting,
    /// Free-form presentation hints carried for the editor; no effect on rendering.
    #[serde(default)]
    pub styling: Option<Value>,
    #[serde(default)]
    pub placeholders: Vec<PlaceholderDefinition>,
    #[serde(default)]
    pub conditional_sections: Vec<ConditionalSection>,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub company_conditions: Vec<Condition>,
    #[serde(default)]
    pub metadata: SectionMetadata,
}

impl Section {
    /// True when the section carries something to render: a data-driven kind,
    /// non-blank content or any block.
    pub fn has_content(&self) -> bool {
        self.kind.is_data_driven() || !self.blocks.is_empty() || !is_blank(&self.content)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectionMetadata {
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub order: i32,
}

/// Presentation-only formatting. Never affects data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Formatting {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub font_size: Option<String>,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub alignment: Option<String>,
    /// Heading level for `header` sections (1–6).
    #[serde(default)]
    pub level: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Text,
    Placeholder,
    Break,
    Image,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub formatting: Formatting,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalSection {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub content: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Placeholder definitions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderType {
    #[default]
    Text,
    Number,
    Currency,
    Date,
    Email,
    Boolean,
    List,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderDefinition {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: PlaceholderType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub validation: Option<Value>,
    #[serde(default)]
    pub category: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Version history
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub version: i32,
    pub content: TemplateContent,
    #[serde(default)]
    pub changed_by: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Append-only history that keeps only the most recent `cap` entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct VersionHistory(VecDeque<VersionEntry>);

impl VersionHistory {
    /// Appends an entry, then drops the oldest entries beyond `cap`.
    /// A cap of zero is treated as one: the newest entry is always retained.
    pub fn push_bounded(&mut self, entry: VersionEntry, cap: usize) {
        self.0.push_back(entry);
        let cap = cap.max(1);
        while self.0.len() > cap {
            self.0.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &VersionEntry> {
        self.0.iter()
    }

    pub fn find(&self, version: i32) -> Option<&VersionEntry> {
        self.0.iter().find(|e| e.version == version)
    }

    pub fn latest(&self) -> Option<&VersionEntry> {
        self.0.back()
    }
}
