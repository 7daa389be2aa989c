//! Domain models for templates, form fields, and stored examples.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Answer substituted whenever the Answer section is included but left blank.
pub const DEFAULT_ANSWER: &str = "MRI";

/// Optional per-example block that a template may include.
///
/// Variants are declared in canonical render order so ordered collections of sections
/// iterate the way previews are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Section {
    #[serde(rename = "APIs")]
    Apis,
    Question,
    Thought,
    Code,
    Answer,
}

impl Section {
    /// Stable identifier used in configuration and record metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Apis => "APIs",
            Section::Question => "Question",
            Section::Thought => "Thought",
            Section::Code => "Code",
            Section::Answer => "Answer",
        }
    }

    /// Every section in canonical order.
    pub fn all() -> &'static [Section] {
        &[
            Section::Apis,
            Section::Question,
            Section::Thought,
            Section::Code,
            Section::Answer,
        ]
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "apis" | "api" => Ok(Section::Apis),
            "question" | "q" => Ok(Section::Question),
            "thought" | "thoughts" => Ok(Section::Thought),
            "code" => Ok(Section::Code),
            "answer" | "a" => Ok(Section::Answer),
            other => Err(ParseError::UnknownSection(other.to_string())),
        }
    }
}

/// Where API documentation is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApisScope {
    /// Each example carries its own API block.
    #[default]
    #[serde(rename = "per")]
    PerExample,
    /// One API block shared by the whole dataset.
    #[serde(rename = "global")]
    Global,
}

impl ApisScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApisScope::PerExample => "per",
            ApisScope::Global => "global",
        }
    }
}

impl fmt::Display for ApisScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApisScope {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "per" | "per-example" | "per_example" | "example" => Ok(ApisScope::PerExample),
            "global" | "one-time" | "once" => Ok(ApisScope::Global),
            other => Err(ParseError::UnknownScope(other.to_string())),
        }
    }
}

/// Error returned when parsing user-facing identifiers fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown section '{0}' (expected APIs, Question, Thought, Code, Answer)")]
    UnknownSection(String),
    #[error("unknown APIs scope '{0}' (expected per or global)")]
    UnknownScope(String),
    #[error("unknown field '{0}'")]
    UnknownField(String),
}

/// Settings deciding which sections a preview or record contains.
///
/// Treated as a value: the `with_*` helpers consume `self` and return the updated copy, so a
/// template captured by a record can never change underneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(default = "TemplateConfig::default_sections")]
    pub include_sections: BTreeSet<Section>,
    #[serde(default)]
    pub apis_scope: ApisScope,
    #[serde(default = "default_true")]
    pub show_system_in_preview: bool,
    #[serde(default = "default_true")]
    pub show_global_apis_in_preview: bool,
}

impl TemplateConfig {
    fn default_sections() -> BTreeSet<Section> {
        Section::all().iter().copied().collect()
    }

    pub fn includes(&self, section: Section) -> bool {
        self.include_sections.contains(&section)
    }

    pub fn with_sections<I>(mut self, sections: I) -> Self
    where
        I: IntoIterator<Item = Section>,
    {
        self.include_sections = sections.into_iter().collect();
        self
    }

    pub fn with_scope(mut self, scope: ApisScope) -> Self {
        self.apis_scope = scope;
        self
    }

    pub fn with_show_system(mut self, show: bool) -> Self {
        self.show_system_in_preview = show;
        self
    }

    pub fn with_show_global_apis(mut self, show: bool) -> Self {
        self.show_global_apis_in_preview = show;
        self
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            include_sections: Self::default_sections(),
            apis_scope: ApisScope::PerExample,
            show_system_in_preview: true,
            show_global_apis_in_preview: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Names of the form fields an example is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    System,
    GlobalApis,
    Apis,
    Question,
    Thought,
    Code,
    Answer,
}

impl FieldName {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::System => "system",
            FieldName::GlobalApis => "global-apis",
            FieldName::Apis => "apis",
            FieldName::Question => "question",
            FieldName::Thought => "thought",
            FieldName::Code => "code",
            FieldName::Answer => "answer",
        }
    }

    pub fn all() -> &'static [FieldName] {
        &[
            FieldName::System,
            FieldName::GlobalApis,
            FieldName::Apis,
            FieldName::Question,
            FieldName::Thought,
            FieldName::Code,
            FieldName::Answer,
        ]
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "system" | "instruction" => Ok(FieldName::System),
            "global-apis" | "global_apis" | "globalapis" => Ok(FieldName::GlobalApis),
            "apis" | "api" => Ok(FieldName::Apis),
            "question" => Ok(FieldName::Question),
            "thought" => Ok(FieldName::Thought),
            "code" => Ok(FieldName::Code),
            "answer" => Ok(FieldName::Answer),
            other => Err(ParseError::UnknownField(other.to_string())),
        }
    }
}

/// Raw form values as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExampleFields {
    pub system: String,
    pub global_apis: String,
    pub apis: String,
    pub question: String,
    pub thought: String,
    pub code: String,
    pub answer: String,
}

impl ExampleFields {
    pub fn get(&self, field: FieldName) -> &str {
        match field {
            FieldName::System => &self.system,
            FieldName::GlobalApis => &self.global_apis,
            FieldName::Apis => &self.apis,
            FieldName::Question => &self.question,
            FieldName::Thought => &self.thought,
            FieldName::Code => &self.code,
            FieldName::Answer => &self.answer,
        }
    }

    pub fn set(&mut self, field: FieldName, value: impl Into<String>) {
        let value = value.into();
        match field {
            FieldName::System => self.system = value,
            FieldName::GlobalApis => self.global_apis = value,
            FieldName::Apis => self.apis = value,
            FieldName::Question => self.question = value,
            FieldName::Thought => self.thought = value,
            FieldName::Code => self.code = value,
            FieldName::Answer => self.answer = value,
        }
    }
}

/// Template snapshot stored alongside each record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub included_sections: BTreeSet<Section>,
    pub apis_scope: ApisScope,
    pub show_system_in_preview: bool,
    pub show_global_apis_in_preview: bool,
}

impl From<&TemplateConfig> for RecordMeta {
    fn from(value: &TemplateConfig) -> Self {
        Self {
            included_sections: value.include_sections.clone(),
            apis_scope: value.apis_scope,
            show_system_in_preview: value.show_system_in_preview,
            show_global_apis_in_preview: value.show_global_apis_in_preview,
        }
    }
}

impl RecordMeta {
    /// Rebuild the template that produced the record.
    pub fn to_template(&self) -> TemplateConfig {
        TemplateConfig {
            include_sections: self.included_sections.clone(),
            apis_scope: self.apis_scope,
            show_system_in_preview: self.show_system_in_preview,
            show_global_apis_in_preview: self.show_global_apis_in_preview,
        }
    }
}

/// API documentation captured by a record. Serialized as either a `global_apis` or an `apis`
/// key, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiDocs {
    #[serde(rename = "global_apis")]
    Global(String),
    #[serde(rename = "apis")]
    PerExample(String),
}

/// A stored few-shot example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleRecord {
    pub meta: RecordMeta,
    pub system: String,
    #[serde(flatten, default)]
    pub api_docs: Option<ApiDocs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl ExampleRecord {
    pub fn global_apis(&self) -> Option<&str> {
        match &self.api_docs {
            Some(ApiDocs::Global(text)) => Some(text),
            _ => None,
        }
    }

    pub fn apis(&self) -> Option<&str> {
        match &self.api_docs {
            Some(ApiDocs::PerExample(text)) => Some(text),
            _ => None,
        }
    }

    /// Field values as stored, with absent fields left empty.
    pub fn to_fields(&self) -> ExampleFields {
        ExampleFields {
            system: self.system.clone(),
            global_apis: self.global_apis().unwrap_or_default().to_string(),
            apis: self.apis().unwrap_or_default().to_string(),
            question: self.question.clone().unwrap_or_default(),
            thought: self.thought.clone().unwrap_or_default(),
            code: self.code.clone().unwrap_or_default(),
            answer: self.answer.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_parse_case_insensitively() {
        assert_eq!("apis".parse::<Section>(), Ok(Section::Apis));
        assert_eq!(" Thought ".parse::<Section>(), Ok(Section::Thought));
        assert!("summary".parse::<Section>().is_err());
    }

    #[test]
    fn template_serializes_with_wire_names() {
        let template = TemplateConfig::default()
            .with_sections([Section::Answer, Section::Apis])
            .with_scope(ApisScope::Global);
        let value = serde_json::to_value(&template).unwrap();
        assert_eq!(value["include_sections"], serde_json::json!(["APIs", "Answer"]));
        assert_eq!(value["apis_scope"], "global");
    }

    #[test]
    fn record_serializes_exactly_one_api_key() {
        let record = ExampleRecord {
            meta: RecordMeta::from(&TemplateConfig::default()),
            system: "sys".into(),
            api_docs: Some(ApiDocs::Global("docs".into())),
            question: None,
            thought: None,
            code: None,
            answer: Some("MRI".into()),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["global_apis"], "docs");
        assert!(value.get("apis").is_none());
        assert!(value.get("question").is_none());
    }

    #[test]
    fn meta_round_trips_to_template() {
        let template = TemplateConfig::default()
            .with_sections([Section::Question])
            .with_show_system(false);
        assert_eq!(RecordMeta::from(&template).to_template(), template);
    }
}
