//! Dataset export to JSONL and single-object JSON files.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::app::dataset::Dataset;
use crate::domain::errors::DomainError;
use crate::domain::model::{ApiDocs, ApisScope, ExampleRecord, RecordMeta, TemplateConfig};
use crate::infra::config::Config;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// One JSON record per line.
    Jsonl,
    /// A single `{ system, apis?, example }` document.
    Object,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Jsonl => "jsonl",
            ExportFormat::Object => "object",
        }
    }

    /// Output file name for an export taken at `timestamp`.
    pub fn file_name(&self, timestamp: OffsetDateTime) -> Result<String> {
        let stamp = timestamp
            .format(format_description!(
                "[year][month][day]_[hour][minute][second]"
            ))
            .context("failed to format export timestamp")?;
        Ok(match self {
            ExportFormat::Jsonl => format!("fewshot_{stamp}.jsonl"),
            ExportFormat::Object => format!("fewshot_object_{stamp}.json"),
        })
    }
}

impl FromStr for ExportFormat {
    type Err = ExportFormatParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "jsonl" | "lines" => Ok(ExportFormat::Jsonl),
            "object" | "json" | "single" => Ok(ExportFormat::Object),
            other => Err(ExportFormatParseError::UnknownFormat(other.to_string())),
        }
    }
}

/// Error returned when parsing an [`ExportFormat`] fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ExportFormatParseError {
    #[error("unknown export format '{0}'")]
    UnknownFormat(String),
}

/// Runtime options controlling export behavior.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    /// Keep the `system` field on each JSONL line.
    pub keep_system: bool,
}

impl ExportOptions {
    /// Build options from configuration defaults.
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_dir: config.export.output_dir(),
            keep_system: config.export.keep_system(),
        }
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            keep_system: true,
        }
    }
}

/// Result of an export operation.
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub format: ExportFormat,
    pub output_path: PathBuf,
    pub examples: usize,
}

impl ExportResult {
    /// Status line for the presentation layer.
    pub fn message(&self) -> String {
        match self.format {
            ExportFormat::Jsonl => format!(
                "Exported {} records → {}",
                self.examples,
                self.output_path.display()
            ),
            ExportFormat::Object => format!(
                "Exported object with {} examples → {}",
                self.examples,
                self.output_path.display()
            ),
        }
    }
}

/// Top-level shape of the single-object export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectExport {
    pub system: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apis: Option<String>,
    pub example: Vec<ObjectExample>,
}

/// One entry of [`ObjectExport::example`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectExample {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl ObjectExample {
    fn from_record(record: &ExampleRecord, scope: ApisScope) -> Self {
        let apis = match scope {
            ApisScope::PerExample => record.apis().map(ToString::to_string),
            ApisScope::Global => None,
        };
        Self {
            apis,
            question: record.question.clone(),
            thought: record.thought.clone(),
            code: record.code.clone(),
            answer: record.answer.clone(),
        }
    }
}

/// Borrowed view of a record as written to one JSONL line, in record field order.
#[derive(Serialize)]
struct JsonlLine<'a> {
    meta: &'a RecordMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(flatten)]
    api_docs: &'a Option<ApiDocs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    question: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thought: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<&'a str>,
}

impl<'a> JsonlLine<'a> {
    fn new(record: &'a ExampleRecord, keep_system: bool) -> Self {
        Self {
            meta: &record.meta,
            system: keep_system.then_some(record.system.as_str()),
            api_docs: &record.api_docs,
            question: record.question.as_deref(),
            thought: record.thought.as_deref(),
            code: record.code.as_deref(),
            answer: record.answer.as_deref(),
        }
    }
}

/// JSONL body: one record per line, each terminated by a newline.
pub fn jsonl_contents(dataset: &Dataset, keep_system: bool) -> Result<String> {
    ensure_not_empty(dataset)?;

    let mut out = String::new();
    for record in dataset.records() {
        let line = serde_json::to_string(&JsonlLine::new(record, keep_system))
            .context("failed to encode JSONL line")?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

/// Build the single-object document.
///
/// `system` and `global_apis` come from the live form, not from record snapshots; `apis` is
/// emitted at the top level only when the live template uses global scope.
pub fn object_document(
    dataset: &Dataset,
    system: &str,
    template: &TemplateConfig,
    global_apis: &str,
) -> Result<ObjectExport> {
    ensure_not_empty(dataset)?;

    let scope = template.apis_scope;
    Ok(ObjectExport {
        system: system.to_string(),
        apis: (scope == ApisScope::Global).then(|| global_apis.to_string()),
        example: dataset
            .records()
            .iter()
            .map(|record| ObjectExample::from_record(record, scope))
            .collect(),
    })
}

/// Write the dataset as JSONL into the configured directory.
pub fn export_jsonl(dataset: &Dataset, options: &ExportOptions) -> Result<ExportResult> {
    export_jsonl_at(dataset, options, OffsetDateTime::now_utc())
}

/// Same as [`export_jsonl`] with an explicit timestamp for the file name.
pub fn export_jsonl_at(
    dataset: &Dataset,
    options: &ExportOptions,
    timestamp: OffsetDateTime,
) -> Result<ExportResult> {
    let contents = jsonl_contents(dataset, options.keep_system)?;
    let path = options
        .output_dir
        .join(ExportFormat::Jsonl.file_name(timestamp)?);
    write_output(&path, &contents)?;

    let result = ExportResult {
        format: ExportFormat::Jsonl,
        output_path: path,
        examples: dataset.len(),
    };
    tracing::info!(path = %result.output_path.display(), examples = result.examples, "exported jsonl");
    Ok(result)
}

/// Write the dataset as one pretty-printed JSON object.
pub fn export_object(
    dataset: &Dataset,
    system: &str,
    template: &TemplateConfig,
    global_apis: &str,
    options: &ExportOptions,
) -> Result<ExportResult> {
    export_object_at(
        dataset,
        system,
        template,
        global_apis,
        options,
        OffsetDateTime::now_utc(),
    )
}

/// Same as [`export_object`] with an explicit timestamp for the file name.
pub fn export_object_at(
    dataset: &Dataset,
    system: &str,
    template: &TemplateConfig,
    global_apis: &str,
    options: &ExportOptions,
    timestamp: OffsetDateTime,
) -> Result<ExportResult> {
    let document = object_document(dataset, system, template, global_apis)?;
    let contents =
        serde_json::to_string_pretty(&document).context("failed to serialize export object")?;
    let path = options
        .output_dir
        .join(ExportFormat::Object.file_name(timestamp)?);
    write_output(&path, &contents)?;

    let result = ExportResult {
        format: ExportFormat::Object,
        output_path: path,
        examples: document.example.len(),
    };
    tracing::info!(path = %result.output_path.display(), examples = result.examples, "exported object");
    Ok(result)
}

fn ensure_not_empty(dataset: &Dataset) -> Result<()> {
    if dataset.is_empty() {
        return Err(DomainError::EmptyDataset.into());
    }
    Ok(())
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create export directory: {}", parent.display()))?;
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write export output to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::record::build_record;
    use crate::domain::model::{ExampleFields, Section};
    use time::macros::datetime;

    fn dataset_with(template: &TemplateConfig, fields: &ExampleFields) -> Dataset {
        let mut dataset = Dataset::new();
        dataset.add(build_record(template, fields).unwrap());
        dataset
    }

    #[test]
    fn file_names_follow_timestamp_pattern() -> Result<()> {
        let at = datetime!(2024-03-05 07:08:09 UTC);
        assert_eq!(
            ExportFormat::Jsonl.file_name(at)?,
            "fewshot_20240305_070809.jsonl"
        );
        assert_eq!(
            ExportFormat::Object.file_name(at)?,
            "fewshot_object_20240305_070809.json"
        );
        Ok(())
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let err = jsonl_contents(&Dataset::new(), true).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DomainError>(),
            Some(&DomainError::EmptyDataset)
        );
        let err = object_document(&Dataset::new(), "s", &TemplateConfig::default(), "")
            .unwrap_err();
        assert!(err.downcast_ref::<DomainError>().is_some());
    }

    #[test]
    fn jsonl_can_drop_system() -> Result<()> {
        let fields = ExampleFields {
            system: "sys".into(),
            answer: "CT".into(),
            ..ExampleFields::default()
        };
        let dataset = dataset_with(&TemplateConfig::default(), &fields);

        let kept = jsonl_contents(&dataset, true)?;
        let line: serde_json::Value = serde_json::from_str(kept.trim_end())?;
        assert_eq!(line["system"], "sys");
        assert_eq!(line["meta"]["apis_scope"], "per");

        let dropped = jsonl_contents(&dataset, false)?;
        let line: serde_json::Value = serde_json::from_str(dropped.trim_end())?;
        assert!(line.get("system").is_none());
        assert_eq!(line["answer"], "CT");
        Ok(())
    }

    #[test]
    fn object_moves_global_apis_to_top_level() -> Result<()> {
        let template = TemplateConfig::default()
            .with_scope(ApisScope::Global)
            .with_sections([Section::Question, Section::Answer]);
        let fields = ExampleFields {
            system: "sys".into(),
            global_apis: "doc text".into(),
            question: "Q1".into(),
            ..ExampleFields::default()
        };
        let dataset = dataset_with(&template, &fields);

        let document = object_document(&dataset, "sys", &template, "doc text")?;
        assert_eq!(
            serde_json::to_value(&document)?,
            serde_json::json!({
                "system": "sys",
                "apis": "doc text",
                "example": [{"question": "Q1", "answer": "MRI"}]
            })
        );
        Ok(())
    }

    #[test]
    fn object_keeps_per_example_apis_under_per_scope() -> Result<()> {
        let template = TemplateConfig::default();
        let fields = ExampleFields {
            system: "sys".into(),
            apis: "def f(): ...".into(),
            code: "f()".into(),
            ..ExampleFields::default()
        };
        let dataset = dataset_with(&template, &fields);

        let document = object_document(&dataset, "live system", &template, "ignored")?;
        assert_eq!(document.system, "live system");
        assert_eq!(document.apis, None);
        assert_eq!(document.example[0].apis.as_deref(), Some("def f(): ..."));
        assert_eq!(document.example[0].code.as_deref(), Some("f()"));
        Ok(())
    }
}
