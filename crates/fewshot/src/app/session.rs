//! Interactive authoring session.
//!
//! Owns the live template, the form fields, and the dataset on behalf of the presentation
//! layer. Every action returns a [`Reply`]; domain errors are recovered here and reported as
//! status messages with the state left unchanged.

use std::fmt;

use anyhow::Error;

use crate::app::dataset::{Dataset, SummaryRow, clamp_index};
use crate::app::export::{self, ExportOptions, ExportResult};
use crate::app::record::build_record;
use crate::app::render::render_preview;
use crate::domain::errors::DomainError;
use crate::domain::model::{ExampleFields, FieldName, TemplateConfig};
use crate::infra::clipboard::ClipboardSink;
use crate::infra::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// User-visible outcome line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub text: String,
}

impl Status {
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Error, text)
    }

    pub fn is_error(&self) -> bool {
        self.level == StatusLevel::Error
    }

    fn new(level: StatusLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Status plus optional text for the main display area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: Status,
    pub body: Option<String>,
}

impl Reply {
    fn status(status: Status) -> Self {
        Self { status, body: None }
    }

    fn with_body(status: Status, body: impl Into<String>) -> Self {
        Self {
            status,
            body: Some(body.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    config: Config,
    template: TemplateConfig,
    fields: ExampleFields,
    dataset: Dataset,
    view_index: usize,
    last_preview: Option<String>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            template: config.initial_template(),
            fields: config.defaults.fields(),
            dataset: Dataset::with_summary_max_len(config.display.summary_max_len),
            view_index: 1,
            last_preview: None,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn template(&self) -> &TemplateConfig {
        &self.template
    }

    pub fn fields(&self) -> &ExampleFields {
        &self.fields
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// 1-based index of the record last shown, always valid for the current dataset.
    pub fn view_index(&self) -> usize {
        self.view_index
    }

    pub fn last_preview(&self) -> Option<&str> {
        self.last_preview.as_deref()
    }

    pub fn rows(&self) -> Vec<SummaryRow> {
        self.dataset.rows()
    }

    /// Replace the live template. Records already stored keep their own snapshot.
    pub fn apply_template(&mut self, template: TemplateConfig) -> Reply {
        tracing::debug!(?template, "template applied");
        self.template = template;
        Reply::status(Status::success("Template applied."))
    }

    pub fn set_field(&mut self, field: FieldName, value: impl Into<String>) -> Reply {
        self.fields.set(field, value);
        Reply::status(Status::info(format!("Updated {field}.")))
    }

    /// Restore the configured default form values.
    pub fn reset_fields(&mut self) -> Reply {
        self.fields = self.config.defaults.fields();
        Reply::status(Status::info("Fields reset to defaults."))
    }

    pub fn preview(&mut self) -> Reply {
        match render_preview(&self.template, &self.fields) {
            Ok(text) => {
                self.last_preview = Some(text.clone());
                Reply::with_body(Status::success("Preview ready."), text)
            }
            Err(err) => {
                self.last_preview = None;
                recovered(err.into())
            }
        }
    }

    /// Copy the most recent preview.
    pub fn copy_preview(&self, clipboard: &mut dyn ClipboardSink) -> Reply {
        let Some(text) = self.last_preview.as_deref() else {
            return Reply::status(Status::error("Nothing to copy yet. Run preview first."));
        };
        match clipboard.copy(text) {
            Ok(()) => Reply::status(Status::success("Preview copied to clipboard.")),
            Err(err) => recovered(err),
        }
    }

    pub fn add_example(&mut self) -> Reply {
        match build_record(&self.template, &self.fields) {
            Ok(record) => {
                let outcome = self.dataset.add(record);
                Reply::status(Status::success(format!(
                    "Added example. {} in dataset.",
                    outcome.count
                )))
            }
            Err(err) => recovered(err.into()),
        }
    }

    /// Show the record at `index`, clamping it into range first.
    pub fn view(&mut self, index: i64) -> Reply {
        let count = self.dataset.len();
        if count == 0 {
            self.view_index = 1;
            return Reply::status(Status::info("Dataset is empty."));
        }

        let clamped = clamp_index(index, count);
        self.view_index = clamped;
        let text = match self.dataset.view(clamped as i64) {
            Ok(text) => text,
            Err(err) => return recovered(err.into()),
        };

        let status = if clamped as i64 != index {
            Status::error(format!(
                "{} Showing #{clamped}.",
                DomainError::IndexOutOfRange { index, count }
            ))
        } else {
            Status::info(format!("Example #{clamped} of {count}."))
        };
        Reply::with_body(status, text)
    }

    /// Delete the record at `index` and show whatever now occupies that position.
    pub fn delete(&mut self, index: i64) -> Reply {
        if let Err(err) = self.dataset.delete(index) {
            return recovered(err.into());
        }

        let status = Status::success(format!("Deleted example #{index}."));
        let count = self.dataset.len();
        self.view_index = clamp_index(index, count);
        if count == 0 {
            return Reply::with_body(status, "Dataset is now empty.");
        }
        match self.dataset.view(self.view_index as i64) {
            Ok(text) => Reply::with_body(status, text),
            Err(err) => recovered(err.into()),
        }
    }

    /// Export JSONL, optionally overriding the configured `keep_system` flag.
    pub fn export_jsonl(&self, keep_system: Option<bool>) -> Reply {
        let mut options = ExportOptions::from_config(&self.config);
        if let Some(keep) = keep_system {
            options.keep_system = keep;
        }
        exported(export::export_jsonl(&self.dataset, &options))
    }

    /// Export the single-object document using the live system text, template, and global APIs.
    pub fn export_object(&self) -> Reply {
        let options = ExportOptions::from_config(&self.config);
        exported(export::export_object(
            &self.dataset,
            &self.fields.system,
            &self.template,
            &self.fields.global_apis,
            &options,
        ))
    }
}

fn exported(result: anyhow::Result<ExportResult>) -> Reply {
    match result {
        Ok(result) => Reply::with_body(
            Status::success(result.message()),
            result.output_path.display().to_string(),
        ),
        Err(err) => recovered(err),
    }
}

fn recovered(err: Error) -> Reply {
    match err.downcast_ref::<DomainError>() {
        Some(domain) => {
            tracing::warn!(error = %domain, "action rejected");
            Reply::status(Status::error(domain.to_string()))
        }
        None => {
            tracing::warn!(error = %format!("{err:#}"), "action failed");
            Reply::status(Status::error(format!("{err:#}")))
        }
    }
}
