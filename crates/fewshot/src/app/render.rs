//! Text rendering of few-shot examples.
//!
//! Sections are laid out in a fixed order (system, global APIs, per-example APIs, question,
//! thought, code, answer) and numbered from 1, counting only the sections actually emitted.

use crate::app::record::{normalize_answer, validate};
use crate::domain::errors::DomainError;
use crate::domain::model::{ApisScope, ExampleFields, ExampleRecord, Section, TemplateConfig};

/// Render a live preview of the form fields.
///
/// Fields belonging to sections the template excludes are ignored. Fails only when the system
/// message is blank.
pub fn render_preview(
    template: &TemplateConfig,
    fields: &ExampleFields,
) -> Result<String, DomainError> {
    validate(fields)?;
    let enabled = enabled_fields(template, fields);
    let text = render_text(template, &enabled);
    tracing::debug!(chars = text.len(), "rendered preview");
    Ok(text)
}

/// Re-render a stored record against the template snapshot it was captured with.
pub fn render_record(record: &ExampleRecord) -> String {
    render_text(&record.meta.to_template(), &record.to_fields())
}

fn enabled_fields(template: &TemplateConfig, fields: &ExampleFields) -> ExampleFields {
    let keep = |section: Section, value: &str| {
        if template.includes(section) {
            value.to_string()
        } else {
            String::new()
        }
    };

    let apis = if template.apis_scope == ApisScope::PerExample {
        keep(Section::Apis, &fields.apis)
    } else {
        String::new()
    };

    ExampleFields {
        system: fields.system.clone(),
        global_apis: fields.global_apis.clone(),
        apis,
        question: keep(Section::Question, &fields.question),
        thought: keep(Section::Thought, &fields.thought),
        code: keep(Section::Code, &fields.code),
        answer: keep(Section::Answer, &fields.answer),
    }
}

fn render_text(template: &TemplateConfig, fields: &ExampleFields) -> String {
    let mut blocks = Blocks::default();

    if template.show_system_in_preview {
        blocks.push(format!(
            "Instruction\n<SYSTEM>{}</SYSTEM>\n",
            fields.system.trim()
        ));
    }

    if template.apis_scope == ApisScope::Global
        && template.show_global_apis_in_preview
        && !is_blank(&fields.global_apis)
    {
        blocks.push(format!(
            "Tool APIs (Global)\n<APIs>\n{}\n</APIs>\n",
            fields.global_apis.trim_end()
        ));
    }

    if template.apis_scope == ApisScope::PerExample
        && template.includes(Section::Apis)
        && !is_blank(&fields.apis)
    {
        blocks.push(format!(
            "Tool APIs\n<APIs>\n{}\n</APIs>\n",
            fields.apis.trim_end()
        ));
    }

    if template.includes(Section::Question) && !is_blank(&fields.question) {
        blocks.push(format!("The VQA question:\n{}\n", fields.question.trim()));
    }

    if template.includes(Section::Thought) && !is_blank(&fields.thought) {
        blocks.push(format!(
            "Thought\n<THOUGHT>\n{}\n</THOUGHT>\n",
            fields.thought.trim()
        ));
    }

    if template.includes(Section::Code) && !is_blank(&fields.code) {
        blocks.push(format!(
            "The generated code\n<CODE>\n{}\n</CODE>\n",
            fields.code.trim_end()
        ));
    }

    if template.includes(Section::Answer) {
        blocks.push(format!("Answer: {}\n", normalize_answer(&fields.answer)));
    }

    blocks.finish()
}

/// Numbered blocks joined with blank lines.
#[derive(Default)]
struct Blocks {
    rendered: Vec<String>,
}

impl Blocks {
    fn push(&mut self, body: String) {
        let number = self.rendered.len() + 1;
        self.rendered.push(format!("{number}. {body}"));
    }

    fn finish(self) -> String {
        self.rendered.join("\n").trim().to_string()
    }
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
