//! Building stored records from form fields.

use crate::app::render::is_blank;
use crate::domain::errors::DomainError;
use crate::domain::model::{
    ApiDocs, ApisScope, DEFAULT_ANSWER, ExampleFields, ExampleRecord, RecordMeta, Section,
    TemplateConfig,
};

/// Trimmed answer, or [`DEFAULT_ANSWER`] when the user left it blank.
pub fn normalize_answer(answer: &str) -> &str {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        DEFAULT_ANSWER
    } else {
        trimmed
    }
}

/// Check the single required field.
pub fn validate(fields: &ExampleFields) -> Result<(), DomainError> {
    if is_blank(&fields.system) {
        return Err(DomainError::MissingRequiredField { field: "System" });
    }
    Ok(())
}

/// Capture the form as an [`ExampleRecord`].
///
/// Values are stored untrimmed except for the answer, which goes through
/// [`normalize_answer`]. API docs are kept only under the scope that produced them.
pub fn build_record(
    template: &TemplateConfig,
    fields: &ExampleFields,
) -> Result<ExampleRecord, DomainError> {
    validate(fields)?;

    let api_docs = match template.apis_scope {
        ApisScope::Global if !is_blank(&fields.global_apis) => {
            Some(ApiDocs::Global(fields.global_apis.clone()))
        }
        ApisScope::PerExample if template.includes(Section::Apis) && !is_blank(&fields.apis) => {
            Some(ApiDocs::PerExample(fields.apis.clone()))
        }
        _ => None,
    };

    let optional = |section: Section, value: &str| {
        (template.includes(section) && !is_blank(value)).then(|| value.to_string())
    };

    Ok(ExampleRecord {
        meta: RecordMeta::from(template),
        system: fields.system.clone(),
        api_docs,
        question: optional(Section::Question, &fields.question),
        thought: optional(Section::Thought, &fields.thought),
        code: optional(Section::Code, &fields.code),
        answer: template
            .includes(Section::Answer)
            .then(|| normalize_answer(&fields.answer).to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::render::{render_preview, render_record};

    fn fields() -> ExampleFields {
        ExampleFields {
            system: "sys".into(),
            global_apis: "global docs".into(),
            apis: "per docs".into(),
            question: "Q1".into(),
            thought: "  ".into(),
            code: "x = 1\n".into(),
            answer: "  CT  ".into(),
        }
    }

    #[test]
    fn normalize_answer_falls_back_on_blank() {
        assert_eq!(normalize_answer(""), "MRI");
        assert_eq!(normalize_answer(" \n"), "MRI");
        assert_eq!(normalize_answer(" X-ray "), "X-ray");
    }

    #[test]
    fn per_example_scope_stores_apis() {
        let record = build_record(&TemplateConfig::default(), &fields()).unwrap();
        assert_eq!(record.apis(), Some("per docs"));
        assert_eq!(record.global_apis(), None);
        assert_eq!(record.question.as_deref(), Some("Q1"));
        assert_eq!(record.thought, None);
        assert_eq!(record.code.as_deref(), Some("x = 1\n"));
        assert_eq!(record.answer.as_deref(), Some("CT"));
    }

    #[test]
    fn global_scope_stores_global_snapshot_only() {
        let template = TemplateConfig::default().with_scope(ApisScope::Global);
        let record = build_record(&template, &fields()).unwrap();
        assert_eq!(record.global_apis(), Some("global docs"));
        assert_eq!(record.apis(), None);
    }

    #[test]
    fn global_scope_with_blank_docs_stores_no_apis() {
        let template = TemplateConfig::default().with_scope(ApisScope::Global);
        let mut fields = fields();
        fields.global_apis = "\n".into();
        let record = build_record(&template, &fields).unwrap();
        assert_eq!(record.api_docs, None);
    }

    #[test]
    fn excluded_sections_are_not_stored() {
        let template = TemplateConfig::default().with_sections([Section::Question]);
        let record = build_record(&template, &fields()).unwrap();
        assert_eq!(record.api_docs, None);
        assert_eq!(record.code, None);
        assert_eq!(record.answer, None);
        assert_eq!(record.question.as_deref(), Some("Q1"));
    }

    #[test]
    fn blank_answer_is_stored_as_default() {
        let mut fields = fields();
        fields.answer.clear();
        let record = build_record(&TemplateConfig::default(), &fields).unwrap();
        assert_eq!(record.answer.as_deref(), Some(DEFAULT_ANSWER));
    }

    #[test]
    fn missing_system_fails() {
        let mut fields = fields();
        fields.system = "   ".into();
        assert!(matches!(
            build_record(&TemplateConfig::default(), &fields),
            Err(DomainError::MissingRequiredField { .. })
        ));
    }

    #[test]
    fn record_rerenders_like_its_preview() {
        for template in [
            TemplateConfig::default(),
            TemplateConfig::default().with_scope(ApisScope::Global),
            TemplateConfig::default()
                .with_sections([Section::Thought, Section::Answer])
                .with_show_system(false),
        ] {
            let preview = render_preview(&template, &fields()).unwrap();
            let record = build_record(&template, &fields()).unwrap();
            assert_eq!(render_record(&record), preview);
        }
    }
}
