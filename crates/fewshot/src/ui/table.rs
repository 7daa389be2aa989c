//! Plain-text rendering of summary rows and session state.

use crate::app::dataset::{COLUMNS, SummaryRow};
use crate::domain::model::{ExampleFields, FieldName, TemplateConfig};

/// Widest a table cell may grow before it is cut, independent of the summary ceiling.
const MAX_CELL_WIDTH: usize = 32;

/// Render rows as an aligned text table with a header line.
pub fn render_rows(rows: &[SummaryRow]) -> String {
    if rows.is_empty() {
        return "No examples yet.".to_string();
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.cells().iter().map(|cell| fit(cell)).collect())
        .collect();

    let mut widths: Vec<usize> = COLUMNS.iter().map(|name| name.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header: Vec<String> = COLUMNS.iter().map(|name| name.to_string()).collect();
    let mut lines = vec![join(&header, &widths)];
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    lines.extend(cells.iter().map(|row| join(row, &widths)));
    lines.join("\n")
}

/// Describe the live template and form values.
pub fn render_state(template: &TemplateConfig, fields: &ExampleFields) -> String {
    let sections: Vec<&str> = template
        .include_sections
        .iter()
        .map(|section| section.as_str())
        .collect();
    let mut lines = vec![
        format!(
            "sections: {}",
            if sections.is_empty() {
                "(none)".to_string()
            } else {
                sections.join(", ")
            }
        ),
        format!("apis scope: {}", template.apis_scope),
        format!("show system: {}", on_off(template.show_system_in_preview)),
        format!(
            "show global apis: {}",
            on_off(template.show_global_apis_in_preview)
        ),
        String::new(),
    ];
    for field in FieldName::all() {
        let value = fields.get(*field);
        let shown = if value.trim().is_empty() {
            "(empty)".to_string()
        } else {
            fit(&value.replace('\n', " ⏎ "))
        };
        lines.push(format!("{:<12} {shown}", format!("{field}:")));
    }
    lines.join("\n")
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn fit(cell: &str) -> String {
    if cell.chars().count() <= MAX_CELL_WIDTH {
        return cell.to_string();
    }
    let mut cut: String = cell.chars().take(MAX_CELL_WIDTH - 1).collect();
    cut.push('…');
    cut
}

fn join(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: usize, question: &str) -> SummaryRow {
        SummaryRow {
            index,
            answer: "MRI".into(),
            thought: String::new(),
            question: question.into(),
            code: String::new(),
            apis: String::new(),
            instruction: "sys".into(),
        }
    }

    #[test]
    fn empty_table_has_placeholder() {
        assert_eq!(render_rows(&[]), "No examples yet.");
    }

    #[test]
    fn table_aligns_columns() {
        let table = render_rows(&[row(1, "short"), row(2, "a longer question")]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("# | answer | thought | question"));
        assert!(lines[3].contains("a longer question"));
        let header_question = lines[0].find("question").unwrap();
        assert_eq!(lines[2].find("short"), Some(header_question));
    }

    #[test]
    fn state_lists_every_field() {
        let text = render_state(&TemplateConfig::default(), &ExampleFields::default());
        assert!(text.contains("apis scope: per"));
        assert!(text.contains("global-apis: (empty)"));
        assert_eq!(text.lines().count(), 5 + FieldName::all().len());
    }
}
