//! In-memory dataset of stored examples.

use serde::Serialize;

use crate::app::render::render_record;
use crate::domain::errors::DomainError;
use crate::domain::model::ExampleRecord;

/// Column headers matching [`SummaryRow`] fields.
pub const COLUMNS: [&str; 7] = [
    "#",
    "answer",
    "thought",
    "question",
    "code",
    "apis",
    "instruction",
];

/// Default display ceiling for summary cells.
pub const DEFAULT_SUMMARY_MAX_LEN: usize = 120;

const NEWLINE_MARKER: &str = " ⏎ ";
const ELLIPSIS: char = '…';

/// Display-safe projection of a record for list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub index: usize,
    pub answer: String,
    pub thought: String,
    pub question: String,
    pub code: String,
    pub apis: String,
    pub instruction: String,
}

impl SummaryRow {
    fn from_record(index: usize, record: &ExampleRecord, max_len: usize) -> Self {
        let cell = |value: Option<&str>| truncate(value.unwrap_or_default(), max_len);
        Self {
            index,
            answer: cell(record.answer.as_deref()),
            thought: cell(record.thought.as_deref()),
            question: cell(record.question.as_deref()),
            code: cell(record.code.as_deref()),
            apis: cell(record.apis()),
            instruction: cell(Some(&record.system)),
        }
    }

    /// Cells in [`COLUMNS`] order.
    pub fn cells(&self) -> [String; 7] {
        [
            self.index.to_string(),
            self.answer.clone(),
            self.thought.clone(),
            self.question.clone(),
            self.code.clone(),
            self.apis.clone(),
            self.instruction.clone(),
        ]
    }
}

/// Result of appending a record.
#[derive(Debug, Clone)]
pub struct AddOutcome {
    pub count: usize,
    pub rows: Vec<SummaryRow>,
}

/// Ordered examples addressed by 1-based position.
#[derive(Debug, Default, Clone)]
pub struct Dataset {
    records: Vec<ExampleRecord>,
    summary_max_len: usize,
}

impl Dataset {
    pub fn new() -> Self {
        Self::with_summary_max_len(DEFAULT_SUMMARY_MAX_LEN)
    }

    pub fn with_summary_max_len(summary_max_len: usize) -> Self {
        Self {
            records: Vec::new(),
            summary_max_len,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ExampleRecord] {
        &self.records
    }

    /// Append a record and return the new count with refreshed summary rows.
    pub fn add(&mut self, record: ExampleRecord) -> AddOutcome {
        self.records.push(record);
        tracing::info!(count = self.records.len(), "example added");
        AddOutcome {
            count: self.records.len(),
            rows: self.rows(),
        }
    }

    /// Full text of the record at `index`, rendered from its own template snapshot.
    pub fn view(&self, index: i64) -> Result<String, DomainError> {
        let position = self.position(index)?;
        Ok(render_record(&self.records[position]))
    }

    /// Remove the record at `index`; later records shift down by one.
    pub fn delete(&mut self, index: i64) -> Result<ExampleRecord, DomainError> {
        let position = self.position(index)?;
        let removed = self.records.remove(position);
        tracing::info!(index, count = self.records.len(), "example deleted");
        Ok(removed)
    }

    /// Summary projection of every record, in order.
    pub fn rows(&self) -> Vec<SummaryRow> {
        let max_len = if self.summary_max_len == 0 {
            DEFAULT_SUMMARY_MAX_LEN
        } else {
            self.summary_max_len
        };
        self.records
            .iter()
            .enumerate()
            .map(|(idx, record)| SummaryRow::from_record(idx + 1, record, max_len))
            .collect()
    }

    fn position(&self, index: i64) -> Result<usize, DomainError> {
        let count = self.records.len();
        if index < 1 || index as u64 > count as u64 {
            return Err(DomainError::IndexOutOfRange { index, count });
        }
        Ok(index as usize - 1)
    }
}

/// Coerce `requested` into `[1, count]`, or 1 for an empty dataset.
pub fn clamp_index(requested: i64, count: usize) -> usize {
    if count == 0 {
        return 1;
    }
    let upper = i64::try_from(count).unwrap_or(i64::MAX);
    requested.clamp(1, upper) as usize
}

/// Parse a user-typed index. Decimal input is truncated toward zero.
pub fn parse_index(input: &str) -> Result<i64, DomainError> {
    let trimmed = input.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(value);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value.trunc() as i64),
        _ => Err(DomainError::InvalidIndex(trimmed.to_string())),
    }
}

fn truncate(value: &str, max_len: usize) -> String {
    let flattened = value.replace('\n', NEWLINE_MARKER);
    if flattened.chars().count() <= max_len {
        return flattened;
    }
    let mut shortened: String = flattened.chars().take(max_len.saturating_sub(1)).collect();
    shortened.push(ELLIPSIS);
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::record::build_record;
    use crate::domain::model::{ExampleFields, Section, TemplateConfig};

    fn record(question: &str) -> ExampleRecord {
        let fields = ExampleFields {
            system: "sys".into(),
            question: question.into(),
            ..ExampleFields::default()
        };
        let template = TemplateConfig::default().with_sections([Section::Question, Section::Answer]);
        build_record(&template, &fields).unwrap()
    }

    fn dataset(questions: &[&str]) -> Dataset {
        let mut dataset = Dataset::new();
        for question in questions {
            dataset.add(record(question));
        }
        dataset
    }

    #[test]
    fn add_increments_count_and_refreshes_rows() {
        let mut dataset = dataset(&["first"]);
        let outcome = dataset.add(record("second"));
        assert_eq!(outcome.count, 2);
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[1].index, 2);
        assert_eq!(outcome.rows[1].question, "second");
        assert_eq!(outcome.rows[1].answer, "MRI");
    }

    #[test]
    fn view_rejects_out_of_range_indices() {
        let dataset = dataset(&["only"]);
        assert_eq!(
            dataset.view(0),
            Err(DomainError::IndexOutOfRange { index: 0, count: 1 })
        );
        assert!(dataset.view(2).is_err());
        assert!(dataset.view(-1).is_err());
        assert!(Dataset::new().view(1).is_err());
    }

    #[test]
    fn delete_shifts_later_records_down() {
        let mut dataset = dataset(&["a", "b", "c"]);
        let before = dataset.view(3).unwrap();

        let removed = dataset.delete(2).unwrap();
        assert_eq!(removed.question.as_deref(), Some("b"));
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.view(2).unwrap(), before);
        assert_eq!(dataset.rows()[1].index, 2);
    }

    #[test]
    fn delete_out_of_range_leaves_dataset_unchanged() {
        let mut dataset = dataset(&["a"]);
        assert!(dataset.delete(5).is_err());
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn view_uses_record_snapshot_not_live_template() {
        let dataset = dataset(&["What?"]);
        assert_eq!(
            dataset.view(1).unwrap(),
            "1. Instruction\n<SYSTEM>sys</SYSTEM>\n\n2. The VQA question:\nWhat?\n\n3. Answer: MRI"
        );
    }

    #[test]
    fn clamp_index_bounds() {
        assert_eq!(clamp_index(999, 5), 5);
        assert_eq!(clamp_index(-3, 5), 1);
        assert_eq!(clamp_index(3, 5), 3);
        assert_eq!(clamp_index(7, 0), 1);
        assert_eq!(clamp_index(-7, 0), 1);
    }

    #[test]
    fn parse_index_accepts_integers_and_decimals() {
        assert_eq!(parse_index(" 4 "), Ok(4));
        assert_eq!(parse_index("2.9"), Ok(2));
        assert_eq!(parse_index("-1"), Ok(-1));
        assert!(matches!(parse_index("two"), Err(DomainError::InvalidIndex(_))));
        assert!(parse_index("NaN").is_err());
    }

    #[test]
    fn summary_cells_flatten_newlines_and_ellipsize() {
        assert_eq!(truncate("a\nb", 120), "a ⏎ b");
        let long = "x".repeat(10);
        let cell = truncate(&long, 5);
        assert_eq!(cell, "xxxx…");
        assert_eq!(cell.chars().count(), 5);
        assert_eq!(truncate("héllo", 5), "héllo");
    }

    #[test]
    fn rows_use_configured_ceiling() {
        let mut dataset = Dataset::with_summary_max_len(4);
        dataset.add(record("a long question"));
        let row = &dataset.rows()[0];
        assert_eq!(row.question, "a l…");
        assert_eq!(row.instruction, "sys");
        assert_eq!(row.cells()[0], "1");
    }
}
