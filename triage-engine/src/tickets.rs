//! Tickets - tabular input and labeled output
//!
//! `TigerStyle`: Validate at the boundary, then hand the engine plain values.
//!
//! A ticket table is a JSON array of row objects or a CSV file with a
//! header row. One column supplies the ticket text; an optional `Summary*`
//! column supplies the short text stored as a category example.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// Column used for ticket text whenever present.
pub const TEXT_COLUMN_PREFERRED: &str = "Description";

/// Column supplying example text.
pub const SUMMARY_COLUMN: &str = "Summary*";

/// Column added to the output rows.
pub const LABEL_COLUMN: &str = "Category";

// =============================================================================
// Error Types
// =============================================================================

/// Errors loading a ticket table.
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    /// The table has no rows
    #[error("ticket table is empty")]
    Empty,

    /// No column holds string values
    #[error("no text column found in ticket table")]
    NoTextColumn,

    /// A row is not a JSON object
    #[error("row {index} is not an object")]
    NotAnObject {
        /// Row position
        index: usize,
    },

    /// A ticket's index does not match its position in the run
    #[error("ticket at position {position} has index {index}")]
    IndexOutOfOrder {
        /// Position in the ticket list
        position: usize,
        /// Index the ticket carries
        index: usize,
    },

    /// Input is not a JSON array of rows
    #[error("malformed ticket table: {0}")]
    Malformed(#[from] serde_json::Error),

    /// CSV input or output failed
    #[error("ticket CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Input file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Table Format
// =============================================================================

/// On-disk layout of a ticket table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// JSON array of row objects
    Json,
    /// Comma-separated values with a header row
    Csv,
}

impl TableFormat {
    /// `Csv` for a `.csv` extension (any case), `Json` otherwise.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Json,
        }
    }
}

// =============================================================================
// Ticket
// =============================================================================

/// One ticket, immutable for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    /// Row position in the input table
    pub index: usize,
    /// Text that is embedded and shown to the oracle
    pub text: String,
    /// Short text stored as the category example, if the table has one
    pub summary: Option<String>,
}

impl Ticket {
    /// Ticket without a summary.
    #[must_use]
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            summary: None,
        }
    }

    /// Attach a summary.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Text recorded as a category example: the summary when present,
    /// otherwise the ticket text.
    #[must_use]
    pub fn example(&self) -> &str {
        self.summary.as_deref().unwrap_or(&self.text)
    }
}

// =============================================================================
// Ticket Table
// =============================================================================

/// Rows of a ticket file plus the columns chosen for text and summary.
///
/// # Example
///
/// ```rust
/// use triage_engine::tickets::TicketTable;
///
/// let table = TicketTable::from_json_str(
///     r#"[{"Id": 1, "Body": "printer jam on floor 2"}, {"Id": 2, "Body": "vpn down"}]"#,
/// ).unwrap();
/// assert_eq!(table.text_column(), "Body");
/// assert_eq!(table.tickets()[1].text, "vpn down");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TicketTable {
    rows: Vec<Map<String, Value>>,
    text_column: String,
    summary_column: Option<String>,
}

impl TicketTable {
    /// Build a table from parsed rows.
    ///
    /// # Errors
    /// `Empty`, `NotAnObject`, or `NoTextColumn`.
    pub fn from_rows(rows: Vec<Value>) -> Result<Self, TicketError> {
        if rows.is_empty() {
            return Err(TicketError::Empty);
        }

        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| match row {
                Value::Object(map) => Ok(map),
                _ => Err(TicketError::NotAnObject { index }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let text_column = select_text_column(&rows).ok_or(TicketError::NoTextColumn)?;
        let summary_column = rows
            .iter()
            .any(|row| row.contains_key(SUMMARY_COLUMN))
            .then(|| SUMMARY_COLUMN.to_string());

        tracing::debug!(
            rows = rows.len(),
            text_column = %text_column,
            has_summary = summary_column.is_some(),
            "ticket table loaded"
        );

        Ok(Self {
            rows,
            text_column,
            summary_column,
        })
    }

    /// Parse a JSON array of row objects.
    ///
    /// # Errors
    /// `Malformed` for invalid JSON, plus everything `from_rows` returns.
    pub fn from_json_str(json: &str) -> Result<Self, TicketError> {
        let rows: Vec<Value> = serde_json::from_str(json)?;
        Self::from_rows(rows)
    }

    /// Parse CSV with a header row. Empty cells become `null`.
    ///
    /// # Errors
    /// `Csv` for unreadable or ragged records, plus everything `from_rows`
    /// returns.
    pub fn from_csv_reader<R: Read>(input: R) -> Result<Self, TicketError> {
        let mut reader = csv::Reader::from_reader(input);
        let headers = reader.headers()?.clone();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row: Map<String, Value> = headers
                .iter()
                .zip(record.iter())
                .map(|(column, cell)| {
                    let value = if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::String(cell.to_string())
                    };
                    (column.to_string(), value)
                })
                .collect();
            rows.push(Value::Object(row));
        }

        Self::from_rows(rows)
    }

    /// Parse CSV text with a header row.
    ///
    /// # Errors
    /// Everything `from_csv_reader` returns.
    pub fn from_csv_str(csv: &str) -> Result<Self, TicketError> {
        Self::from_csv_reader(csv.as_bytes())
    }

    /// Read and parse a ticket file; `.csv` files are read as CSV, anything
    /// else as JSON.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, plus everything the format's parser
    /// returns.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TicketError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| TicketError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match TableFormat::from_path(path) {
            TableFormat::Json => Self::from_json_str(&contents),
            TableFormat::Csv => Self::from_csv_str(&contents),
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false for a constructed table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column used for ticket text.
    #[must_use]
    pub fn text_column(&self) -> &str {
        &self.text_column
    }

    /// Column used for example text, if any row has one.
    #[must_use]
    pub fn summary_column(&self) -> Option<&str> {
        self.summary_column.as_deref()
    }

    /// Tickets in row order.
    #[must_use]
    pub fn tickets(&self) -> Vec<Ticket> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let ticket = Ticket::new(index, cell_text(row.get(&self.text_column)));
                match &self.summary_column {
                    Some(column) => ticket.with_summary(cell_text(row.get(column))),
                    None => ticket,
                }
            })
            .collect()
    }

    /// Input rows with a `Category` column; unlabeled rows get `null`.
    ///
    /// # Panics
    /// Panics if `labels` does not have one entry per row.
    #[must_use]
    pub fn with_labels(&self, labels: &[Option<String>]) -> Value {
        Value::Array(
            self.labeled_rows(labels)
                .into_iter()
                .map(Value::Object)
                .collect(),
        )
    }

    /// Labeled rows as CSV. Columns keep first-seen order with `Category`
    /// last; missing and null cells are empty.
    ///
    /// # Errors
    /// `Csv` if a record cannot be written.
    ///
    /// # Panics
    /// Panics if `labels` does not have one entry per row.
    pub fn labeled_csv(&self, labels: &[Option<String>]) -> Result<String, TicketError> {
        let rows = self.labeled_rows(labels);

        let mut columns: Vec<&str> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if key != LABEL_COLUMN && !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
        columns.push(LABEL_COLUMN);

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&columns)?;
        for row in &rows {
            writer.write_record(columns.iter().map(|column| cell_text(row.get(*column))))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn labeled_rows(&self, labels: &[Option<String>]) -> Vec<Map<String, Value>> {
        assert_eq!(
            labels.len(),
            self.rows.len(),
            "one label slot per row required"
        );

        self.rows
            .iter()
            .zip(labels)
            .map(|(row, label)| {
                let mut row = row.clone();
                let cell = label.clone().map_or(Value::Null, Value::String);
                row.insert(LABEL_COLUMN.to_string(), cell);
                row
            })
            .collect()
    }
}

/// `Description` if any row has it; otherwise the string-valued column with
/// the greatest mean rendered length. Ties go to the first column seen.
fn select_text_column(rows: &[Map<String, Value>]) -> Option<String> {
    if rows.iter().any(|row| row.contains_key(TEXT_COLUMN_PREFERRED)) {
        return Some(TEXT_COLUMN_PREFERRED.to_string());
    }

    let mut columns: Vec<&String> = Vec::new();
    for row in rows {
        for (key, value) in row {
            if value.is_string() && !columns.contains(&key) {
                columns.push(key);
            }
        }
    }

    let mut best: Option<(&String, f64)> = None;
    for column in columns {
        let total_chars: usize = rows
            .iter()
            .map(|row| cell_text(row.get(column)).chars().count())
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let mean_chars = total_chars as f64 / rows.len() as f64;
        tracing::trace!(column = %column, mean_chars, "text column candidate");

        if best.map_or(true, |(_, len)| mean_chars > len) {
            best = Some((column, mean_chars));
        }
    }

    best.map(|(column, _)| column.clone())
}

/// Render a cell as text. Missing and null cells are empty.
fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefers_description() {
        let table = TicketTable::from_rows(vec![
            json!({"Description": "short", "Notes": "a much longer free text field here"}),
        ])
        .unwrap();
        assert_eq!(table.text_column(), "Description");
    }

    #[test]
    fn test_picks_longest_string_column() {
        let table = TicketTable::from_rows(vec![
            json!({"Id": 1, "Title": "VPN", "Body": "cannot connect to vpn from home"}),
            json!({"Id": 2, "Title": "Printer", "Body": null}),
            json!({"Id": 3, "Title": "Email", "Body": "mail stuck in outbox"}),
        ])
        .unwrap();

        assert_eq!(table.text_column(), "Body");
        assert_eq!(table.tickets()[1].text, "");
    }

    #[test]
    fn test_numeric_columns_are_not_text() {
        let err = TicketTable::from_rows(vec![json!({"Id": 1, "Priority": 3})]).unwrap_err();
        assert!(matches!(err, TicketError::NoTextColumn));
    }

    #[test]
    fn test_empty_and_malformed() {
        assert!(matches!(
            TicketTable::from_json_str("[]").unwrap_err(),
            TicketError::Empty
        ));
        assert!(matches!(
            TicketTable::from_json_str("{\"rows\": 1}").unwrap_err(),
            TicketError::Malformed(_)
        ));
        assert!(matches!(
            TicketTable::from_json_str("[{\"a\": \"x\"}, 3]").unwrap_err(),
            TicketError::NotAnObject { index: 1 }
        ));
    }

    #[test]
    fn test_summary_supplies_example() {
        let table = TicketTable::from_rows(vec![
            json!({"Description": "laser printer on 3rd floor shows paper jam", "Summary*": "Paper jam"}),
            json!({"Description": "wifi drops every hour"}),
        ])
        .unwrap();

        let tickets = table.tickets();
        assert_eq!(table.summary_column(), Some(SUMMARY_COLUMN));
        assert_eq!(tickets[0].example(), "Paper jam");
        assert_eq!(tickets[1].summary.as_deref(), Some(""));
    }

    #[test]
    fn test_example_falls_back_to_text() {
        let ticket = Ticket::new(0, "printer not working");
        assert_eq!(ticket.example(), "printer not working");
    }

    #[test]
    fn test_with_labels_keeps_columns() {
        let table = TicketTable::from_rows(vec![
            json!({"Id": 7, "Description": "printer jam"}),
            json!({"Id": 8, "Description": "vpn down"}),
        ])
        .unwrap();

        let output = table.with_labels(&[Some("Printer Issue".into()), None]);
        assert_eq!(
            output,
            json!([
                {"Id": 7, "Description": "printer jam", "Category": "Printer Issue"},
                {"Id": 8, "Description": "vpn down", "Category": null},
            ])
        );
    }

    #[test]
    fn test_csv_input_selects_columns() {
        let table = TicketTable::from_csv_str(
            "Id,Title,Details,Summary*\n\
             1,VPN,cannot connect to vpn from home office,VPN down\n\
             2,Printer,,\n",
        )
        .unwrap();

        assert_eq!(table.text_column(), "Details");
        let tickets = table.tickets();
        assert_eq!(tickets[0].example(), "VPN down");
        assert_eq!(tickets[1].text, "");
    }

    #[test]
    fn test_ragged_csv_is_an_error() {
        let err = TicketTable::from_csv_str("Description,Id\nprinter jam,1,extra\n").unwrap_err();
        assert!(matches!(err, TicketError::Csv(_)));
    }

    #[test]
    fn test_labeled_csv_appends_category() {
        let table =
            TicketTable::from_csv_str("Id,Description\n7,\"printer jam, floor 2\"\n8,vpn down\n")
                .unwrap();

        let csv = table
            .labeled_csv(&[Some("Printer Issue".into()), None])
            .unwrap();

        assert_eq!(
            csv,
            "Id,Description,Category\n7,\"printer jam, floor 2\",Printer Issue\n8,vpn down,\n"
        );
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(TableFormat::from_path(Path::new("t.csv")), TableFormat::Csv);
        assert_eq!(TableFormat::from_path(Path::new("t.CSV")), TableFormat::Csv);
        assert_eq!(TableFormat::from_path(Path::new("t.json")), TableFormat::Json);
        assert_eq!(TableFormat::from_path(Path::new("tickets")), TableFormat::Json);
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.json");
        std::fs::write(&path, r#"[{"Description": "disk full"}]"#).unwrap();

        let table = TicketTable::from_path(&path).unwrap();
        assert_eq!(table.len(), 1);

        let missing = TicketTable::from_path(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, TicketError::Io { .. }));

        let csv_path = dir.path().join("tickets.csv");
        std::fs::write(&csv_path, "Description\ndisk full\nvpn down\n").unwrap();
        let table = TicketTable::from_path(&csv_path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.tickets()[1].text, "vpn down");
    }
}
