//! Tabular view of a docket's comments: nested-column flattening and CSV export

use chrono::{DateTime, TimeZone};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::models::{AggregateTable, Field};

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Column '{0}' does not exist")]
    UnknownColumn(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One cell of a [`Frame`]
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// The row never had a value for this column
    Absent,
    Value(Value),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Value(Value::String(value.into()))
    }

    /// CSV rendering: strings verbatim, absent and null empty, anything else as JSON
    pub fn render(&self) -> String {
        match self {
            Cell::Absent | Cell::Value(Value::Null) => String::new(),
            Cell::Value(Value::String(text)) => text.clone(),
            Cell::Value(other) => other.to_string(),
        }
    }
}

impl From<Field<String>> for Cell {
    fn from(field: Field<String>) -> Self {
        match field {
            Field::Absent => Cell::Absent,
            Field::Present(text) => Cell::text(text),
        }
    }
}

/// Column-named rows with a dense positional index 0..N-1
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Frame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build the frame for a docket, one row per record in table order.
    ///
    /// `attributes` stays a single nested column until [`Frame::flatten_nested`]
    /// expands it.
    pub fn from_table(table: &AggregateTable) -> Self {
        let columns = ["id", "type", "attributes", "links.self", "comment_text", "attach_link"]
            .iter()
            .map(|name| name.to_string())
            .collect();
        let mut frame = Frame::new(columns);

        for record in &table.records {
            frame.rows.push(vec![
                Cell::text(record.id.clone()),
                Cell::text(record.kind.clone()),
                Cell::Value(Value::Object(record.attributes.clone())),
                Cell::text(record.links.self_url.clone()),
                Cell::from(record.comment_text.clone()),
                match &record.attach_link {
                    Field::Absent => Cell::Absent,
                    Field::Present(links) => Cell::text(links.to_cell()),
                },
            ]);
        }

        frame
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let column = self.column_index(column)?;
        self.rows.get(row).map(|cells| &cells[column])
    }

    /// Expand the object-valued `column` into one column per nested key and drop it.
    ///
    /// New columns are appended in first-seen key order across rows. Rows that
    /// lack a key, or whose cell is not an object, get [`Cell::Absent`]. A key
    /// that clashes with an existing column becomes `{column}.{key}`. Row count
    /// and row order never change.
    pub fn flatten_nested(self, column: &str) -> Result<Frame, TableError> {
        let nested = self
            .column_index(column)
            .ok_or_else(|| TableError::UnknownColumn(column.to_string()))?;

        let mut keys: Vec<String> = Vec::new();
        for row in &self.rows {
            if let Cell::Value(Value::Object(map)) = &row[nested] {
                for key in map.keys() {
                    if !keys.contains(key) {
                        keys.push(key.clone());
                    }
                }
            }
        }

        let mut columns: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != nested)
            .map(|(_, name)| name.clone())
            .collect();
        for key in &keys {
            if columns.contains(key) {
                columns.push(format!("{}.{}", column, key));
            } else {
                columns.push(key.clone());
            }
        }

        let rows = self
            .rows
            .into_iter()
            .map(|mut row| {
                let object = match row.remove(nested) {
                    Cell::Value(Value::Object(map)) => Some(map),
                    _ => None,
                };
                for key in &keys {
                    let cell = object
                        .as_ref()
                        .and_then(|map| map.get(key))
                        .map(|value| Cell::Value(value.clone()))
                        .unwrap_or(Cell::Absent);
                    row.push(cell);
                }
                row
            })
            .collect();

        Ok(Frame { columns, rows })
    }

    /// Write the frame as CSV, index first under an empty header
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = vec![String::new()];
        header.extend(self.columns.iter().cloned());
        csv_writer.write_record(&header)?;

        for (index, row) in self.rows.iter().enumerate() {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(index.to_string());
            record.extend(row.iter().map(Cell::render));
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Write `{docket_id}_{timestamp}.csv` into `output_dir` and return its path
    pub fn export_csv<Tz: TimeZone>(
        &self,
        output_dir: &Path,
        docket_id: &str,
        now: &DateTime<Tz>,
    ) -> Result<PathBuf, TableError>
    where
        Tz::Offset: std::fmt::Display,
    {
        let path = output_dir.join(csv_file_name(docket_id, now));
        let file = std::fs::File::create(&path)?;
        self.write_csv(std::io::BufWriter::new(file))?;
        info!("Exported {} comments to {}", self.len(), path.display());
        Ok(path)
    }
}

/// `{docket_id}_{YYYY_MM_DD-HHMMAM}.csv`
pub fn csv_file_name<Tz: TimeZone>(docket_id: &str, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_{}.csv", docket_id, now.format("%Y_%m_%d-%I%M%p"))
}
