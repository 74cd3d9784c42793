//! CSV loading and saving for raw and windowed datasets.
//!
//! Column types are inferred: a column is numeric when every kept value
//! parses as a number, otherwise it becomes categorical with its values in
//! first-seen order. The label column is always categorical. Rows carrying
//! the missing-label sentinel are dropped, and the sentinel never becomes a
//! legal label value.

use crate::dataset::{Attribute, AttributeKind, Dataset, Instance, Schema};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

/// Options for reading a CSV file.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Name of the label column
    pub label: String,
    /// Label value marking rows without ground truth
    pub missing_label: Option<String>,
    /// Field delimiter
    pub delimiter: u8,
    /// Relation name for the resulting schema
    pub relation: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            label: "gt".to_string(),
            missing_label: Some("null".to_string()),
            delimiter: b',',
            relation: "ActivityRecognition".to_string(),
        }
    }
}

/// A loaded dataset together with row accounting.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub dataset: Dataset,
    /// Data rows read from the file
    pub rows_read: usize,
    /// Rows dropped because of the missing-label sentinel
    pub rows_filtered: usize,
}

/// Errors raised while reading or writing CSV data.
#[derive(Debug)]
pub enum LoadError {
    IoError(String),
    CsvError(String),
    MissingColumn(String),
    SchemaError(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::IoError(e) => write!(f, "IO error: {e}"),
            LoadError::CsvError(e) => write!(f, "CSV error: {e}"),
            LoadError::MissingColumn(name) => write!(f, "Missing column: {name}"),
            LoadError::SchemaError(e) => write!(f, "Schema error: {e}"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<csv::Error> for LoadError {
    fn from(e: csv::Error) -> Self {
        if e.is_io_error() {
            LoadError::IoError(e.to_string())
        } else {
            LoadError::CsvError(e.to_string())
        }
    }
}

/// Load a CSV file from disk.
pub fn load_csv(path: &Path, options: &CsvOptions) -> Result<LoadOutcome, LoadError> {
    let file = std::fs::File::open(path)
        .map_err(|e| LoadError::IoError(format!("{}: {e}", path.display())))?;
    read_csv(file, options)
}

/// Read CSV data from any reader.
pub fn read_csv<R: Read>(reader: R, options: &CsvOptions) -> Result<LoadOutcome, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let label_column = headers
        .iter()
        .position(|h| *h == options.label)
        .ok_or_else(|| LoadError::MissingColumn(options.label.clone()))?;

    let mut rows_read = 0;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows_read += 1;
        let label = record.get(label_column).unwrap_or_default();
        if options.missing_label.as_deref() == Some(label) {
            continue;
        }
        rows.push(record);
    }
    let rows_filtered = rows_read - rows.len();

    let column_kinds: Vec<AttributeKind> = (0..headers.len())
        .map(|column| {
            if column != label_column && is_numeric_column(&rows, column) {
                AttributeKind::Numeric
            } else {
                AttributeKind::Categorical(distinct_values(&rows, column))
            }
        })
        .collect();

    let attributes: Vec<Attribute> = headers
        .iter()
        .zip(&column_kinds)
        .enumerate()
        .filter(|(column, _)| *column != label_column)
        .map(|(_, (name, kind))| Attribute {
            name: name.clone(),
            kind: kind.clone(),
        })
        .collect();
    let class = Attribute {
        name: headers[label_column].clone(),
        kind: column_kinds[label_column].clone(),
    };

    let schema = Schema::new(options.relation.clone(), attributes, class)
        .map_err(|e| LoadError::SchemaError(e.to_string()))?;
    let schema = Arc::new(schema);

    let mut dataset = Dataset::with_capacity(Arc::clone(&schema), rows.len());
    for (line, record) in rows.iter().enumerate() {
        let mut values = Vec::with_capacity(headers.len() - 1);
        let mut label = 0;

        for (column, kind) in column_kinds.iter().enumerate() {
            let raw = record.get(column).unwrap_or_default();
            let encoded = match kind {
                AttributeKind::Numeric => raw.parse::<f64>().map_err(|_| {
                    LoadError::CsvError(format!("row {}: '{raw}' is not numeric", line + 1))
                })?,
                AttributeKind::Categorical(legal) => {
                    legal.iter().position(|v| v == raw).unwrap_or_default() as f64
                }
            };
            if column == label_column {
                label = encoded as usize;
            } else {
                values.push(encoded);
            }
        }

        dataset
            .push(Instance::new(values, label))
            .map_err(|e| LoadError::SchemaError(e.to_string()))?;
    }

    Ok(LoadOutcome {
        dataset,
        rows_read,
        rows_filtered,
    })
}

/// Save a dataset to a CSV file, writing categorical values by name.
pub fn save_csv(dataset: &Dataset, path: &Path) -> Result<(), LoadError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LoadError::IoError(e.to_string()))?;
    }
    let file = std::fs::File::create(path)
        .map_err(|e| LoadError::IoError(format!("{}: {e}", path.display())))?;
    write_csv(dataset, file)
}

/// Write a dataset as CSV to any writer.
pub fn write_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<(), LoadError> {
    let schema = dataset.schema();
    let mut writer = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = schema.attributes().iter().map(|a| a.name.as_str()).collect();
    header.push(schema.class_attribute().name.as_str());
    writer.write_record(&header)?;

    for instance in dataset {
        let mut record: Vec<String> = schema
            .attributes()
            .iter()
            .zip(instance.values())
            .map(|(attr, &value)| match &attr.kind {
                AttributeKind::Numeric => value.to_string(),
                AttributeKind::Categorical(legal) => legal[value as usize].clone(),
            })
            .collect();
        record.push(
            schema
                .label_name(instance.label())
                .unwrap_or_default()
                .to_string(),
        );
        writer.write_record(&record)?;
    }

    writer
        .flush()
        .map_err(|e| LoadError::IoError(e.to_string()))?;
    Ok(())
}

fn is_numeric_column(rows: &[csv::StringRecord], column: usize) -> bool {
    rows.iter().all(|r| {
        r.get(column)
            .map(|v| v.parse::<f64>().is_ok())
            .unwrap_or(false)
    })
}

fn distinct_values(rows: &[csv::StringRecord], column: usize) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for record in rows {
        let value = record.get(column).unwrap_or_default();
        if !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Index,Arrival_Time,x,y,z,User,Device,gt
0,100,0.5,0.1,9.8,a,nexus4_1,stand
1,110,0.6,0.2,9.7,a,nexus4_1,null
2,120,0.4,0.0,9.9,a,nexus4_2,walk
3,130,0.5,0.1,9.8,a,nexus4_1,stand
";

    #[test]
    fn test_read_filters_missing_labels() {
        let outcome = read_csv(SAMPLE.as_bytes(), &CsvOptions::default()).unwrap();
        assert_eq!(outcome.rows_read, 4);
        assert_eq!(outcome.rows_filtered, 1);
        assert_eq!(outcome.dataset.len(), 3);

        let schema = outcome.dataset.schema();
        assert_eq!(schema.class_values(), &["stand".to_string(), "walk".to_string()]);
        assert_eq!(schema.label_of("null"), None);
    }

    #[test]
    fn test_column_types_inferred() {
        let outcome = read_csv(SAMPLE.as_bytes(), &CsvOptions::default()).unwrap();
        let schema = outcome.dataset.schema();

        assert!(schema.attribute(schema.index_of("x").unwrap()).unwrap().is_numeric());
        let device = schema.attribute(schema.index_of("Device").unwrap()).unwrap();
        assert_eq!(device.values(), &["nexus4_1".to_string(), "nexus4_2".to_string()]);

        let second = outcome.dataset.get(1).unwrap();
        assert_eq!(second.value(schema.index_of("Device").unwrap()), 1.0);
        assert_eq!(schema.label_name(second.label()), Some("walk"));
    }

    #[test]
    fn test_missing_label_column() {
        let options = CsvOptions {
            label: "activity".to_string(),
            ..CsvOptions::default()
        };
        let result = read_csv(SAMPLE.as_bytes(), &options);
        assert!(matches!(result, Err(LoadError::MissingColumn(_))));
    }

    #[test]
    fn test_write_then_read_keeps_labels() {
        let outcome = read_csv(SAMPLE.as_bytes(), &CsvOptions::default()).unwrap();

        let mut buffer = Vec::new();
        write_csv(&outcome.dataset, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("Index,Arrival_Time,x,y,z,User,Device,gt"));
        assert!(text.contains("nexus4_2,walk"));

        let reloaded = read_csv(text.as_bytes(), &CsvOptions::default()).unwrap();
        assert_eq!(reloaded.rows_filtered, 0);
        assert_eq!(reloaded.dataset.class_counts(), vec![2, 1]);
    }
}
