//! Schema inference engine

use std::collections::HashSet;
use std::io::Read;

use super::classify;
use super::config::InferenceConfig;
use super::error::InferenceError;
use super::types::{ColumnGuess, ColumnType, InferredSchema};
use crate::source::{SourceReference, prepare_reader};

/// Slack for comparing match fractions against the threshold
const THRESHOLD_EPSILON: f64 = 1e-9;

/// Per-column observations over the sample
#[derive(Debug, Default, Clone)]
struct ColumnStats {
    non_empty: usize,
    numbers: usize,
    booleans: usize,
    dates: usize,
    /// Non-empty cells matching no specific type
    unmatched: usize,
    examples: Vec<String>,
}

impl ColumnStats {
    fn observe(&mut self, value: &str, max_examples: usize) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        self.non_empty += 1;

        let is_number = classify::matches_type(value, ColumnType::Number);
        let is_boolean = classify::matches_type(value, ColumnType::Boolean);
        let is_date = classify::matches_type(value, ColumnType::Date);
        self.numbers += is_number as usize;
        self.booleans += is_boolean as usize;
        self.dates += is_date as usize;
        if !(is_number || is_boolean || is_date) {
            self.unmatched += 1;
        }

        if self.examples.len() < max_examples && !self.examples.iter().any(|e| e == value) {
            self.examples.push(value.to_string());
        }
    }

    fn matches(&self, column_type: ColumnType) -> usize {
        match column_type {
            ColumnType::Number => self.numbers,
            ColumnType::Boolean => self.booleans,
            ColumnType::Date => self.dates,
            ColumnType::String => self.unmatched,
        }
    }

    /// Pick the most specific type whose match fraction reaches the threshold
    fn resolve(&self, threshold: f64) -> (ColumnType, f64) {
        if self.non_empty == 0 {
            return (ColumnType::String, 0.0);
        }
        let total = self.non_empty as f64;
        for column_type in ColumnType::SPECIFIC {
            let fraction = self.matches(column_type) as f64 / total;
            if fraction + THRESHOLD_EPSILON >= threshold {
                return (column_type, fraction);
            }
        }
        (ColumnType::String, self.unmatched as f64 / total)
    }
}

/// Schema inference engine
///
/// Reads at most `sample_size` data rows from a delimited source and guesses a
/// type for every column. Inference never mutates the source and returns the
/// same result for the same bytes.
#[derive(Debug, Clone, Default)]
pub struct SchemaInferrer {
    config: InferenceConfig,
}

impl SchemaInferrer {
    /// Create a new schema inferrer with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new schema inferrer with custom configuration
    pub fn with_config(config: InferenceConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Open a source and infer its schema
    ///
    /// URL sources are fetched with a blocking client; call from a blocking context.
    pub fn infer(&self, source: &SourceReference) -> Result<InferredSchema, InferenceError> {
        let _span = tracing::info_span!(
            "infer_schema",
            kind = %source.kind,
            location = %source.location
        )
        .entered();

        let reader = source.open(self.config.fetch_timeout())?;
        self.infer_reader(reader)
    }

    /// Infer a schema from any byte stream
    pub fn infer_reader<R: Read>(&self, reader: R) -> Result<InferredSchema, InferenceError> {
        self.config
            .validate()
            .map_err(InferenceError::InvalidConfig)?;

        let (buffered, delimiter) = prepare_reader(reader, self.config.delimiter_byte())
            .map_err(|e| InferenceError::Read {
                row: 0,
                reason: e.to_string(),
            })?;

        // Same width rule as the import: rows wider or narrower than the first
        // record are malformed
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(false)
            .delimiter(delimiter)
            .from_reader(buffered);

        let header = if self.config.has_headers {
            let mut record = csv::ByteRecord::new();
            match rdr.read_byte_record(&mut record) {
                Ok(true) => Some(
                    record
                        .iter()
                        .map(|f| String::from_utf8_lossy(f).into_owned())
                        .collect::<Vec<_>>(),
                ),
                Ok(false) => return Err(InferenceError::EmptySource),
                Err(e) => {
                    return Err(InferenceError::Read {
                        row: 0,
                        reason: e.to_string(),
                    });
                }
            }
        } else {
            None
        };

        let mut stats: Vec<ColumnStats> = Vec::new();
        let mut sampled = 0usize;
        let mut skipped = 0usize;
        let mut record = csv::StringRecord::new();

        // Bound on rows read, good or bad
        while sampled + skipped < self.config.sample_size {
            match rdr.read_record(&mut record) {
                Ok(true) => {
                    if stats.len() < record.len() {
                        stats.resize_with(record.len(), ColumnStats::default);
                    }
                    for (i, value) in record.iter().enumerate() {
                        stats[i].observe(value, self.config.max_examples);
                    }
                    sampled += 1;
                }
                Ok(false) => break,
                Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                    return Err(InferenceError::Read {
                        row: (sampled + skipped + 1) as u64,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unparsable sample row");
                    skipped += 1;
                }
            }
        }

        if sampled == 0 {
            return Err(InferenceError::EmptySource);
        }

        let width = stats.len().max(header.as_ref().map_or(0, Vec::len));
        stats.resize_with(width, ColumnStats::default);
        let names = column_names(header.as_deref().unwrap_or_default(), width);

        let columns: Vec<ColumnGuess> = names
            .into_iter()
            .zip(stats)
            .map(|(name, stats)| {
                let (column_type, confidence) =
                    stats.resolve(self.config.type_confidence_threshold);
                ColumnGuess {
                    name,
                    column_type,
                    sample_values: stats.examples,
                    confidence,
                }
            })
            .collect();

        tracing::info!(
            columns = columns.len(),
            sampled_rows = sampled,
            skipped_rows = skipped,
            delimiter = %(delimiter as char).escape_default(),
            "Inferred schema"
        );

        Ok(InferredSchema {
            columns,
            sampled_rows: sampled,
            skipped_rows: skipped,
            delimiter: delimiter as char,
        })
    }
}

/// Build unique column names from a header row
///
/// Blank cells and missing header cells get `column_N` (1-based); repeated names
/// get `_2`, `_3`, ... suffixes.
fn column_names(header: &[String], width: usize) -> Vec<String> {
    let mut used = HashSet::new();
    let mut names = Vec::with_capacity(width);

    for i in 0..width {
        let raw = header.get(i).map(|h| {
            let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
            h.trim().to_string()
        });
        let base = match raw {
            Some(name) if !name.is_empty() => name,
            _ => format!("column_{}", i + 1),
        };

        let mut name = base.clone();
        let mut suffix = 2;
        while used.contains(&name) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        used.insert(name.clone());
        names.push(name);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn infer(data: &str) -> InferredSchema {
        SchemaInferrer::new().infer_reader(data.as_bytes()).unwrap()
    }

    /// Serves `data` once, then fails every later read
    struct FailAfter {
        data: Option<Vec<u8>>,
    }

    impl Read for FailAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.take() {
                Some(data) => {
                    assert!(data.len() <= buf.len());
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
                None => Err(io::Error::other("read past sample bound")),
            }
        }
    }

    #[test]
    fn test_infer_basic_types() {
        let schema = infer(
            "name,amount,active,joined\n\
             A,10,true,2024-01-15\n\
             B,20.5,no,2024-02-01\n",
        );

        assert_eq!(schema.sampled_rows, 2);
        assert_eq!(schema.delimiter, ',');
        assert_eq!(
            schema.column_names(),
            vec!["name", "amount", "active", "joined"]
        );

        let types: Vec<_> = schema.columns.iter().map(|c| c.column_type).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::String,
                ColumnType::Number,
                ColumnType::Boolean,
                ColumnType::Date
            ]
        );
        for column in &schema.columns {
            assert_eq!(column.confidence, 1.0);
        }
        assert_eq!(schema.column("amount").unwrap().sample_values, vec!["10", "20.5"]);
    }

    #[test]
    fn test_empty_cells_do_not_disqualify() {
        let schema = infer("amount\n10\n\n20\n \n");
        let amount = schema.column("amount").unwrap();
        assert_eq!(amount.column_type, ColumnType::Number);
        assert_eq!(amount.confidence, 1.0);
    }

    #[test]
    fn test_mixed_column_falls_back_to_string() {
        let schema = infer("v\n1\n2\nthree\nfour\n");
        let v = schema.column("v").unwrap();
        assert_eq!(v.column_type, ColumnType::String);
        assert_eq!(v.confidence, 0.5);
    }

    #[test]
    fn test_threshold_accepts_mostly_numeric() {
        let config = InferenceConfig::builder()
            .type_confidence_threshold(0.75)
            .build();
        let schema = SchemaInferrer::with_config(config)
            .infer_reader("v\n1\n2\n3\nn/a\n".as_bytes())
            .unwrap();
        let v = schema.column("v").unwrap();
        assert_eq!(v.column_type, ColumnType::Number);
        assert_eq!(v.confidence, 0.75);
    }

    #[test]
    fn test_all_empty_column() {
        let schema = infer("a,b\n1,\n2,\n");
        let b = schema.column("b").unwrap();
        assert_eq!(b.column_type, ColumnType::String);
        assert_eq!(b.confidence, 0.0);
        assert!(b.sample_values.is_empty());
    }

    #[test]
    fn test_header_placeholders_and_duplicates() {
        let schema = infer("id,,id, name \n1,2,3,4\n");
        assert_eq!(
            schema.column_names(),
            vec!["id", "column_2", "id_2", "name"]
        );
    }

    #[test]
    fn test_ragged_rows_are_skipped() {
        let schema = infer("id,name\n1,a\n2,b,extra\n3\n4,d\n");
        assert_eq!(schema.column_names(), vec!["id", "name"]);
        assert_eq!(schema.sampled_rows, 2);
        assert_eq!(schema.skipped_rows, 2);

        // Every row wider than the header leaves nothing to sample
        let err = SchemaInferrer::new()
            .infer_reader("id,name\n1,a,x\n2,b,y\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, InferenceError::EmptySource));
    }

    #[test]
    fn test_no_headers_uses_placeholders() {
        let config = InferenceConfig::builder().has_headers(false).build();
        let schema = SchemaInferrer::with_config(config)
            .infer_reader("1,x\n2,y\n".as_bytes())
            .unwrap();
        assert_eq!(schema.sampled_rows, 2);
        assert_eq!(schema.column_names(), vec!["column_1", "column_2"]);
        assert_eq!(schema.columns[0].column_type, ColumnType::Number);
    }

    #[test]
    fn test_bom_is_stripped_from_first_header() {
        let schema = infer("\u{feff}name,amount\nA,1\n");
        assert_eq!(schema.columns[0].name, "name");
    }

    #[test]
    fn test_sniffed_delimiter() {
        let schema = infer("name;amount\nA;10\n");
        assert_eq!(schema.delimiter, ';');
        assert_eq!(schema.columns.len(), 2);
        assert_eq!(schema.columns[1].column_type, ColumnType::Number);
    }

    #[test]
    fn test_max_examples_are_distinct() {
        let config = InferenceConfig::builder().max_examples(2).build();
        let schema = SchemaInferrer::with_config(config)
            .infer_reader("v\na\na\nb\nc\n".as_bytes())
            .unwrap();
        assert_eq!(schema.columns[0].sample_values, vec!["a", "b"]);
    }

    #[test]
    fn test_header_only_is_empty_source() {
        let err = SchemaInferrer::new()
            .infer_reader("a,b\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, InferenceError::EmptySource));

        let err = SchemaInferrer::new().infer_reader(&b""[..]).unwrap_err();
        assert!(matches!(err, InferenceError::EmptySource));
    }

    #[test]
    fn test_sample_is_bounded() {
        let mut data = String::from("n\n");
        for i in 0..1000 {
            data.push_str(&format!("{i}\n"));
        }
        data.push_str("not a number\n");

        let config = InferenceConfig::builder().sample_size(100).build();
        let schema = SchemaInferrer::with_config(config)
            .infer_reader(data.as_bytes())
            .unwrap();
        assert_eq!(schema.sampled_rows, 100);
        assert_eq!(schema.columns[0].column_type, ColumnType::Number);
    }

    #[test]
    fn test_never_reads_past_sample_bound() {
        let mut data = String::from("n\n");
        for i in 0..10 {
            data.push_str(&format!("{i}\n"));
        }

        let config = InferenceConfig::builder().sample_size(5).build();
        let reader = FailAfter {
            data: Some(data.clone().into_bytes()),
        };
        let schema = SchemaInferrer::with_config(config)
            .infer_reader(reader)
            .unwrap();
        assert_eq!(schema.sampled_rows, 5);

        // A larger sample has to read on and hits the failure
        let reader = FailAfter {
            data: Some(data.into_bytes()),
        };
        let err = SchemaInferrer::new().infer_reader(reader).unwrap_err();
        assert!(err.is_unreadable());
    }

    #[test]
    fn test_invalid_utf8_row_is_skipped() {
        let mut data = b"name,amount\nA,10\n".to_vec();
        data.extend_from_slice(b"\xff\xfe,20\n");
        data.extend_from_slice(b"C,30\n");

        let schema = SchemaInferrer::new().infer_reader(&data[..]).unwrap();
        assert_eq!(schema.sampled_rows, 2);
        assert_eq!(schema.skipped_rows, 1);
        assert_eq!(schema.columns[1].column_type, ColumnType::Number);
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let source = SourceReference::file("/no/such/file.csv", "file.csv");
        let err = SchemaInferrer::new().infer(&source).unwrap_err();
        assert!(err.is_unreadable());
    }

    #[test]
    fn test_infer_is_idempotent() {
        let data = "a,b\n1,x\n2,y\n";
        assert_eq!(infer(data), infer(data));
    }
}
