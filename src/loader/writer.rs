use crate::database::column::ColumnSchema;
use crate::database::literal::LiteralRenderer;
use crate::database::schema::SchemaInference;
use crate::database::sink::Sink;
use crate::error::LoaderError;
use crate::loader::batch::BatchWindows;
use crate::loader::request::LoaderConfig;
use crate::loader::request::WriteRequest;
use crate::spreadsheet::classify::Classifier;
use crate::spreadsheet::sheet::Sheet;
use crate::transliterate::Transliterate;
use std::fmt::Display;
use std::fmt::Formatter;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// Fatal failures of a sheet write. Batches inserted before a failure stay in the table.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("No column schema producible for sheet '{0}'")]
    SchemaEmpty(String),

    #[error("Ensure table '{table}' failed: {source}")]
    TableEnsureFailed { table: String, source: Box<LoaderError> },

    #[error("Truncate table '{table}' failed: {source}")]
    TruncateFailed { table: String, source: Box<LoaderError> },

    #[error("Insert rows {}-{} into '{table}' failed: {source}", .from + 1, .to + 1)]
    BatchInsertFailed {
        table: String,
        /// First row of the failed window (0-based)
        from: usize,
        /// Last row of the failed window (0-based)
        to: usize,
        source: Box<LoaderError>,
    },

    #[error("Write to '{table}' cancelled before row {}", .next_row + 1)]
    Cancelled { table: String, next_row: usize },
}

/// Stages of one sheet write
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WriteStage {
    SchemaResolving,
    TableEnsuring,
    Truncating,
    Batching,
    Done,
}

impl Display for WriteStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WriteStage::SchemaResolving => "schema-resolving",
            WriteStage::TableEnsuring => "table-ensuring",
            WriteStage::Truncating => "truncating",
            WriteStage::Batching => "batching",
            WriteStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Outcome of a completed sheet write.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Qualified target table
    pub table: String,
    pub columns: usize,
    pub rows_written: usize,
    pub batches_written: usize,
    /// Data ended at an absent row before the last requested row
    pub ended_early: bool,
}

/// Writes one sheet into one table: schema, table, optional truncate, then batched inserts.
pub(crate) struct SheetWriter<'a, S: Sink> {
    pub(crate) config: &'a LoaderConfig,
    pub(crate) classifier: &'a Classifier,
    pub(crate) transliterator: &'a dyn Transliterate,
    pub(crate) sink: &'a mut S,
    pub(crate) cancel: Option<&'a AtomicBool>,
}

impl<S: Sink> SheetWriter<'_, S> {
    pub(crate) fn write(&mut self, sheet: &Sheet, request: &WriteRequest) -> Result<WriteSummary, LoaderError> {
        let schema_name = self.config.schema_name.as_str();
        let table = request.table_name.as_str();
        let mut summary = WriteSummary {
            table: format!("{schema_name}.{table}"),
            ..Default::default()
        };

        info!(stage = %WriteStage::SchemaResolving, sheet = %sheet.name, table = %summary.table);
        let columns = self.resolve_schema(sheet, request);
        if columns.is_empty() {
            warn!(sheet = %sheet.name, "no column schema producible");
            Err(WriteError::SchemaEmpty(sheet.name.to_owned()))?
        }
        summary.columns = columns.len();
        info!(sheet = %sheet.name, columns = %columns.definitions(), "schema resolved");

        info!(stage = %WriteStage::TableEnsuring, table = %summary.table);
        self.ensure_table(schema_name, table, &columns)
            .map_err(|error| WriteError::TableEnsureFailed {
                table: summary.table.to_owned(),
                source: Box::new(error),
            })?;

        if self.config.overwrite {
            info!(stage = %WriteStage::Truncating, table = %summary.table);
            self.sink.truncate_table(schema_name, table)
                .map_err(|error| WriteError::TruncateFailed {
                    table: summary.table.to_owned(),
                    source: Box::new(error),
                })?;
        }

        info!(stage = %WriteStage::Batching, table = %summary.table, rows_per_batch = self.config.rows_per_batch);
        self.write_batches(sheet, request, &columns, &mut summary)?;

        info!(
            stage = %WriteStage::Done,
            table = %summary.table,
            rows = summary.rows_written,
            batches = summary.batches_written,
            ended_early = summary.ended_early
        );
        Ok(summary)
    }

    fn resolve_schema(&self, sheet: &Sheet, request: &WriteRequest) -> ColumnSchema {
        let inference = SchemaInference::new(self.classifier, self.transliterator);
        match request.header_row {
            Some(header_row) if request.uses_header() => {
                inference.by_header(sheet, header_row, request.first_data_row, request.columns)
            }
            _ => inference.by_field_names(sheet, request.first_data_row, &request.field_names, request.columns),
        }
    }

    fn ensure_table(&mut self, schema_name: &str, table: &str, columns: &ColumnSchema) -> Result<(), LoaderError> {
        if self.sink.table_exists(schema_name, table)? {
            debug!(schema = schema_name, table, "table exists");
            return Ok(());
        }
        self.sink.create_table(schema_name, table, columns)?;
        info!(schema = schema_name, table, "table created");
        Ok(())
    }

    fn write_batches(
        &mut self,
        sheet: &Sheet,
        request: &WriteRequest,
        columns: &ColumnSchema,
        summary: &mut WriteSummary,
    ) -> Result<(), LoaderError> {
        let Some(sheet_last_row) = sheet.last_row() else {
            return Ok(());
        };
        let last_row = request.last_data_row.map_or(sheet_last_row, |last| last.min(sheet_last_row));
        let renderer = LiteralRenderer::new(self.classifier);
        let field_names = columns.field_names();

        for window in BatchWindows::new(request.first_data_row, last_row, self.config.rows_per_batch) {
            if self.cancel.map(|flag| flag.load(Ordering::SeqCst)).unwrap_or(false) {
                warn!(table = %summary.table, next_row = window.from, "write cancelled");
                Err(WriteError::Cancelled {
                    table: summary.table.to_owned(),
                    next_row: window.from,
                })?
            }

            let mut tuples = Vec::with_capacity(window.width());
            for index in window.indexes() {
                match sheet.row(index) {
                    Some(row) => tuples.push(renderer.render_row(row, columns)),
                    None => {
                        warn!(table = %summary.table, row = index, "absent row, data ends here");
                        summary.ended_early = true;
                        break;
                    }
                }
            }

            if !tuples.is_empty() {
                let to = window.from + tuples.len() - 1;
                let values = tuples.join(", ");
                debug!(table = %summary.table, from = window.from, to, bytes = values.len(), "batch rendered");
                self.sink.insert_rows(&self.config.schema_name, &request.table_name, &field_names, &values)
                    .map_err(|error| WriteError::BatchInsertFailed {
                        table: summary.table.to_owned(),
                        from: window.from,
                        to,
                        source: Box::new(error),
                    })?;
                summary.rows_written += tuples.len();
                summary.batches_written += 1;
                info!(table = %summary.table, from = window.from, to, "batch written");
            }

            if summary.ended_early {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::sink::tests::RecordingSink;
    use crate::loader::request::RowSelection;
    use crate::spreadsheet::cell::Cell;
    use crate::spreadsheet::cell::Number;
    use crate::spreadsheet::sheet::Row;
    use crate::transliterate::RussianLatin;
    use pretty_assertions::assert_eq;

    fn purchases() -> Sheet {
        let mut sheet = Sheet::new("purchases");
        sheet.push(0, 0, Cell::Text("code".to_owned()));
        sheet.push(0, 1, Cell::Text("name".to_owned()));
        sheet.push(0, 2, Cell::Text("basis".to_owned()));
        let rows = [
            (Cell::Numeric(Number::new(1.0)), "Acme", true),
            (Cell::Text("N/A".to_owned()), "Widget", false),
            (Cell::Numeric(Number::new(3.0)), "Gadget", true),
            (Cell::Numeric(Number::new(4.0)), "Bolt", false),
            (Cell::Numeric(Number::new(5.0)), "Nut", true),
        ];
        for (index, (code, name, basis)) in rows.into_iter().enumerate() {
            sheet.push(index + 1, 0, code);
            sheet.push(index + 1, 1, Cell::Text(name.to_owned()));
            sheet.push(index + 1, 2, Cell::Boolean(basis));
        }
        sheet
    }

    fn request(rows: RowSelection) -> WriteRequest {
        WriteRequest::new("purchases", "purchases", rows, vec![], None).unwrap()
    }

    fn write(
        sheet: &Sheet,
        request: &WriteRequest,
        config: &LoaderConfig,
        sink: &mut RecordingSink,
        cancel: Option<&AtomicBool>,
    ) -> Result<WriteSummary, LoaderError> {
        let classifier = Classifier::default();
        let mut writer = SheetWriter {
            config,
            classifier: &classifier,
            transliterator: &RussianLatin,
            sink,
            cancel,
        };
        writer.write(sheet, request)
    }

    #[test]
    fn writes_in_batches() {
        let mut sink = RecordingSink::default();
        let config = LoaderConfig::new("public", true, 2).unwrap();
        let rows = RowSelection { header_row: Some(0), first_data_row: 2, last_data_row: Some(5) };

        let summary = write(&purchases(), &request(rows), &config, &mut sink, None).unwrap();

        assert_eq!(summary, WriteSummary {
            table: "public.purchases".to_owned(),
            columns: 3,
            rows_written: 4,
            batches_written: 2,
            ended_early: false,
        });
        assert_eq!(sink.calls, vec![
            "exists public.purchases".to_owned(),
            "CREATE TABLE public.purchases (code TEXT, name TEXT, basis BOOLEAN)".to_owned(),
            "TRUNCATE TABLE public.purchases".to_owned(),
            "INSERT INTO public.purchases (code, name, basis) VALUES ('N/A', 'Widget', 'false'), (NULL, 'Gadget', 'true')".to_owned(),
            "INSERT INTO public.purchases (code, name, basis) VALUES (NULL, 'Bolt', 'false'), (NULL, 'Nut', 'true')".to_owned(),
        ]);
    }

    #[test]
    fn type_mismatch_renders_null() {
        let mut sink = RecordingSink::default();
        let config = LoaderConfig::default();
        let rows = RowSelection { last_data_row: Some(2), ..Default::default() };

        write(&purchases(), &request(rows), &config, &mut sink, None).unwrap();

        assert_eq!(sink.inserts, vec![
            "INSERT INTO public.purchases (code, name, basis) VALUES ('1', 'Acme', 'true'), (NULL, 'Widget', 'false')".to_owned(),
        ]);
        assert!(sink.calls[1].contains("code DOUBLE PRECISION"));
    }

    #[test]
    fn existing_table_is_appended_without_truncate() {
        let mut sink = RecordingSink { tables: vec!["public.purchases".to_owned()], ..Default::default() };
        let config = LoaderConfig::new("public", false, 1000).unwrap();

        let summary = write(&purchases(), &request(RowSelection::default()), &config, &mut sink, None).unwrap();

        assert_eq!(summary.rows_written, 5);
        assert_eq!(sink.calls.len(), 2);
        assert!(sink.calls[1].starts_with("INSERT INTO"));
    }

    #[test]
    fn last_row_is_clamped_to_sheet() {
        let mut sink = RecordingSink::default();
        let config = LoaderConfig::new("public", true, 4).unwrap();
        let rows = RowSelection { last_data_row: Some(99), ..Default::default() };

        let summary = write(&purchases(), &request(rows), &config, &mut sink, None).unwrap();

        assert_eq!((summary.rows_written, summary.batches_written), (5, 2));
    }

    #[test]
    fn absent_row_ends_data() {
        let mut sheet = purchases();
        sheet.push(8, 0, Cell::Numeric(Number::new(8.0)));
        let mut sink = RecordingSink::default();
        let config = LoaderConfig::new("public", true, 3).unwrap();

        let summary = write(&sheet, &request(RowSelection::default()), &config, &mut sink, None).unwrap();

        assert!(summary.ended_early);
        assert_eq!(summary.rows_written, 5);
        assert_eq!(summary.batches_written, 2);
        assert!(sink.inserts[1].ends_with("VALUES ('4', 'Bolt', 'false'), ('5', 'Nut', 'true')"));
    }

    #[test]
    fn empty_row_is_not_absent() {
        let mut sheet = purchases();
        sheet.push_row(6, Row::new());
        let mut sink = RecordingSink::default();

        let summary = write(&sheet, &request(RowSelection::default()), &LoaderConfig::default(), &mut sink, None).unwrap();

        assert!(!summary.ended_early);
        assert_eq!(summary.rows_written, 6);
        assert!(sink.inserts[0].ends_with("(NULL, NULL, NULL)"));
    }

    #[test]
    fn empty_schema_is_fatal() {
        let mut sink = RecordingSink::default();
        let rows = RowSelection { header_row: Some(0), first_data_row: 9, last_data_row: None };

        let error = write(&purchases(), &request(rows), &LoaderConfig::default(), &mut sink, None).err().unwrap();

        assert!(matches!(error, LoaderError::WriteError(WriteError::SchemaEmpty(_))));
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn field_names_wider_range_is_fatal() {
        let mut sink = RecordingSink::default();
        let request = WriteRequest::new(
            "purchases",
            "purchases",
            RowSelection::default(),
            vec!["a".to_owned(), "b".to_owned()],
            crate::database::range::Span::new(0, 2),
        ).unwrap();

        let error = write(&purchases(), &request, &LoaderConfig::default(), &mut sink, None).err().unwrap();

        assert!(matches!(error, LoaderError::WriteError(WriteError::SchemaEmpty(_))));
    }

    #[test]
    fn sink_failures_stop_the_write() {
        let config = LoaderConfig::default();

        let mut sink = RecordingSink { fail_create: true, ..Default::default() };
        let error = write(&purchases(), &request(RowSelection::default()), &config, &mut sink, None).err().unwrap();
        assert!(matches!(error, LoaderError::WriteError(WriteError::TableEnsureFailed { .. })));
        assert_eq!(sink.calls.len(), 2);

        let mut sink = RecordingSink { fail_truncate: true, ..Default::default() };
        let error = write(&purchases(), &request(RowSelection::default()), &config, &mut sink, None).err().unwrap();
        assert!(matches!(error, LoaderError::WriteError(WriteError::TruncateFailed { .. })));
        assert!(sink.inserts.is_empty());
    }

    #[test]
    fn insert_failure_keeps_earlier_batches() {
        let mut sink = RecordingSink { fail_insert: Some(1), ..Default::default() };
        let config = LoaderConfig::new("public", true, 2).unwrap();

        let error = write(&purchases(), &request(RowSelection::default()), &config, &mut sink, None).err().unwrap();

        match error {
            LoaderError::WriteError(WriteError::BatchInsertFailed { from, to, .. }) => assert_eq!((from, to), (3, 4)),
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(sink.inserts.len(), 1);
        assert_eq!(sink.calls.iter().filter(|call| call.starts_with("INSERT")).count(), 2);
    }

    #[test]
    fn cancellation_between_windows() {
        let mut sink = RecordingSink::default();
        let cancel = AtomicBool::new(true);

        let error = write(&purchases(), &request(RowSelection::default()), &LoaderConfig::default(), &mut sink, Some(&cancel))
            .err()
            .unwrap();

        assert!(matches!(error, LoaderError::WriteError(WriteError::Cancelled { next_row: 1, .. })));
        assert!(sink.inserts.is_empty());
        assert_eq!(error.to_string(), "Write to 'public.purchases' cancelled before row 2");
    }
}
