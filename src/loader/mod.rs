//! # Loader
//!
//! Writes sheets of a loaded workbook into tables of a relational sink.
//!
//! Each [`WriteRequest`] goes through the same stages: infer the column schema from one sampled
//! row, make sure the table exists, optionally truncate it, then insert the data rows in
//! batches. The first failure stops the request; batches already inserted are kept.

pub mod batch;
pub mod properties;
pub mod request;
pub mod writer;

use crate::database::sink::Sink;
use crate::error::LoaderError;
use crate::loader::request::LoaderConfig;
use crate::loader::request::WriteRequest;
use crate::loader::writer::SheetWriter;
use crate::loader::writer::WriteError;
use crate::loader::writer::WriteSummary;
use crate::spreadsheet::classify::Classifier;
use crate::spreadsheet::Workbook;
use crate::transliterate::RussianLatin;
use crate::transliterate::Transliterate;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// Owns a workbook and a sink for the duration of a load.
pub struct Loader<S: Sink> {
    config: LoaderConfig,
    workbook: Workbook,
    sink: S,
    classifier: Classifier,
    transliterator: Arc<dyn Transliterate>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<S: Sink> Loader<S> {
    pub fn new(workbook: Workbook, sink: S, config: LoaderConfig) -> Self {
        Loader {
            config,
            workbook,
            sink,
            classifier: Classifier::default(),
            transliterator: Arc::new(RussianLatin),
            cancel: None,
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_transliterator(mut self, transliterator: Arc<dyn Transliterate>) -> Self {
        self.transliterator = transliterator;
        self
    }

    /// Sets a flag that, once raised, stops a write before its next batch.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn transliterator(&self) -> &dyn Transliterate {
        self.transliterator.as_ref()
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Writes one sheet into its table.
    pub fn write(&mut self, request: &WriteRequest) -> Result<WriteSummary, LoaderError> {
        let sheet = self.workbook
            .sheet(&request.sheet_name)
            .ok_or_else(|| WriteError::SheetNotFound(request.sheet_name.to_owned()))?;
        let mut writer = SheetWriter {
            config: &self.config,
            classifier: &self.classifier,
            transliterator: self.transliterator.as_ref(),
            sink: &mut self.sink,
            cancel: self.cancel.as_deref(),
        };
        writer.write(sheet, request)
    }

    /// Writes requests in order, stopping at the first failure.
    pub fn write_all(&mut self, requests: &[WriteRequest]) -> Result<Vec<WriteSummary>, LoaderError> {
        let mut summaries = Vec::with_capacity(requests.len());
        for request in requests {
            summaries.push(self.write(request)?);
        }
        info!(
            tables = summaries.len(),
            rows = summaries.iter().map(|summary| summary.rows_written).sum::<usize>(),
            "load complete"
        );
        Ok(summaries)
    }
}
