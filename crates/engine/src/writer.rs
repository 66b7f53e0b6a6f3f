//! Write path

use spanstore_core::{Error, Operation, Result, Span, StorageError};
use std::time::Instant;

use crate::database::Database;
use crate::labels::index_labels;

impl Database {
    /// Index one span
    ///
    /// Encodes the span and stages one sample at its start time under its
    /// label set. The payload store records the span before the commit, so a
    /// failed add or payload write rolls the appender back and leaves no
    /// index entry. Nothing is retried.
    pub fn write_span(&self, span: &Span) -> Result<()> {
        let start = Instant::now();
        match self.write_span_inner(span) {
            Ok(()) => {
                self.observer.span_written(span, start.elapsed());
                Ok(())
            }
            Err(e) => {
                self.observer.operation_failed(Operation::WriteSpan, &e);
                Err(e)
            }
        }
    }

    fn write_span_inner(&self, span: &Span) -> Result<()> {
        let storage = |e: StorageError| Error::storage(Operation::WriteSpan, e);

        let payload = self
            .codec
            .encode(span)
            .map_err(|e| Error::codec(Operation::WriteSpan, e))?;
        let labels = index_labels(span);

        let mut appender = self.tsdb.appender().map_err(storage)?;
        if let Err(e) = appender.add(&labels, span.start_micros(), &payload) {
            appender.rollback();
            return Err(storage(e));
        }
        if let Err(e) = self.payloads.record(span, &payload) {
            appender.rollback();
            return Err(e);
        }
        appender.commit().map_err(storage)
    }
}
