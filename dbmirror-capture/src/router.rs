//! Row change routing
//!
//! Turns one row-level trigger firing into one pending header plus its
//! payload rows:
//!
//! | Event  | Payloads                                   |
//! |--------|--------------------------------------------|
//! | INSERT | full after-image (`iskey = false`)         |
//! | UPDATE | key before-image (`true`), full after-image |
//! | DELETE | key before-image (`true`)                  |
//!
//! Every payload is encoded before the header is written, so an encoding
//! failure leaves nothing behind. A write failure aborts the event; the
//! caller rolls back the transaction.

use crate::error::{CaptureError, CaptureResult};
use crate::options::CaptureOptions;
use crate::resolver::KeyTopologyResolver;
use dbmirror_core::{
    encode_row, ColumnUsage, CoreError, Operation, Payload, RowImage, TableSchema, TriggerEvent,
};
use dbmirror_log::{CatalogProvider, HeaderId, NewHeader, PendingLogWriter};
use tracing::{debug, info};

// =============================================================================
// Row Change
// =============================================================================

/// One row-level trigger firing as handed over by the host.
#[derive(Debug, Clone, Copy)]
pub struct RowChange<'a> {
    /// Event that fired
    pub event: TriggerEvent,
    /// Column layout of the triggering table
    pub schema: &'a TableSchema,
    /// Row before the change (UPDATE, DELETE)
    pub before: Option<&'a RowImage>,
    /// Row after the change (INSERT, UPDATE)
    pub after: Option<&'a RowImage>,
}

impl<'a> RowChange<'a> {
    /// An INSERT of `row`
    pub fn insert(schema: &'a TableSchema, row: &'a RowImage) -> Self {
        Self {
            event: TriggerEvent::Insert,
            schema,
            before: None,
            after: Some(row),
        }
    }

    /// An UPDATE from `before` to `after`
    pub fn update(schema: &'a TableSchema, before: &'a RowImage, after: &'a RowImage) -> Self {
        Self {
            event: TriggerEvent::Update,
            schema,
            before: Some(before),
            after: Some(after),
        }
    }

    /// A DELETE of `row`
    pub fn delete(schema: &'a TableSchema, row: &'a RowImage) -> Self {
        Self {
            event: TriggerEvent::Delete,
            schema,
            before: Some(row),
            after: None,
        }
    }

    /// The row a trigger hands back to the host: the after-image for
    /// INSERT and UPDATE, the before-image for DELETE.
    pub fn passthrough(&self) -> Option<&'a RowImage> {
        match self.event {
            TriggerEvent::Delete => self.before,
            _ => self.after,
        }
    }

    fn require(
        &self,
        image: Option<&'a RowImage>,
        which: &'static str,
    ) -> CaptureResult<&'a RowImage> {
        image.ok_or_else(|| CaptureError::MissingRowImage {
            event: self.event,
            table: self.schema.table.to_string(),
            image: which,
        })
    }
}

// =============================================================================
// Router
// =============================================================================

/// Records row changes into the pending log.
#[derive(Debug, Clone, Default)]
pub struct ChangeEventRouter {
    options: CaptureOptions,
    resolver: KeyTopologyResolver,
}

impl ChangeEventRouter {
    /// Create a router for one trigger registration
    pub fn new(options: CaptureOptions) -> Self {
        Self {
            options,
            resolver: KeyTopologyResolver::new(),
        }
    }

    /// Create a router from the trigger's argument list
    pub fn from_trigger_args<S: AsRef<str>>(args: &[S]) -> Self {
        Self::new(CaptureOptions::from_trigger_args(args))
    }

    /// Record `change` and return the id of the written header.
    ///
    /// # Errors
    /// - `UnsupportedOperation` for TRUNCATE
    /// - `MissingRowImage` if an image the event needs is absent
    /// - `MissingPrimaryKey` for UPDATE/DELETE on a table without a primary key
    /// - `Catalog`, `Encode` or `LogWrite` from the lower layers
    pub async fn record<S>(
        &self,
        session: &mut S,
        change: &RowChange<'_>,
    ) -> CaptureResult<HeaderId>
    where
        S: CatalogProvider + PendingLogWriter + ?Sized,
    {
        let operation = change
            .event
            .operation()
            .ok_or(CaptureError::UnsupportedOperation(change.event))?;

        debug!(
            table = %change.schema.table,
            event = %change.event,
            verbose = self.options.verbose,
            "Routing row change"
        );

        let payloads = self.encode_payloads(session, operation, change).await?;

        let table_name = change.schema.table.quoted(self.options.qualify_schema);
        let xid = session
            .transaction_id()
            .await
            .map_err(CaptureError::LogWrite)?;

        let header = session
            .write_header(&NewHeader::new(table_name.clone(), operation, xid))
            .await
            .map_err(CaptureError::LogWrite)?;
        debug!(seq_id = %header, table = %table_name, xid, "Header stored");

        for (is_key, payload) in &payloads {
            session
                .write_payload(header, *is_key, payload)
                .await
                .map_err(CaptureError::LogWrite)?;

            debug!(
                seq_id = %header,
                is_key,
                bytes = payload.len(),
                "Payload stored"
            );
        }

        info!(
            seq_id = %header,
            table = %table_name,
            op = %operation,
            xid,
            "Change captured"
        );

        Ok(header)
    }

    /// Record `change` and return the row the trigger should hand back.
    pub async fn on_row_trigger<'r, S>(
        &self,
        session: &mut S,
        change: &RowChange<'r>,
    ) -> CaptureResult<&'r RowImage>
    where
        S: CatalogProvider + PendingLogWriter + ?Sized,
    {
        self.record(session, change).await?;
        let image = if change.event == TriggerEvent::Delete {
            "before"
        } else {
            "after"
        };
        change.require(change.passthrough(), image)
    }

    async fn encode_payloads<S>(
        &self,
        session: &mut S,
        operation: Operation,
        change: &RowChange<'_>,
    ) -> CaptureResult<Vec<(bool, Payload)>>
    where
        S: CatalogProvider + ?Sized,
    {
        let payloads = match operation {
            Operation::Insert => {
                let after = change.require(change.after, "after")?;
                vec![(false, self.encode_full(change.schema, after)?)]
            },
            Operation::Update => {
                let before = change.require(change.before, "before")?;
                let after = change.require(change.after, "after")?;
                let key = self.encode_key(session, change.schema, before).await?;
                vec![(true, key), (false, self.encode_full(change.schema, after)?)]
            },
            Operation::Delete => {
                let before = change.require(change.before, "before")?;
                vec![(true, self.encode_key(session, change.schema, before).await?)]
            },
            Operation::SequenceAdvance => {
                return Err(CaptureError::UnsupportedOperation(change.event));
            },
        };

        Ok(payloads)
    }

    async fn encode_key<S>(
        &self,
        session: &mut S,
        schema: &TableSchema,
        row: &RowImage,
    ) -> CaptureResult<Payload>
    where
        S: CatalogProvider + ?Sized,
    {
        let usage = self.options.key_usage();
        let missing = || CaptureError::MissingPrimaryKey {
            table: schema.table.quoted(self.options.qualify_schema),
        };

        let topology = self
            .resolver
            .resolve(session, &schema.table, usage.needs_foreign_keys())
            .await
            .map_err(CaptureError::Catalog)?
            .ok_or_else(missing)?;

        encode_row(schema, row, usage, Some(&topology)).map_err(|e| match e {
            CoreError::MissingPrimaryKey => missing(),
            other => CaptureError::Encode(other),
        })
    }

    fn encode_full(&self, schema: &TableSchema, row: &RowImage) -> CaptureResult<Payload> {
        Ok(encode_row(schema, row, ColumnUsage::AllColumns, None)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbmirror_core::{KeyTopology, TableRef};
    use dbmirror_log::MemoryBackend;

    fn people() -> TableSchema {
        TableSchema::new(TableRef::new("public", "t"))
            .with_column("id")
            .with_column("name")
    }

    #[test]
    fn test_passthrough_row() {
        let schema = people();
        let old = RowImage::from_values([Some("1"), Some("a")]);
        let new = RowImage::from_values([Some("1"), Some("b")]);

        assert_eq!(RowChange::insert(&schema, &new).passthrough(), Some(&new));
        assert_eq!(RowChange::update(&schema, &old, &new).passthrough(), Some(&new));
        assert_eq!(RowChange::delete(&schema, &old).passthrough(), Some(&old));
    }

    #[tokio::test]
    async fn test_on_row_trigger_returns_row() {
        let schema = people();
        let backend = MemoryBackend::new();
        backend.register_table(schema.clone(), KeyTopology::new(vec![1], []));
        let row = RowImage::from_values([Some("7"), Some("x")]);

        let router = ChangeEventRouter::default();
        let mut session = backend.begin();
        let returned = router
            .on_row_trigger(&mut session, &RowChange::delete(&schema, &row))
            .await
            .unwrap();
        session.commit();

        assert_eq!(returned, &row);
        assert_eq!(backend.header_count(), 1);
    }

    #[tokio::test]
    async fn test_update_without_before_image() {
        let schema = people();
        let backend = MemoryBackend::new();
        backend.register_table(schema.clone(), KeyTopology::new(vec![1], []));
        let row = RowImage::from_values([Some("1"), Some("a")]);

        let change = RowChange {
            event: TriggerEvent::Update,
            schema: &schema,
            before: None,
            after: Some(&row),
        };

        let mut session = backend.begin();
        let result = ChangeEventRouter::default().record(&mut session, &change).await;

        assert!(matches!(
            result,
            Err(CaptureError::MissingRowImage { image: "before", .. })
        ));
        assert_eq!(session.staged(), (0, 0));
    }
}
