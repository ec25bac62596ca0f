//! Key topology resolution.
//!
//! Re-reads the catalog for every event; there is no cache to invalidate
//! when keys change.

use dbmirror_core::{KeyTopology, TableRef};
use dbmirror_log::{CatalogProvider, LogError};
use tracing::debug;

/// Resolves primary-key order and foreign-key columns of a table.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyTopologyResolver;

impl KeyTopologyResolver {
    /// Create a resolver
    pub fn new() -> Self {
        Self
    }

    /// Look up the key topology of `table`.
    ///
    /// Foreign keys are only queried when `with_foreign_keys` is set; otherwise
    /// the returned set is empty. Returns `Ok(None)` when the table has no
    /// primary key.
    pub async fn resolve<C>(
        &self,
        catalog: &mut C,
        table: &TableRef,
        with_foreign_keys: bool,
    ) -> Result<Option<KeyTopology>, LogError>
    where
        C: CatalogProvider + ?Sized,
    {
        let Some(primary_key) = catalog.primary_key(table).await? else {
            debug!(table = %table, "No primary key");
            return Ok(None);
        };

        let foreign_keys = if with_foreign_keys {
            catalog.foreign_key_columns(table).await?
        } else {
            Vec::new()
        };

        debug!(
            table = %table,
            primary_key = ?primary_key,
            foreign_keys = ?foreign_keys,
            "Resolved key topology"
        );

        Ok(Some(KeyTopology::new(primary_key, foreign_keys)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbmirror_core::TableSchema;
    use dbmirror_log::MemoryBackend;

    fn backend() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.register_table(
            TableSchema::new(TableRef::new("shop", "lines"))
                .with_column("order_id")
                .with_column("line")
                .with_column("sku"),
            KeyTopology::new(vec![2, 1], [1, 3]),
        );
        backend.register_table(
            TableSchema::new(TableRef::new("shop", "audit")).with_column("msg"),
            KeyTopology::default(),
        );
        backend
    }

    #[tokio::test]
    async fn test_resolve_keeps_key_order() {
        let backend = backend();
        let mut session = backend.begin();

        let topology = KeyTopologyResolver::new()
            .resolve(&mut session, &TableRef::new("shop", "lines"), true)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(topology.primary_key(), &[2, 1]);
        assert!(topology.is_foreign(1));
        assert!(topology.is_foreign(3));
    }

    #[tokio::test]
    async fn test_foreign_keys_only_on_request() {
        let backend = backend();
        let mut session = backend.begin();

        let topology = KeyTopologyResolver::new()
            .resolve(&mut session, &TableRef::new("shop", "lines"), false)
            .await
            .unwrap()
            .unwrap();

        assert!(topology.foreign_keys().is_empty());
    }

    #[tokio::test]
    async fn test_missing_primary_key_is_none() {
        let backend = backend();
        let mut session = backend.begin();

        let topology = KeyTopologyResolver::new()
            .resolve(&mut session, &TableRef::new("shop", "audit"), true)
            .await
            .unwrap();

        assert!(topology.is_none());
    }

    #[tokio::test]
    async fn test_unknown_table_propagates() {
        let backend = backend();
        let mut session = backend.begin();

        let result = KeyTopologyResolver::new()
            .resolve(&mut session, &TableRef::new("shop", "ghost"), false)
            .await;

        assert!(matches!(result, Err(LogError::UnknownTable(_))));
    }
}
