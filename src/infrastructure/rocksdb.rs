use crate::domain::ports::ErrorStore;
use crate::error::{Result, ShopError};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family for storing payment errors.
pub const CF_PAYMENT_ERRORS: &str = "payment_errors";

/// A persistent error store implementation using RocksDB.
///
/// Payment errors are kept in their own Column Family, keyed by the UTF-8
/// bytes of the error key. They survive restarts until the order page
/// displays and removes them.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBErrorStore {
    db: Arc<DB>,
}

impl RocksDBErrorStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "payment_errors" column family exists.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_errors = ColumnFamilyDescriptor::new(CF_PAYMENT_ERRORS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_errors])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn errors_cf(&self) -> Result<&ColumnFamily> {
        self.db.cf_handle(CF_PAYMENT_ERRORS).ok_or_else(|| {
            ShopError::InternalError(Box::new(std::io::Error::other(
                "Payment errors column family not found",
            )))
        })
    }
}

#[async_trait]
impl ErrorStore for RocksDBErrorStore {
    async fn store(&self, key: &str, error: &str) -> Result<()> {
        let cf = self.errors_cf()?;
        self.db.put_cf(cf, key.as_bytes(), error.as_bytes())?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let cf = self.errors_cf()?;
        match self.db.get_cf(cf, key.as_bytes())? {
            Some(bytes) => {
                let error = String::from_utf8(bytes).map_err(|e| {
                    ShopError::InternalError(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("Stored payment error is not UTF-8: {}", e),
                    )))
                })?;
                Ok(Some(error))
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let cf = self.errors_cf()?;
        self.db.delete_cf(cf, key.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBErrorStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_PAYMENT_ERRORS).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_error_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBErrorStore::open(dir.path()).unwrap();

        store.store("payment_error_7", "Wrong PIN").await.unwrap();
        assert_eq!(
            store.get("payment_error_7").await.unwrap().as_deref(),
            Some("Wrong PIN")
        );
        assert!(store.get("payment_error_8").await.unwrap().is_none());

        store.remove("payment_error_7").await.unwrap();
        assert!(store.get("payment_error_7").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rocksdb_errors_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDBErrorStore::open(dir.path()).unwrap();
            store.store("payment_error_9", "Expired").await.unwrap();
        }

        let store = RocksDBErrorStore::open(dir.path()).unwrap();
        assert_eq!(
            store.get("payment_error_9").await.unwrap().as_deref(),
            Some("Expired")
        );
    }
}
