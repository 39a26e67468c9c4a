use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use std::path::Path;

use crate::errors::StorageError;
use crate::models::{PurchaseRecord, Sweet};

pub type StorageResult<T> = Result<T, StorageError>;

const SESSION_KEY: &[u8] = b"current";
const PURCHASES_KEY: &[u8] = b"purchasedItems";

/// Persisted client state on Sled (the localStorage of this client).
/// Trees:
/// - session: one atomic session record
/// - catalog: local copy of the inventory, keyed by big-endian sweet id
/// - purchases: the `purchasedItems` ledger, newest first
#[derive(Clone)] // Sled handles are cheap to clone and thread-safe
pub struct Storage {
    db: Db,
    session_tree: sled::Tree,
    catalog_tree: sled::Tree,
    purchase_tree: sled::Tree,
}

impl Storage {
    /// Open or create the Sled database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// Throwaway database, removed on drop
    pub fn temporary() -> StorageResult<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> StorageResult<Self> {
        let session_tree = db.open_tree("session")?;
        let catalog_tree = db.open_tree("catalog")?;
        let purchase_tree = db.open_tree("purchases")?;
        Ok(Self {
            db,
            session_tree,
            catalog_tree,
            purchase_tree,
        })
    }

    pub fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        Ok(())
    }

    // --- Session record ---

    pub fn load_session<T: DeserializeOwned>(&self) -> StorageResult<Option<T>> {
        match self.session_tree.get(SESSION_KEY)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Single-key write; readers see either the old or the new record
    pub fn store_session<T: Serialize>(&self, session: &T) -> StorageResult<()> {
        let bytes = serde_json::to_vec(session)?;
        self.session_tree.insert(SESSION_KEY, bytes)?;
        self.session_tree.flush()?;
        Ok(())
    }

    pub fn remove_session(&self) -> StorageResult<()> {
        self.session_tree.remove(SESSION_KEY)?;
        self.session_tree.flush()?;
        Ok(())
    }

    pub fn watch_session(&self) -> sled::Subscriber {
        self.session_tree.watch_prefix(SESSION_KEY)
    }

    // --- Local catalog ---

    pub fn get_sweet(&self, id: u64) -> StorageResult<Option<Sweet>> {
        match self.catalog_tree.get(id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Upsert by id
    pub fn put_sweet(&self, sweet: &Sweet) -> StorageResult<()> {
        let bytes = serde_json::to_vec(sweet)?;
        self.catalog_tree.insert(sweet.id.to_be_bytes(), bytes)?;
        Ok(())
    }

    /// Returns false if the id was not present
    pub fn delete_sweet(&self, id: u64) -> StorageResult<bool> {
        Ok(self.catalog_tree.remove(id.to_be_bytes())?.is_some())
    }

    /// All sweets ordered by id
    pub fn all_sweets(&self) -> StorageResult<Vec<Sweet>> {
        let mut sweets = vec![];
        for item in self.catalog_tree.iter() {
            let (_, value) = item?;
            sweets.push(serde_json::from_slice(&value)?);
        }
        Ok(sweets)
    }

    /// Atomically rewrite one sweet. `f` returns false to leave it unchanged.
    /// Returns the stored sweet after the update, None if the id is unknown.
    pub fn modify_sweet<F>(&self, id: u64, mut f: F) -> StorageResult<Option<Sweet>>
    where
        F: FnMut(&mut Sweet) -> bool,
    {
        let updated = self.catalog_tree.update_and_fetch(id.to_be_bytes(), |old| {
            let bytes = old?;
            let mut sweet: Sweet = match serde_json::from_slice(bytes) {
                Ok(s) => s,
                Err(_) => return Some(bytes.to_vec()),
            };
            if !f(&mut sweet) {
                return Some(bytes.to_vec());
            }
            Some(serde_json::to_vec(&sweet).unwrap_or_else(|_| bytes.to_vec()))
        })?;
        match updated {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Replace the whole local catalog (after a successful remote listing)
    pub fn replace_catalog(&self, sweets: &[Sweet]) -> StorageResult<()> {
        let mut batch = sled::Batch::default();
        for item in self.catalog_tree.iter().keys() {
            batch.remove(item?);
        }
        for sweet in sweets {
            batch.insert(sweet.id.to_be_bytes().to_vec(), serde_json::to_vec(sweet)?);
        }
        self.catalog_tree.apply_batch(batch)?;
        Ok(())
    }

    /// Seed only when the catalog is empty; returns how many were written
    pub fn seed_catalog(&self, sweets: &[Sweet]) -> StorageResult<usize> {
        if !self.catalog_tree.is_empty() {
            return Ok(0);
        }
        for sweet in sweets {
            self.put_sweet(sweet)?;
        }
        Ok(sweets.len())
    }

    pub fn next_sweet_id(&self) -> StorageResult<u64> {
        let last = self.catalog_tree.last()?;
        Ok(match last {
            Some((key, _)) => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&key[..8]);
                let last = u64::from_be_bytes(buf);
                last.checked_add(1).ok_or(StorageError::IdsExhausted(last))?
            }
            None => 1,
        })
    }

    // --- Purchase ledger ---

    pub fn purchases(&self) -> StorageResult<Vec<PurchaseRecord>> {
        match self.purchase_tree.get(PURCHASES_KEY)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(vec![]),
        }
    }

    /// Prepend atomically so concurrent writers never drop each other's records
    pub fn prepend_purchase(&self, record: &PurchaseRecord) -> StorageResult<()> {
        let encoded = serde_json::to_value(record)?;
        self.purchase_tree.fetch_and_update(PURCHASES_KEY, |old| {
            let mut list: Vec<serde_json::Value> = old
                .and_then(|bytes| serde_json::from_slice(bytes).ok())
                .unwrap_or_default();
            list.insert(0, encoded.clone());
            serde_json::to_vec(&list).ok()
        })?;
        self.purchase_tree.flush()?;
        Ok(())
    }
}
