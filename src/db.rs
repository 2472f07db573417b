// ============================================================================
// src/db.rs - sled-backed document store
// ============================================================================
use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use sled::Db;
use std::sync::Arc;

/// Thin wrapper over sled. Each collection is a tree, each document a
/// JSON-serialized value keyed by its id. Every write is a single atomic
/// document operation followed by a flush.
#[derive(Clone)]
pub struct Database {
    pub db: Arc<Db>,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn insert<T: Serialize>(&self, collection: &str, key: &str, value: &T) -> Result<()> {
        let tree = self.db.open_tree(collection)?;
        let serialized = serde_json::to_vec(value)?;
        tree.insert(key, serialized)?;
        self.db.flush()?;
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, collection: &str, key: &str) -> Result<Option<T>> {
        let tree = self.db.open_tree(collection)?;
        if let Some(data) = tree.get(key)? {
            let value: T = serde_json::from_slice(&data)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    pub fn list<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
        let tree = self.db.open_tree(collection)?;
        let mut items = Vec::new();

        for result in tree.iter() {
            let (_key, value) = result?;
            let item: T = serde_json::from_slice(&value)?;
            items.push(item);
        }

        Ok(items)
    }

    pub fn delete(&self, collection: &str, key: &str) -> Result<bool> {
        let tree = self.db.open_tree(collection)?;
        let existed = tree.remove(key)?.is_some();
        self.db.flush()?;
        Ok(existed)
    }

    pub fn update<T: Serialize>(&self, collection: &str, key: &str, value: &T) -> Result<()> {
        self.insert(collection, key, value)
    }

    pub fn flush(&self) -> Result<usize> {
        Ok(self.db.flush()?)
    }
}
