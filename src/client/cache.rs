// Persisted product snapshot for the dashboard client.
//
// One named slot holds the JSON-serialized product collection. Reads are
// best-effort; every successful fetch overwrites the slot wholesale, so the
// cache is always the last known-good snapshot, never a merge.
use anyhow::Result;
use sled::Tree;

use crate::models::product::ProductRecord;

const CACHE_TREE: &str = "client_cache";
const PRODUCTS_SLOT: &str = "products";

#[derive(Clone)]
pub struct ProductCache {
    tree: Tree,
}

impl ProductCache {
    pub fn open(db: &sled::Db) -> Result<Self> {
        Ok(Self {
            tree: db.open_tree(CACHE_TREE)?,
        })
    }

    /// Last cached collection; empty when nothing was ever cached or the
    /// slot cannot be read.
    pub fn snapshot(&self) -> Vec<ProductRecord> {
        self.tree
            .get(PRODUCTS_SLOT)
            .ok()
            .flatten()
            .and_then(|data| serde_json::from_slice(&data).ok())
            .unwrap_or_default()
    }

    pub fn replace_all(&self, products: &[ProductRecord]) -> Result<()> {
        let serialized = serde_json::to_vec(products)?;
        self.tree.insert(PRODUCTS_SLOT, serialized)?;
        self.tree.flush()?;
        Ok(())
    }

    pub fn find(&self, id: &str) -> Option<ProductRecord> {
        self.snapshot().into_iter().find(|p| p.id == id)
    }

    pub fn append(&self, product: &ProductRecord) -> Result<()> {
        let mut products = self.snapshot();
        products.push(product.clone());
        self.replace_all(&products)
    }

    /// Replace the record with the same id; appends when no match exists.
    pub fn upsert(&self, product: &ProductRecord) -> Result<()> {
        let mut products = self.snapshot();
        match products.iter_mut().find(|p| p.id == product.id) {
            Some(slot) => *slot = product.clone(),
            None => products.push(product.clone()),
        }
        self.replace_all(&products)
    }

    /// Removing an absent id is a no-op.
    pub fn remove(&self, id: &str) -> Result<()> {
        let mut products = self.snapshot();
        products.retain(|p| p.id != id);
        self.replace_all(&products)
    }
}
