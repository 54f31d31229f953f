//! Shared configuration tree guarded by a reader/writer lock.

use crate::error::TreeError;
use crate::schema::Schema;
use crate::tree::ConfigNode;
use log::{debug, info};
use parking_lot::{RwLock, RwLockReadGuard};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// The live configuration instance.
///
/// Any number of readers may hold a snapshot at once; a replacement waits for
/// all of them and excludes new readers until the swap completes. Every tree
/// that enters the store has been validated against the schema, so list key
/// tuples are unique.
#[derive(Clone)]
pub struct ConfigStore {
    schema: Arc<Schema>,
    root: Arc<RwLock<ConfigNode>>,
}

impl ConfigStore {
    /// Create a store holding an empty root container.
    pub fn empty(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            root: Arc::new(RwLock::new(ConfigNode::empty())),
        }
    }

    /// Create a store from an already-built tree.
    pub fn new(schema: Arc<Schema>, root: ConfigNode) -> Result<Self, TreeError> {
        root.validate(schema.root(), schema.enums(), "")?;
        Ok(Self {
            schema,
            root: Arc::new(RwLock::new(root)),
        })
    }

    /// Create a store from JSON document bytes.
    pub fn from_document(schema: Arc<Schema>, bytes: &[u8]) -> Result<Self, TreeError> {
        let root = ConfigNode::decode_bytes(schema.root(), bytes, schema.enums(), "")?;
        debug!("initial document decoded (len={})", bytes.len());
        Ok(Self {
            schema,
            root: Arc::new(RwLock::new(root)),
        })
    }

    /// Create a store from a JSON document on disk.
    pub fn load_from_path(schema: Arc<Schema>, path: impl AsRef<Path>) -> Result<Self, TreeError> {
        info!("loading initial document from path: {}", path.as_ref().display());
        let bytes = fs::read(path)?;
        Self::from_document(schema, &bytes)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Shared read snapshot of the tree, held until the guard drops.
    pub fn read(&self) -> RwLockReadGuard<'_, ConfigNode> {
        self.root.read()
    }

    /// Validate and swap in a new tree.
    pub fn replace(&self, root: ConfigNode) -> Result<(), TreeError> {
        root.validate(self.schema.root(), self.schema.enums(), "")?;
        *self.root.write() = root;
        debug!("configuration tree replaced");
        Ok(())
    }

    /// Decode, validate and swap in a new tree from JSON document bytes.
    pub fn replace_document(&self, bytes: &[u8]) -> Result<(), TreeError> {
        let root = ConfigNode::decode_bytes(self.schema.root(), bytes, self.schema.enums(), "")?;
        *self.root.write() = root;
        debug!("configuration tree replaced from document (len={})", bytes.len());
        Ok(())
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore").finish_non_exhaustive()
    }
}
