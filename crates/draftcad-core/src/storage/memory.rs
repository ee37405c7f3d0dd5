//! In-memory storage.

use super::{BoxFuture, Storage, StorageError, StorageResult, serialize};
use crate::document::CadDocument;
use std::collections::HashMap;
use std::sync::RwLock;

/// Keeps serialized documents in a map. Useful for tests and scratch sessions.
#[derive(Default)]
pub struct MemoryStorage {
    documents: RwLock<HashMap<String, String>>,
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, document: &CadDocument) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let json = serialize(document);
        Box::pin(async move {
            let json = json?;
            self.documents.write().map_err(lock_error)?.insert(id, json);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<CadDocument>> {
        let id = id.to_string();
        Box::pin(async move {
            let docs = self.documents.read().map_err(lock_error)?;
            let json = docs.get(&id).ok_or_else(|| StorageError::NotFound(id.clone()))?;
            Ok(CadDocument::from_json(json)?)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            self.documents.write().map_err(lock_error)?.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let docs = self.documents.read().map_err(lock_error)?;
            let mut ids: Vec<String> = docs.keys().cloned().collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.documents.read().map_err(lock_error)?.contains_key(&id)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{CadObject, ShapeData};
    use crate::storage::block_on;
    use kurbo::Point;

    fn drawing() -> CadDocument {
        let mut doc = CadDocument::new();
        let layer = doc.current_layer_id();
        doc.add_object(CadObject::new(layer, ShapeData::Circle { center: Point::new(2.0, 3.0), radius: 4.0 }));
        doc
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        let doc = drawing();

        block_on(storage.save("plan", &doc)).unwrap();
        let loaded = block_on(storage.load("plan")).unwrap();

        assert_eq!(loaded.id, doc.id);
        assert_eq!(loaded.object_count(), 1);
        assert!(!loaded.can_undo());
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_exists_and_delete() {
        let storage = MemoryStorage::new();
        let doc = CadDocument::new();

        assert!(!block_on(storage.exists("plan")).unwrap());
        block_on(storage.save("plan", &doc)).unwrap();
        assert!(block_on(storage.exists("plan")).unwrap());
        block_on(storage.delete("plan")).unwrap();
        assert!(!block_on(storage.exists("plan")).unwrap());
    }

    #[test]
    fn test_list_sorted() {
        let storage = MemoryStorage::new();
        let doc = CadDocument::new();
        block_on(storage.save("b", &doc)).unwrap();
        block_on(storage.save("a", &doc)).unwrap();
        assert_eq!(block_on(storage.list()).unwrap(), vec!["a".to_string(), "b".to_string()]);
    }
}
