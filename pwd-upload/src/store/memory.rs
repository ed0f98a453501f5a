//! In-memory [`KvStore`] used by the job tests. Records every call.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use super::{KvStore, StoreError, UploadItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    List { page_size: usize },
    BulkWrite { keys: Vec<String> },
}

#[derive(Default)]
pub(crate) struct MemoryKv {
    entries: RefCell<BTreeMap<String, String>>,
    calls: RefCell<Vec<Call>>,
    fail_list: bool,
    fail_write: bool,
}

impl MemoryKv {
    pub(crate) fn with_keys(keys: &[&str]) -> Self {
        let store = Self::default();
        store
            .entries
            .borrow_mut()
            .extend(keys.iter().map(|key| (key.to_string(), "existing-hash".to_string())));
        store
    }

    pub(crate) fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub(crate) fn failing_write(mut self) -> Self {
        self.fail_write = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn value(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl KvStore for MemoryKv {
    fn list_keys(&self, page_size: usize) -> Result<BTreeSet<String>, StoreError> {
        self.calls.borrow_mut().push(Call::List { page_size });
        if self.fail_list {
            return Err(StoreError::Api("list refused".to_string()));
        }
        Ok(self.entries.borrow().keys().cloned().collect())
    }

    fn bulk_write(&self, items: &[UploadItem]) -> Result<(), StoreError> {
        self.calls.borrow_mut().push(Call::BulkWrite {
            keys: items.iter().map(|item| item.key.clone()).collect(),
        });
        if self.fail_write {
            return Err(StoreError::Api("write refused".to_string()));
        }
        let mut entries = self.entries.borrow_mut();
        for item in items {
            entries.insert(item.key.clone(), item.value.clone());
        }
        Ok(())
    }
}
