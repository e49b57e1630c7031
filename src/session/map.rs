use std::sync::{Arc, Mutex};

use indexmap::IndexMap;

use crate::frame::StreamId;
use crate::stream::StreamPrivate;

/// All live streams, keyed by ID.
///
/// Iteration happens over a snapshot taken under a short lock, so callbacks
/// are free to mutate the map (streams self-remove on terminal transitions).
#[derive(Default)]
pub(crate) struct StreamMap {
    inner: Mutex<IndexMap<StreamId, Arc<dyn StreamPrivate>>>,
}

impl StreamMap {
    pub fn insert(&self, id: StreamId, stream: Arc<dyn StreamPrivate>) {
        self.inner.lock().unwrap().insert(id, stream);
    }

    pub fn get(&self, id: StreamId) -> Option<Arc<dyn StreamPrivate>> {
        self.inner.lock().unwrap().get(&id).cloned()
    }

    pub fn remove(&self, id: StreamId) {
        self.inner.lock().unwrap().swap_remove(&id);
    }

    pub fn snapshot(&self) -> Vec<Arc<dyn StreamPrivate>> {
        self.inner.lock().unwrap().values().cloned().collect()
    }
}
