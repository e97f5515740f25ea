use serde::Serialize;

use super::store::{tree_key, KeyValueStore};
use crate::{
    common::Reporter,
    director::BuildObserver,
    Result,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};


/// Publishes every tree a node grows to the shared store,
/// under `{prefix}{node}_{index}` with consecutive indices from `0`.
pub struct TreePublisher {
    store: Arc<dyn KeyValueStore>,
    node: usize,
    prefix: String,
    next: AtomicUsize,
    reporter: Arc<dyn Reporter>,
}


impl TreePublisher {
    /// Construct a publisher for `node`.
    pub fn new<S: ToString>(
        store: Arc<dyn KeyValueStore>,
        node: usize,
        prefix: S,
        reporter: Arc<dyn Reporter>,
    ) -> Self
    {
        Self {
            store,
            node,
            prefix: prefix.to_string(),
            next: AtomicUsize::new(0),
            reporter,
        }
    }


    /// Returns the number of trees published so far.
    pub fn published(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}


impl<T: Serialize> BuildObserver<T> for TreePublisher {
    fn on_tree_built(&self, tree: Arc<T>) -> Result<()> {
        let bytes = serde_json::to_vec(&*tree)?;
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        let key = tree_key(&self.prefix, self.node, index);
        log::trace!("publishing {key} ({} bytes)", bytes.len());
        self.store.put(&key, Arc::from(bytes));
        Ok(())
    }


    fn on_builder_terminated(&self) {
        self.reporter.report(&format!(
            "node {} published {} trees", self.node, self.published()
        ));
    }
}
