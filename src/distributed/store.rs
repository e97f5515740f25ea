//! The addressed store nodes exchange trees and results through.

use crate::constants::ERROR_SLOT_SUFFIX;

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};


/// A key/value store as seen from one node.
///
/// Every key has a home node.
/// Reading a key from another node may leave a local replica behind,
/// which [`KeyValueStore::free`] drops.
pub trait KeyValueStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: Arc<[u8]>);


    /// Returns the value under `key`,
    /// or `None` if it is absent or unreachable right now.
    fn get(&self, key: &str) -> Option<Arc<[u8]>>;


    /// Returns `true` if this node is the home of `key`.
    fn is_home(&self, key: &str) -> bool;


    /// Drop the local replica of a key this node is not home to.
    fn free(&self, key: &str);
}


/// Returns the key a builder node publishes its `index`-th tree under.
#[inline]
pub fn tree_key(prefix: &str, node: usize, index: usize) -> String {
    format!("{prefix}{node}_{index}")
}


/// Returns the key of the result slot of `node`.
#[inline]
pub fn error_key(prefix: &str, node: usize) -> String {
    format!("{prefix}{node}{ERROR_SLOT_SUFFIX}")
}


type Shard = RwLock<HashMap<String, Arc<[u8]>>>;


/// An in-process stand-in for a cluster-wide store.
///
/// Each simulated node owns one shard.
/// A key lives in the shard of the node its hash selects.
#[derive(Debug)]
pub struct InMemoryCloud {
    shards: Vec<Shard>,
}


impl InMemoryCloud {
    /// Construct a cloud of `n_nodes` empty nodes.
    pub fn new(n_nodes: usize) -> Arc<Self> {
        assert!(n_nodes > 0, "a cloud needs at least one node");
        let shards = (0..n_nodes)
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        Arc::new(Self { shards })
    }


    /// Returns the number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.shards.len()
    }


    /// Returns the home node of `key`.
    pub fn home(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }


    /// Returns the number of keys stored in the whole cloud,
    /// replicas excluded.
    pub fn len(&self) -> usize {
        self.shards.iter()
            .map(|shard| read(shard).len())
            .sum()
    }


    /// Returns `true` if the cloud holds no key.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }


    /// Returns the view of the cloud from `node`.
    pub fn node(self: &Arc<Self>, node: usize) -> NodeStore {
        assert!(node < self.n_nodes(), "unknown node {node}");
        NodeStore {
            cloud: Arc::clone(self),
            node,
            replicas: Mutex::new(HashMap::new()),
        }
    }


    /// Returns the view of the cloud from every node, in node order.
    pub fn nodes(self: &Arc<Self>) -> Vec<NodeStore> {
        (0..self.n_nodes()).map(|k| self.node(k)).collect()
    }


    fn shard(&self, key: &str) -> &Shard {
        &self.shards[self.home(key)]
    }
}


/// One node's handle on an [`InMemoryCloud`].
#[derive(Debug)]
pub struct NodeStore {
    cloud: Arc<InMemoryCloud>,
    node: usize,
    replicas: Mutex<HashMap<String, Arc<[u8]>>>,
}


impl NodeStore {
    /// Returns the index of this node.
    pub fn node(&self) -> usize {
        self.node
    }


    /// Returns the number of replicas this node holds.
    pub fn n_replicas(&self) -> usize {
        self.replicas().len()
    }


    fn replicas(&self) -> MutexGuard<'_, HashMap<String, Arc<[u8]>>> {
        self.replicas.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}


impl KeyValueStore for NodeStore {
    fn put(&self, key: &str, value: Arc<[u8]>) {
        write(self.cloud.shard(key)).insert(key.to_string(), value);
        self.replicas().remove(key);
    }


    fn get(&self, key: &str) -> Option<Arc<[u8]>> {
        let value = read(self.cloud.shard(key)).get(key).cloned()?;
        if !self.is_home(key) {
            self.replicas().insert(key.to_string(), Arc::clone(&value));
        }
        Some(value)
    }


    fn is_home(&self, key: &str) -> bool {
        self.cloud.home(key) == self.node
    }


    fn free(&self, key: &str) {
        if !self.is_home(key) {
            self.replicas().remove(key);
        }
    }
}


fn read(shard: &Shard)
    -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<[u8]>>>
{
    shard.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}


fn write(shard: &Shard)
    -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<[u8]>>>
{
    shard.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_01() {
        assert_eq!(tree_key("RF_", 3, 12), "RF_3_12");
        assert_eq!(error_key("RF_", 3), "RF_3_error");
    }

    #[test]
    fn test_put_get_02() {
        let cloud = InMemoryCloud::new(3);
        let nodes = cloud.nodes();
        nodes[0].put("a", Arc::from(vec![1u8, 2, 3]));

        for node in &nodes {
            let res = node.get("a").map(|v| v.to_vec());
            assert_eq!(res, Some(vec![1, 2, 3]));
        }
        assert_eq!(nodes[1].get("b"), None);
        assert_eq!(cloud.len(), 1);
    }

    #[test]
    fn test_free_replica_03() {
        let cloud = InMemoryCloud::new(2);
        let nodes = cloud.nodes();
        let key = "RF_0_0";
        let home = cloud.home(key);
        let away = 1 - home;

        nodes[home].put(key, Arc::from(vec![7u8]));
        nodes[away].get(key).unwrap();
        assert_eq!(nodes[away].n_replicas(), 1);
        assert!(!nodes[away].is_home(key));

        nodes[away].free(key);
        assert_eq!(nodes[away].n_replicas(), 0);
        assert!(nodes[home].get(key).is_some(), "free must keep the home copy");
    }

    #[test]
    fn test_every_key_has_one_home_04() {
        let cloud = InMemoryCloud::new(4);
        let nodes = cloud.nodes();
        for k in 0..32 {
            let key = tree_key("RF_", k % 4, k);
            let homes = nodes.iter().filter(|n| n.is_home(&key)).count();
            assert_eq!(homes, 1, "key {key} has {homes} homes.");
        }
    }
}
