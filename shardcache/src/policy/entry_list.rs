use crate::time;

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use ahash::{HashMap, HashMapExt};
use generational_arena::{Arena, Index};

/// One resident entry.
#[derive(Debug)]
pub struct Node<K, V> {
  pub key: K,
  pub value: Arc<V>,
  /// Absolute deadline since the cache epoch. `None` never expires.
  pub expires_at: Option<Duration>,
  next: Option<Index>,
  prev: Option<Index>,
}

impl<K, V> Node<K, V> {
  #[inline]
  pub fn is_expired(&self, now: Duration) -> bool {
    time::is_expired(self.expires_at, now)
  }
}

/// An arena-backed doubly-linked list of entries with an O(1) key index.
///
/// The head is the most recently pushed (or moved) entry, the tail the oldest.
/// Links are arena indices, so removed slots are recycled by the arena and no
/// node ever holds a reference to another.
#[derive(Debug)]
pub struct EntryList<K, V> {
  nodes: Arena<Node<K, V>>,
  lookup: HashMap<K, Index>,
  head: Option<Index>,
  tail: Option<Index>,
}

impl<K: Eq + Hash + Clone, V> Default for EntryList<K, V> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K: Eq + Hash + Clone, V> EntryList<K, V> {
  pub fn new() -> Self {
    Self::with_capacity(0)
  }

  /// Pre-sizes the arena and index for `capacity` entries.
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      nodes: Arena::with_capacity(capacity),
      lookup: HashMap::with_capacity(capacity),
      head: None,
      tail: None,
    }
  }

  // Detaches a node from its neighbours. Arena and index are left alone.
  fn unlink(&mut self, index: Index) {
    let (prev, next) = {
      let node = &self.nodes[index];
      (node.prev, node.next)
    };

    match prev {
      Some(prev_idx) => self.nodes[prev_idx].next = next,
      None => self.head = next,
    }

    match next {
      Some(next_idx) => self.nodes[next_idx].prev = prev,
      None => self.tail = prev,
    }
  }

  // Links an arena node in as the new head.
  fn link_front(&mut self, index: Index) {
    let old_head = self.head;
    self.nodes[index].next = old_head;
    self.nodes[index].prev = None;
    self.head = Some(index);

    match old_head {
      Some(old) => self.nodes[old].prev = Some(index),
      None => self.tail = Some(index),
    }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.lookup.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.lookup.is_empty()
  }

  #[inline]
  pub fn contains_key(&self, key: &K) -> bool {
    self.lookup.contains_key(key)
  }

  pub fn get(&self, key: &K) -> Option<&Node<K, V>> {
    self.lookup.get(key).map(|&index| &self.nodes[index])
  }

  /// The oldest entry, if any.
  pub fn back(&self) -> Option<&Node<K, V>> {
    self.tail.map(|index| &self.nodes[index])
  }

  /// Inserts a new entry at the head. If `key` is already present its value
  /// and expiry are replaced, it is moved to the head, and the old value is
  /// returned.
  pub fn push_front(&mut self, key: K, value: Arc<V>, expires_at: Option<Duration>) -> Option<Arc<V>> {
    if let Some(&index) = self.lookup.get(&key) {
      let node = &mut self.nodes[index];
      node.expires_at = expires_at;
      let old = std::mem::replace(&mut node.value, value);
      if self.head != Some(index) {
        self.unlink(index);
        self.link_front(index);
      }
      return Some(old);
    }

    let index = self.nodes.insert(Node {
      key: key.clone(),
      value,
      expires_at,
      next: None,
      prev: None,
    });
    self.lookup.insert(key, index);
    self.link_front(index);
    None
  }

  /// Replaces value and expiry of an existing entry without moving it.
  pub fn update(&mut self, key: &K, value: Arc<V>, expires_at: Option<Duration>) -> Option<Arc<V>> {
    let index = *self.lookup.get(key)?;
    let node = &mut self.nodes[index];
    node.expires_at = expires_at;
    Some(std::mem::replace(&mut node.value, value))
  }

  /// Sets a new deadline on an existing entry.
  pub fn set_expiry(&mut self, key: &K, expires_at: Option<Duration>) -> bool {
    match self.lookup.get(key) {
      Some(&index) => {
        self.nodes[index].expires_at = expires_at;
        true
      }
      None => false,
    }
  }

  pub fn move_to_front(&mut self, key: &K) {
    if let Some(&index) = self.lookup.get(key) {
      if self.head != Some(index) {
        self.unlink(index);
        self.link_front(index);
      }
    }
  }

  /// Detaches and returns the oldest entry.
  pub fn pop_back(&mut self) -> Option<Node<K, V>> {
    let tail = self.tail?;
    let key = self.nodes[tail].key.clone();
    self.remove(&key)
  }

  pub fn remove(&mut self, key: &K) -> Option<Node<K, V>> {
    let index = self.lookup.remove(key)?;
    self.unlink(index);
    self.nodes.remove(index)
  }

  /// Keys ordered from oldest (tail) to newest (head).
  pub fn keys_oldest_first(&self) -> Vec<K> {
    let mut keys = Vec::with_capacity(self.len());
    let mut current = self.tail;
    while let Some(index) = current {
      let node = &self.nodes[index];
      keys.push(node.key.clone());
      current = node.prev;
    }
    keys
  }

  /// Keys of every entry whose deadline is at or before `now`, oldest first.
  pub fn expired_keys(&self, now: Duration) -> Vec<K> {
    let mut keys = Vec::new();
    let mut current = self.tail;
    while let Some(index) = current {
      let node = &self.nodes[index];
      if node.is_expired(now) {
        keys.push(node.key.clone());
      }
      current = node.prev;
    }
    keys
  }

  /// Empties the list, returning every entry oldest first.
  pub fn drain(&mut self) -> Vec<Node<K, V>> {
    let mut drained = Vec::with_capacity(self.len());
    while let Some(node) = self.pop_back() {
      drained.push(node);
    }
    self.clear();
    drained
  }

  pub fn clear(&mut self) {
    self.nodes.clear();
    self.lookup.clear();
    self.head = None;
    self.tail = None;
  }

  // Head to tail, for tests.
  #[cfg(test)]
  pub(crate) fn keys_newest_first(&self) -> Vec<K> {
    let mut keys = Vec::new();
    let mut current = self.head;
    while let Some(index) = current {
      keys.push(self.nodes[index].key.clone());
      current = self.nodes[index].next;
    }
    keys
  }
}
