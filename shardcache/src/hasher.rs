//! The default key hasher: 64-bit FNV-1a.
//!
//! Byte input is folded with FNV-1a. A key whose first write is a
//! fixed-width integer hashes to that integer's numeric value, so integer keys
//! map onto shards as `key & (shards - 1)`.

use std::hash::{BuildHasher, Hash, Hasher};

/// FNV-1a offset basis.
const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
/// FNV-1a prime.
const PRIME: u64 = 0x0000_0100_0000_01b3;

/// A `BuildHasher` producing [`Fnv64aHasher`]s. Stateless and allocation free.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fnv64a;

impl Fnv64a {
  /// Hashes a single key to its 64-bit digest.
  #[inline]
  pub fn sum64<T: Hash + ?Sized>(&self, key: &T) -> u64 {
    let mut state = self.build_hasher();
    key.hash(&mut state);
    state.finish()
  }
}

impl BuildHasher for Fnv64a {
  type Hasher = Fnv64aHasher;

  #[inline]
  fn build_hasher(&self) -> Self::Hasher {
    Fnv64aHasher::default()
  }
}

#[derive(Debug, Clone)]
pub struct Fnv64aHasher {
  state: u64,
  started: bool,
}

impl Default for Fnv64aHasher {
  fn default() -> Self {
    Self {
      state: OFFSET_BASIS,
      started: false,
    }
  }
}

impl Fnv64aHasher {
  #[inline]
  fn fold(&mut self, bytes: &[u8]) {
    for &byte in bytes {
      self.state ^= byte as u64;
      self.state = self.state.wrapping_mul(PRIME);
    }
  }

  #[inline]
  fn write_integer(&mut self, value: u64) {
    if self.started {
      self.fold(&value.to_le_bytes());
    } else {
      self.state = value;
      self.started = true;
    }
  }
}

impl Hasher for Fnv64aHasher {
  #[inline]
  fn finish(&self) -> u64 {
    self.state
  }

  #[inline]
  fn write(&mut self, bytes: &[u8]) {
    self.started = true;
    self.fold(bytes);
  }

  fn write_u8(&mut self, i: u8) {
    self.write_integer(i as u64);
  }

  fn write_u16(&mut self, i: u16) {
    self.write_integer(i as u64);
  }

  fn write_u32(&mut self, i: u32) {
    self.write_integer(i as u64);
  }

  fn write_u64(&mut self, i: u64) {
    self.write_integer(i);
  }

  fn write_usize(&mut self, i: usize) {
    self.write_integer(i as u64);
  }

  fn write_i8(&mut self, i: i8) {
    self.write_integer(i as u64);
  }

  fn write_i16(&mut self, i: i16) {
    self.write_integer(i as u64);
  }

  fn write_i32(&mut self, i: i32) {
    self.write_integer(i as u64);
  }

  fn write_i64(&mut self, i: i64) {
    self.write_integer(i as u64);
  }

  fn write_isize(&mut self, i: isize) {
    self.write_integer(i as u64);
  }
}
