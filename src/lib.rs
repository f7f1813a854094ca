//! An ordered map built on a weak AVL (WAVL) tree.
//!
//! This crate provides [`WavlMap`], an ordered key-value map whose balance
//! is maintained through per-node *rank parities*: every parent/child rank
//! difference is 1 or 2, every leaf has rank 0, and each insertion or
//! removal repairs ranks with at most two rotations. Keys are ordered by a
//! comparator function, so the same key type can back maps with different
//! orders; [`ascending`] and [`descending`] cover the common cases.
//!
//! Three coordinated surfaces are exposed:
//!
//! - the **dictionary API** — `get`/`set`/`insert`/`delete`/`remove`,
//!   iteration in comparator order;
//! - the **cursor API** — [`Cursor`] and [`KeyedCursor`] are `Copy` tokens
//!   addressing a live entry or an insertion slot, supporting neighbour
//!   navigation, positional insertion and in-place deletion. A cursor
//!   whose entry has been removed fails its next operation with
//!   [`TreeError::StaleCursor`] instead of observing a dangling position;
//! - the **range API** — [`Range`] selects a contiguous key interval and
//!   supports iteration, bulk delete and bulk extraction with
//!   single-consumption semantics.
//!
//! # Example
//!
//! ```
//! use wavl_tree::WavlMap;
//!
//! let mut map = WavlMap::new();
//! map.set(1, "one").set(2, "two").set(3, "three");
//!
//! assert_eq!(map.get(&2), Some(&"two"));
//!
//! // Walk via cursors.
//! let first = map.first();
//! assert_eq!(first.key(&map).unwrap(), Some(&1));
//! assert_eq!(first.next(&map).unwrap().key(&map).unwrap(), Some(&2));
//!
//! // Take a slice of the key space.
//! let range = map.range(Some(&2), None, false).unwrap();
//! let keys: Vec<i32> = range.keys(&map).copied().collect();
//! assert_eq!(keys, [2, 3]);
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - only requires `alloc`, no standard library
//!   dependency
//! - **`serde`** (optional) - serializes a map as an array of `[key, value]`
//!   pairs

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod compare;
mod error;
mod raw;

pub mod wavl_map;

pub use compare::{DefaultComparator, ascending, descending};
pub use error::TreeError;
pub use wavl_map::{Cursor, KeyedCursor, Range, WavlMap};
