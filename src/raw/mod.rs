mod arena;
mod node;
mod node_id;
mod tree;

pub(crate) use node::Branch;
pub(crate) use node_id::NodeId;
pub(crate) use tree::{RangeKind, RawWavlMap, Slot};
