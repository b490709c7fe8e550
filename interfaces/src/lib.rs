pub mod defs;
pub mod empty;

pub use defs::{ChannelMeta, PostRecord, RawEntry, SourceSpec};
