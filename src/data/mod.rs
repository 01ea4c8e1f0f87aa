pub mod bridge;
pub mod encoder;

pub use bridge::{BatchPlan, MemoryWindow, chunks, stream_chunk};
pub use encoder::{EncodedDataset, LabeledDataset, decode_block};
