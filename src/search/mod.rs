//! In-memory retrieval over the context given to the model. The
//! context is split into overlapping chunks, each chunk is embedded
//! once at startup and queries are matched by cosine similarity.

mod embed;
mod index;

pub use embed::{Embedder, FastEmbedder};
pub use index::{ContextIndex, split_chunks};
