//! Lexical search over categorized design datasets: a BM25 inverted index and
//! a category-aware search layer built on top of it.

pub mod dataset;
pub mod index;
pub mod search;
pub mod tokenizer;

pub use dataset::{Dataset, Record};
pub use index::{Bm25Index, Bm25Params, DocId, Document, Hit, TermId};
pub use search::{CategoryHit, CategorySearch, DocRef, SearchOptions};
