//! Top-level module for the Markov chat model.
//!
//! This crate provides a persistent order-2 Markov sentence generator,
//! including:
//! - Weighted successor sets and boundary tokens (`Links`, `Token`)
//! - Persistent transition tables (`Chain`)
//! - Word canonicalization (`normalize`, `supernorm`, `tokenize`)
//! - Bidirectional sentence walking (`SentenceWalker`)
//! - The learn/respond model itself (`Chatter`)

/// Persistent transition table: state key -> weighted successor set,
/// with incremental observe/forget, weighted lookup, and counts.
pub mod chain;

/// The four-chain Markov model exposing the learn/generate/respond
/// protocol over a model directory.
pub mod chatter;

/// Successor sets with weighted random sampling, and the tagged
/// word/boundary token type.
pub mod links;

/// Word canonicalization: norms, supernorms, and the default tokenizer.
pub mod normalize;

/// Chain-following sentence construction.
///
/// Not exposed; used by `Chatter::generate`.
mod walker;
