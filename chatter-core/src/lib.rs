//! Persistent Markov-chain chat library.
//!
//! Learns word-transition statistics from lines of text and generates
//! novel sentences that share vocabulary with a prompt. The model is
//! built from four persistent transition chains (forward, backward,
//! case recovery, and seeding) walked in both directions from a
//! two-word seed.
//!
//! The model is single-threaded and single-writer: one open handle
//! assumes exclusive access to its model directory.

/// Model error type.
pub mod error;

/// Markov chains, normalization, and the learn/respond model.
pub mod model;

/// Storage collaborator: the key-value store trait and its file-backed
/// and in-memory implementations.
pub mod store;
