use thiserror::Error;

/// Errors surfaced by the model and its storage layer.
///
/// `NotFound` and `EmptyModel` are the two conditions callers are
/// expected to match on; the rest wrap I/O and codec failures from the
/// backing stores.
#[derive(Debug, Error)]
pub enum ChatterError {
	/// A chain state was looked up that has never been observed
	/// (or whose successor set is empty). Under normal orchestration
	/// (seeds derived through keyword selection or the known-states
	/// fallback) this never reaches the caller; seeing it at the top
	/// level indicates an invariant breach, not user error.
	#[error("state not found: {state}")]
	NotFound { state: String },

	/// The model has never learned anything, so there is nothing to
	/// respond from. The user-visible "nothing learned yet" condition.
	#[error("model has no learned data")]
	EmptyModel,

	#[error("storage I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("codec error: {0}")]
	Codec(#[from] postcard::Error),
}
