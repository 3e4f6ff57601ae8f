use std::path::Path;

use rand::Rng;

use crate::error::ChatterError;
use crate::model::links::{Links, Token};
use crate::store::{FileStore, Store, WriteMode};

/// A persistent transition table: state key -> weighted successor set.
///
/// States are strings (a single norm or a space-joined norm pair);
/// values are [`Links`]. The table never mutates a stored value in
/// place: every mutation reads the full successor set, updates a local
/// copy, and writes it back, so it stays correct against stores without
/// in-place update semantics.
///
/// # Responsibilities
/// - Accumulate observation counts (`observe` / `observe_weighted`)
/// - Weighted-random successor lookup (`find_next`)
/// - Weight totals and state enumeration for keyword ranking
///
/// # Invariants
/// - Stored weights are always >= 1; a decrement below 1 removes the
///   successor entirely
/// - A state with an empty successor set behaves like an absent state
///   for `find_next` and `count`
pub struct Chain {
	store: Box<dyn Store>,
}

impl Chain {
	/// Wraps an already-open store.
	pub fn new(store: Box<dyn Store>) -> Self {
		Self { store }
	}

	/// Opens a file-backed chain at `path` (created on first flush if
	/// absent).
	pub fn open<P: AsRef<Path>>(path: P, mode: WriteMode) -> Result<Self, ChatterError> {
		Ok(Self::new(Box::new(FileStore::open(path, mode)?)))
	}

	/// Reads and decodes the successor set for `state`, or `None` if
	/// the state has never been observed.
	fn read(&self, state: &str) -> Result<Option<Links>, ChatterError> {
		match self.store.get(state) {
			Some(bytes) => Ok(Some(postcard::from_bytes(&bytes)?)),
			None => Ok(None),
		}
	}

	fn write(&mut self, state: &str, links: &Links) -> Result<(), ChatterError> {
		self.store.set(state, postcard::to_stdvec(links)?)
	}

	/// Records one occurrence of `state -> successor`.
	pub fn observe(&mut self, state: &str, successor: Token) -> Result<(), ChatterError> {
		self.observe_weighted(state, successor, 1)
	}

	/// Adjusts the weight of `state -> successor` by a signed `delta`,
	/// creating the entry if absent. A resulting weight below 1 removes
	/// the successor; `delta == 0` is a no-op.
	///
	/// Negative deltas are advanced, decay-style functionality; the
	/// ordinary learn workflow only ever increments.
	pub fn observe_weighted(
		&mut self,
		state: &str,
		successor: Token,
		delta: i64,
	) -> Result<(), ChatterError> {
		if delta == 0 {
			return Ok(());
		}
		let mut links = self.read(state)?.unwrap_or_default();
		links.bump(successor, delta);
		self.write(state, &links)
	}

	/// Removes the named successors from `state` unconditionally.
	/// A state that was never observed is a no-op, not an error.
	pub fn forget(&mut self, state: &str, successors: &[Token]) -> Result<(), ChatterError> {
		let Some(mut links) = self.read(state)? else {
			return Ok(());
		};
		for successor in successors {
			links.remove(successor);
		}
		self.write(state, &links)
	}

	/// Selects a successor of `state` by weighted random sampling.
	///
	/// # Errors
	/// `NotFound` if the state has never been observed or its successor
	/// set is empty.
	pub fn find_next<R: Rng>(&self, state: &str, rng: &mut R) -> Result<Token, ChatterError> {
		self.read(state)?
			.and_then(|links| links.choose(rng))
			.ok_or_else(|| ChatterError::NotFound { state: state.to_owned() })
	}

	/// Sum of all successor weights for `state`; 0 if absent.
	pub fn count(&self, state: &str) -> Result<u64, ChatterError> {
		Ok(self.read(state)?.map(|links| links.total()).unwrap_or(0))
	}

	/// All known state keys. Iteration order carries no meaning.
	pub fn states(&self) -> Vec<String> {
		self.store.keys()
	}

	pub fn flush(&mut self) -> Result<(), ChatterError> {
		self.store.flush()
	}

	pub fn close(self) -> Result<(), ChatterError> {
		self.store.close()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::MemoryStore;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn chain() -> Chain {
		Chain::new(Box::new(MemoryStore::new()))
	}

	#[test]
	fn count_accumulates_observations() {
		let mut c = chain();
		for _ in 0..5 {
			c.observe("THE QUICK", Token::Word("fox".into())).unwrap();
		}
		assert_eq!(c.count("THE QUICK").unwrap(), 5);
		assert_eq!(c.count("NEVER SEEN").unwrap(), 0);
	}

	#[test]
	fn find_next_on_unknown_state_is_not_found() {
		let c = chain();
		let mut rng = StdRng::seed_from_u64(1);
		match c.find_next("THE QUICK", &mut rng) {
			Err(ChatterError::NotFound { state }) => assert_eq!(state, "THE QUICK"),
			other => panic!("expected NotFound, got {other:?}"),
		}
	}

	#[test]
	fn find_next_returns_the_sole_successor() {
		let mut c = chain();
		c.observe("FOX JUMPS", Token::End).unwrap();
		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(c.find_next("FOX JUMPS", &mut rng).unwrap(), Token::End);
	}

	#[test]
	fn negative_delta_removes_below_one() {
		let mut c = chain();
		c.observe("A B", Token::Word("c".into())).unwrap();
		c.observe("A B", Token::Word("d".into())).unwrap();
		c.observe_weighted("A B", Token::Word("c".into()), -1).unwrap();
		assert_eq!(c.count("A B").unwrap(), 1);

		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(c.find_next("A B", &mut rng).unwrap(), Token::Word("d".into()));
	}

	#[test]
	fn forget_is_unconditional_and_tolerates_absent_states() {
		let mut c = chain();
		c.observe_weighted("A B", Token::Word("c".into()), 10).unwrap();
		c.forget("A B", &[Token::Word("c".into())]).unwrap();
		assert_eq!(c.count("A B").unwrap(), 0);

		// Emptied state now behaves like an absent one.
		let mut rng = StdRng::seed_from_u64(1);
		assert!(c.find_next("A B", &mut rng).is_err());

		c.forget("NEVER SEEN", &[Token::End]).unwrap();
	}

	#[test]
	fn states_lists_known_keys() {
		let mut c = chain();
		c.observe("A B", Token::End).unwrap();
		c.observe("B C", Token::End).unwrap();
		let mut states = c.states();
		states.sort();
		assert_eq!(states, vec!["A B".to_owned(), "B C".to_owned()]);
	}
}
