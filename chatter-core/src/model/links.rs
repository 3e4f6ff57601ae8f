use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A value stored in a chain: either a literal surface word or one of
/// the two phrase boundaries.
///
/// The boundaries are distinct variants rather than magic strings, so
/// user text can never collide with them no matter what it contains.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Token {
	/// A literal word, case and punctuation preserved.
	Word(String),
	/// Start-of-phrase boundary; stored only by the backward chain.
	Start,
	/// End-of-phrase boundary; stored only by the forward chain.
	End,
}

impl Token {
	/// Returns the literal word, or `None` for a boundary.
	pub fn into_word(self) -> Option<String> {
		match self {
			Token::Word(w) => Some(w),
			_ => None,
		}
	}
}

/// The successor set of one chain state.
///
/// Conceptually a node in a Markov chain: outgoing edges to successor
/// tokens, weighted by how many times each transition was observed.
///
/// ## Responsibilities
/// - Accumulate transition occurrences during learning
/// - Select a successor using weighted random sampling
/// - Drop transitions whose weight falls below 1
///
/// ## Invariants
/// - Every stored weight is >= 1
/// - Iteration order is deterministic (`BTreeMap`), so sampling with a
///   seeded RNG is reproducible
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Links {
	/// Outgoing transitions indexed by successor token.
	/// Example: { Word("the") => 42, End => 3 }
	transitions: BTreeMap<Token, u64>,
}

impl Links {
	/// Sum of all transition weights.
	pub fn total(&self) -> u64 {
		self.transitions.values().sum()
	}

	/// Adjusts the weight of a transition by `delta`, creating it if
	/// absent. A resulting weight below 1 removes the transition
	/// entirely; `delta == 0` is a no-op.
	pub fn bump(&mut self, successor: Token, delta: i64) {
		if delta == 0 {
			return;
		}
		let current = self.transitions.get(&successor).copied().unwrap_or(0) as i64;
		let next = current + delta;
		if next < 1 {
			self.transitions.remove(&successor);
		} else {
			self.transitions.insert(successor, next as u64);
		}
	}

	/// Removes a transition unconditionally, whatever its weight.
	pub fn remove(&mut self, successor: &Token) {
		self.transitions.remove(successor);
	}

	/// Selects a successor using weighted random sampling: the
	/// probability of each token is proportional to its weight.
	///
	/// Draws a uniform integer in `[0, total)` and walks the cumulative
	/// weights. Returns `None` if the set is empty.
	pub fn choose<R: Rng>(&self, rng: &mut R) -> Option<Token> {
		let total = self.total();
		if total == 0 {
			return None;
		}

		let mut r = rng.random_range(0..total);
		for (successor, weight) in &self.transitions {
			if r < *weight {
				return Some(successor.clone());
			}
			r -= weight;
		}
		// Unreachable: r < total and the weights sum to total.
		None
	}
}

/// Selects one item from a float-weighted set, with probability
/// proportional to weight. Used for keyword ranking, where weights are
/// reciprocal counts rather than integers.
///
/// # Panics
/// Panics if `choices` is empty or the weights do not sum to a positive
/// value. Callers guarantee non-emptiness; violating that is a
/// programming error, not a runtime condition.
pub(crate) fn pick_weighted<'a, R: Rng>(rng: &mut R, choices: &'a [(String, f64)]) -> &'a str {
	let total: f64 = choices.iter().map(|(_, w)| w).sum();
	assert!(total > 0.0, "weighted choice over empty or non-positive weights");

	let r = rng.random_range(0.0..total);
	let mut upto = 0.0;
	for (item, weight) in choices {
		upto += weight;
		if upto >= r {
			return item;
		}
	}
	// Floating-point edge: r landed exactly on the accumulated total.
	&choices[choices.len() - 1].0
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn bump_creates_increments_and_removes() {
		let mut links = Links::default();
		links.bump(Token::Word("the".into()), 1);
		links.bump(Token::Word("the".into()), 1);
		links.bump(Token::End, 1);
		assert_eq!(links.total(), 3);

		links.bump(Token::Word("the".into()), -2);
		assert_eq!(links.total(), 1);

		links.bump(Token::End, 0);
		assert_eq!(links.total(), 1);
	}

	#[test]
	fn choose_on_empty_is_none() {
		let links = Links::default();
		let mut rng = StdRng::seed_from_u64(1);
		assert!(links.choose(&mut rng).is_none());
	}

	#[test]
	fn choose_single_successor_is_certain() {
		let mut links = Links::default();
		links.bump(Token::Word("only".into()), 5);
		let mut rng = StdRng::seed_from_u64(1);
		for _ in 0..20 {
			assert_eq!(links.choose(&mut rng), Some(Token::Word("only".into())));
		}
	}

	#[test]
	fn choose_tracks_empirical_distribution() {
		let mut links = Links::default();
		links.bump(Token::Word("a".into()), 3);
		links.bump(Token::Word("b".into()), 1);

		let mut rng = StdRng::seed_from_u64(42);
		let trials = 40_000;
		let mut a_hits = 0usize;
		for _ in 0..trials {
			if links.choose(&mut rng) == Some(Token::Word("a".into())) {
				a_hits += 1;
			}
		}

		// Expected 0.75 of trials; allow a generous tolerance.
		let ratio = a_hits as f64 / trials as f64;
		assert!((ratio - 0.75).abs() < 0.02, "observed ratio {ratio}");
	}

	#[test]
	fn pick_weighted_prefers_heavier_items() {
		let choices = vec![("rare".to_owned(), 1.0), ("common".to_owned(), 0.01)];
		let mut rng = StdRng::seed_from_u64(7);
		let mut rare_hits = 0usize;
		for _ in 0..1_000 {
			if pick_weighted(&mut rng, &choices) == "rare" {
				rare_hits += 1;
			}
		}
		assert!(rare_hits > 950, "rare picked {rare_hits} times");
	}

	#[test]
	#[should_panic]
	fn pick_weighted_rejects_empty_input() {
		let mut rng = StdRng::seed_from_u64(1);
		pick_weighted(&mut rng, &[]);
	}
}
