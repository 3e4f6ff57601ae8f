use rand::Rng;

use crate::error::ChatterError;
use crate::model::chain::Chain;
use crate::model::links::Token;
use crate::model::normalize::normalize;

/// Follows one chain from a two-norm context until a phrase boundary.
///
/// The same walk serves both directions: the forward chain only ever
/// stores [`Token::End`] and the backward chain only [`Token::Start`],
/// so stopping on any boundary is correct for either.
///
/// Termination relies on the learning invariant that every learned
/// phrase is boundary-bracketed at both ends: any state reachable from
/// a model-produced seed has a path to a boundary.
pub(crate) struct SentenceWalker<'a> {
	chain: &'a Chain,
}

impl<'a> SentenceWalker<'a> {
	pub fn new(chain: &'a Chain) -> Self {
		Self { chain }
	}

	/// Walks from the state `"norm_a norm_b"`, collecting literal words
	/// until a boundary is drawn. Each produced word is normalized into
	/// the trailing two-norm window.
	///
	/// # Errors
	/// `NotFound` if the walk reaches a state that was never observed;
	/// cannot happen when the starting pair came from the model's own
	/// seed selection.
	pub fn walk<R: Rng>(
		&self,
		rng: &mut R,
		norm_a: &str,
		norm_b: &str,
	) -> Result<Vec<String>, ChatterError> {
		let mut words = Vec::new();
		let mut a = norm_a.to_owned();
		let mut b = norm_b.to_owned();

		loop {
			let state = format!("{a} {b}");
			match self.chain.find_next(&state, rng)? {
				Token::Word(word) => {
					let norm = normalize(&word);
					words.push(word);
					// Slide the window: (a, b) -> (b, norm of the new word).
					a = std::mem::replace(&mut b, norm);
				}
				Token::Start | Token::End => break,
			}
		}

		Ok(words)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::MemoryStore;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn forward_chain_for(words: &[&str]) -> Chain {
		// Mirrors the fore-chain indexing of learn: pair -> word two
		// ahead, or End at the tail.
		let mut chain = Chain::new(Box::new(MemoryStore::new()));
		let norms: Vec<String> = words.iter().map(|w| normalize(w)).collect();
		for i in 0..words.len() - 1 {
			let state = format!("{} {}", norms[i], norms[i + 1]);
			let successor = if i + 2 < words.len() {
				Token::Word(words[i + 2].to_owned())
			} else {
				Token::End
			};
			chain.observe(&state, successor).unwrap();
		}
		chain
	}

	#[test]
	fn walk_follows_a_single_phrase_to_its_end() {
		let chain = forward_chain_for(&["the", "quick", "fox", "jumps"]);
		let mut rng = StdRng::seed_from_u64(3);
		let words = SentenceWalker::new(&chain).walk(&mut rng, "THE", "QUICK").unwrap();
		assert_eq!(words, vec!["fox", "jumps"]);
	}

	#[test]
	fn walk_from_the_tail_pair_is_empty() {
		let chain = forward_chain_for(&["the", "quick", "fox", "jumps"]);
		let mut rng = StdRng::seed_from_u64(3);
		let words = SentenceWalker::new(&chain).walk(&mut rng, "FOX", "JUMPS").unwrap();
		assert!(words.is_empty());
	}

	#[test]
	fn walk_from_unknown_context_propagates_not_found() {
		let chain = forward_chain_for(&["the", "quick", "fox", "jumps"]);
		let mut rng = StdRng::seed_from_u64(3);
		assert!(SentenceWalker::new(&chain).walk(&mut rng, "NO", "WHERE").is_err());
	}
}
