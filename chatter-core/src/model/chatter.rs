use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::SeedableRng;
use rand::prelude::IteratorRandom;
use rand::rngs::StdRng;
use tracing::debug;

use crate::error::ChatterError;
use crate::model::chain::Chain;
use crate::model::links::{Token, pick_weighted};
use crate::model::normalize::{normalize, supernorm, tokenize};
use crate::model::walker::SentenceWalker;
use crate::store::WriteMode;

/// Persistent Markov chat model over four transition chains.
///
/// # Responsibilities
/// - Learn word-transition statistics line by line (`learn`)
/// - Pick a keyword from a prompt and anchor a seed pair on it
/// - Generate a full sentence around a seed pair by walking the
///   forward and backward chains (`generate`, `respond`)
///
/// # Chains
/// - `fore`: "NORM1 NORM2" -> the word two positions ahead (or end)
/// - `back`: "NORM2 NORM1" -> the word before the pair (or start)
/// - `case`: "NORM" -> literal spellings that produced the norm
/// - `seed`: "NORM" -> literal words that followed the norm
///
/// All four live in one model directory, one store file each, created
/// on open if absent. One open handle assumes exclusive access to that
/// directory; opening it from two places at once is undefined behavior.
///
/// Every random draw comes from the model's own RNG, injected through
/// [`Chatter::open_with`], so seeded runs are reproducible.
pub struct Chatter {
	fore: Chain,
	back: Chain,
	case: Chain,
	seed: Chain,
	rng: StdRng,
}

impl Chatter {
	/// Opens (creating if needed) the model stored in `dir`, with
	/// buffered writes and an OS-seeded RNG.
	pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, ChatterError> {
		Self::open_with(dir, WriteMode::Buffered, StdRng::from_os_rng())
	}

	/// Opens the model with an explicit write mode and RNG.
	///
	/// Pass a seeded `StdRng` for deterministic generation (tests);
	/// pass `WriteMode::WriteThrough` to persist every observation as
	/// it happens instead of waiting for `flush`.
	pub fn open_with<P: AsRef<Path>>(
		dir: P,
		mode: WriteMode,
		rng: StdRng,
	) -> Result<Self, ChatterError> {
		let dir = dir.as_ref();
		fs::create_dir_all(dir)?;
		Ok(Self {
			fore: Chain::open(dir.join("fore.dat"), mode)?,
			back: Chain::open(dir.join("back.dat"), mode)?,
			case: Chain::open(dir.join("case.dat"), mode)?,
			seed: Chain::open(dir.join("seed.dat"), mode)?,
			rng,
		})
	}

	/// Learns one line of text using the default tokenizer.
	///
	/// Lines with fewer than two usable words are a silent no-op:
	/// learning needs at least a bigram.
	pub fn learn(&mut self, line: &str) -> Result<(), ChatterError> {
		self.learn_words(&tokenize(line))
	}

	/// Learns an already-tokenized word sequence.
	///
	/// This is the hook for callers that want their own tokenization
	/// policy; `learn` is exactly `learn_words(tokenize(line))`.
	///
	/// # Behavior
	/// For every consecutive norm pair the forward chain records the
	/// word two positions ahead (or the end boundary at the tail) and
	/// the backward chain, keyed by the reversed pair, the word just
	/// before it (or the start boundary at the head). Every norm except
	/// the line's last also records its literal spelling (`case`) and
	/// the word that followed it (`seed`). The final word is excluded
	/// on purpose so generation can never be seeded from a
	/// phrase-terminal word.
	pub fn learn_words(&mut self, words: &[String]) -> Result<(), ChatterError> {
		if words.len() < 2 {
			return Ok(());
		}
		let norms: Vec<String> = words.iter().map(|w| normalize(w)).collect();
		let n = words.len();

		for i in 0..n - 1 {
			let fore_state = format!("{} {}", norms[i], norms[i + 1]);
			let fore_succ = if i + 2 < n {
				Token::Word(words[i + 2].clone())
			} else {
				Token::End
			};
			self.fore.observe(&fore_state, fore_succ)?;

			let back_state = format!("{} {}", norms[i + 1], norms[i]);
			let back_succ = if i == 0 {
				Token::Start
			} else {
				Token::Word(words[i - 1].clone())
			};
			self.back.observe(&back_state, back_succ)?;

			self.case.observe(&norms[i], Token::Word(words[i].clone()))?;
			self.seed.observe(&norms[i], Token::Word(words[i + 1].clone()))?;
		}

		debug!(words = n, "learned line");
		Ok(())
	}

	/// Picks the norm to anchor a response on, biased toward rarer
	/// (more distinguishing) words: each qualifying norm is weighted by
	/// the reciprocal of its observation count.
	///
	/// A prompt norm qualifies if it was ever learned; one that was not
	/// is widened through its supernorm, matching any stored norm that
	/// differs only in punctuation. Returns `None` when nothing in the
	/// prompt is known — the caller falls back to a uniform draw over
	/// all known norms.
	fn keyword(&mut self, norms: &[String]) -> Result<Option<String>, ChatterError> {
		let mut candidates: Vec<(String, f64)> = Vec::new();
		// Supernorm -> stored norms, built only if some prompt norm
		// misses a direct match.
		let mut widened: Option<HashMap<String, Vec<String>>> = None;

		for norm in norms {
			let count = self.case.count(norm)?;
			if count > 0 {
				candidates.push((norm.clone(), 1.0 / count as f64));
				continue;
			}

			let stripped = supernorm(norm);
			if stripped.is_empty() {
				continue;
			}
			let index = widened.get_or_insert_with(|| {
				let mut index: HashMap<String, Vec<String>> = HashMap::new();
				for state in self.case.states() {
					let key = supernorm(&state);
					if !key.is_empty() {
						index.entry(key).or_default().push(state);
					}
				}
				index
			});
			if let Some(matches) = index.get(&stripped) {
				for stored in matches {
					let count = self.case.count(stored)?;
					if count > 0 {
						candidates.push((stored.clone(), 1.0 / count as f64));
					}
				}
			}
		}

		if candidates.is_empty() {
			return Ok(None);
		}
		Ok(Some(pick_weighted(&mut self.rng, &candidates).to_owned()))
	}

	/// Synthesizes a two-word seed from a known norm: a literal
	/// spelling of it, then a word that historically followed it.
	///
	/// # Errors
	/// `NotFound` if `norm` was never observed; callers only reach this
	/// with norms vouched for by `keyword` or the uniform fallback.
	fn seed_pair(&mut self, norm: &str) -> Result<(String, String), ChatterError> {
		// Should not panic: case and seed store only literal words.
		let word1 = self
			.case
			.find_next(norm, &mut self.rng)?
			.into_word()
			.expect("case chain holds only literal words");
		let word2 = self
			.seed
			.find_next(norm, &mut self.rng)?
			.into_word()
			.expect("seed chain holds only literal words");
		Ok((word1, word2))
	}

	/// Generates a full sentence containing the given seed pair.
	///
	/// Walks the forward chain from the pair's norms until the end
	/// boundary and the backward chain from the reversed norms until
	/// the start boundary; the sentence is the reversed backward buffer,
	/// the seed pair, then the forward buffer, space-joined.
	///
	/// Terminates for any pair actually produced by this model's seed
	/// selection, because every learned phrase is boundary-bracketed at
	/// both ends.
	pub fn generate(&mut self, word1: &str, word2: &str) -> Result<String, ChatterError> {
		let norm1 = normalize(word1);
		let norm2 = normalize(word2);

		let forward = SentenceWalker::new(&self.fore).walk(&mut self.rng, &norm1, &norm2)?;
		let backward = SentenceWalker::new(&self.back).walk(&mut self.rng, &norm2, &norm1)?;

		let mut sentence: Vec<String> = backward.into_iter().rev().collect();
		sentence.push(word1.to_owned());
		sentence.push(word2.to_owned());
		sentence.extend(forward);
		Ok(sentence.join(" "))
	}

	/// Produces a sentence steered toward the prompt's vocabulary.
	///
	/// # Errors
	/// `EmptyModel` if nothing has ever been learned. `NotFound` cannot
	/// surface through this path on a well-formed model: the seed norm
	/// always comes from `keyword` or from the known-states fallback.
	pub fn respond(&mut self, line: &str) -> Result<String, ChatterError> {
		let norms: Vec<String> = tokenize(line).iter().map(|w| normalize(w)).collect();

		let norm = match self.keyword(&norms)? {
			Some(norm) => norm,
			None => self
				.case
				.states()
				.into_iter()
				.choose(&mut self.rng)
				.ok_or(ChatterError::EmptyModel)?,
		};
		debug!(%norm, "anchoring response");

		let (word1, word2) = self.seed_pair(&norm)?;
		self.generate(&word1, &word2)
	}

	/// Persists all four chains.
	pub fn flush(&mut self) -> Result<(), ChatterError> {
		self.fore.flush()?;
		self.back.flush()?;
		self.case.flush()?;
		self.seed.flush()
	}

	/// Flushes and releases the model. Consumes the handle, so a closed
	/// model cannot be used again.
	pub fn close(self) -> Result<(), ChatterError> {
		self.fore.close()?;
		self.back.close()?;
		self.case.close()?;
		self.seed.close()
	}

	/// Total observation count for a norm in the `case` chain; how many
	/// times the word was learned in a non-terminal position.
	pub fn times_seen(&self, norm: &str) -> Result<u64, ChatterError> {
		self.case.count(norm)
	}
}
