//! Word canonicalization.
//!
//! A *norm* is the lookup key derived from a surface word: punctuation
//! runs collapsed, then uppercased. All chain keys are built from
//! norms; the `case` chain maps a norm back to the literal spellings
//! that produced it.

/// Returns true for characters that count as word characters
/// (alphanumerics and underscore).
fn is_word_char(c: char) -> bool {
	c.is_alphanumeric() || c == '_'
}

/// Canonicalizes a surface word into its norm.
///
/// Each maximal run of two or more consecutive non-word characters is
/// collapsed to the run's final character, then the result is
/// uppercased. Pure and idempotent: `normalize(normalize(s)) ==
/// normalize(s)` for any `s`.
pub fn normalize(word: &str) -> String {
	let mut out = String::with_capacity(word.len());
	// Only the last character of a pending non-word run survives.
	let mut pending: Option<char> = None;
	for c in word.chars() {
		if is_word_char(c) {
			if let Some(p) = pending.take() {
				out.push(p);
			}
			out.push(c);
		} else {
			pending = Some(c);
		}
	}
	if let Some(p) = pending {
		out.push(p);
	}
	out.to_uppercase()
}

/// Strips every non-word character from a norm.
///
/// Used only to widen keyword matching: a prompt norm and a stored norm
/// that differ only in punctuation share a supernorm.
pub fn supernorm(norm: &str) -> String {
	norm.chars().filter(|c| is_word_char(*c)).collect()
}

/// Default tokenizer: split on whitespace and drop anything that looks
/// like a URL (contains "://").
///
/// This is a policy hook: callers wanting different tokenization can
/// split the line themselves and feed the words to
/// [`Chatter::learn_words`](crate::model::chatter::Chatter::learn_words).
pub fn tokenize(line: &str) -> Vec<String> {
	line.split_whitespace()
		.filter(|token| !token.contains("://"))
		.map(str::to_owned)
		.collect()
}
