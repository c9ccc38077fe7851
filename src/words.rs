//! Word selection: turns abstract symbol sequences into surface words.

use crate::error::{Error, ErrorRepr};

use fxhash::FxHashMap;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

/// Candidate surface words for one grammar terminal.
///
/// Words come out in shuffled round-robin order: the list is reshuffled at
/// the start of every cycle and then drained in order, so within one cycle
/// no word repeats.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct SampleSeq {
    order: Vec<String>,
    pos: usize,
}

impl SampleSeq {
    pub fn new(words: Vec<String>) -> Self {
        SampleSeq {
            order: words,
            pos: 0,
        }
    }

    /// Draws the next word.
    ///
    /// # Panics
    /// Panics if the sequence was constructed with no words. [`Lexicon`]
    /// rejects such entries at load time.
    pub fn next_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &str {
        if self.pos == 0 {
            self.order.shuffle(rng);
        }
        let word = &self.order[self.pos];
        self.pos = (self.pos + 1) % self.order.len();
        word
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl From<Vec<String>> for SampleSeq {
    fn from(words: Vec<String>) -> Self {
        SampleSeq::new(words)
    }
}

/// Word dictionary for all grammar terminals, keyed by symbol name.
///
/// The JSON form is an object of symbol name to non-empty word array:
///
/// ```text
/// { "noun": ["dog", "cat"], "verb": ["runs", "sleeps"] }
/// ```
///
/// The symbols a graph can generate are exactly the keys this dictionary
/// must cover; realizing a symbol with no entry is an error.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct Lexicon {
    words: FxHashMap<String, SampleSeq>,
}

impl Lexicon {
    /// Loads the dictionary from its JSON form.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let lexicon: Lexicon =
            serde_json::from_str(text).map_err(|e| Error(ErrorRepr::Words(e.to_string())))?;
        if let Some(symbol) = lexicon
            .words
            .iter()
            .find_map(|(symbol, seq)| seq.is_empty().then_some(symbol))
        {
            return Err(Error(ErrorRepr::EmptyWordList(symbol.clone())));
        }
        log::debug!("lexicon loaded, {} symbols", lexicon.words.len());
        Ok(lexicon)
    }

    /// Replaces each abstract symbol with that symbol's next surface word.
    pub fn realize_with<R: Rng + ?Sized>(
        &mut self,
        symbols: &[&str],
        rng: &mut R,
    ) -> Result<Vec<String>, Error> {
        symbols
            .iter()
            .map(|&symbol| {
                let seq = self
                    .words
                    .get_mut(symbol)
                    .ok_or_else(|| Error(ErrorRepr::MissingWords(symbol.to_string())))?;
                Ok(seq.next_with(rng).to_string())
            })
            .collect()
    }

    /// As [`Lexicon::realize_with`], drawing from the process RNG.
    pub fn realize(&mut self, symbols: &[&str]) -> Result<Vec<String>, Error> {
        self.realize_with(symbols, &mut rand::rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sample_seq_uses_every_word_once_per_cycle() {
        let mut seq = SampleSeq::new(vec!["a".into(), "b".into(), "c".into()]);
        let mut rng = StdRng::seed_from_u64(5);
        let mut counts: FxHashMap<String, usize> = FxHashMap::default();
        for _ in 0..6 {
            *counts.entry(seq.next_with(&mut rng).to_string()).or_default() += 1;
        }
        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|&n| n == 2));
    }

    #[test]
    fn lexicon_draws_from_the_right_entries() {
        let mut lexicon =
            Lexicon::from_json(r#"{"noun": ["dog", "cat"], "verb": ["runs"]}"#).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let words = lexicon
            .realize_with(&["noun", "verb", "noun"], &mut rng)
            .unwrap();
        assert!(words[0] == "dog" || words[0] == "cat");
        assert_eq!(words[1], "runs");
        // round robin: both nouns are used before either repeats
        assert_ne!(words[0], words[2]);
    }

    #[test]
    fn rejects_malformed_json() {
        let result = Lexicon::from_json("{ not json").unwrap_err();
        assert!(matches!(result, Error(ErrorRepr::Words(_))));
    }

    #[test]
    fn rejects_empty_word_lists() {
        let result = Lexicon::from_json(r#"{"noun": []}"#).unwrap_err();
        assert_eq!(result, Error(ErrorRepr::EmptyWordList("noun".into())));
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        let mut lexicon = Lexicon::from_json(r#"{"noun": ["dog"]}"#).unwrap();
        let result = lexicon.realize(&["ghost"]).unwrap_err();
        assert_eq!(result, Error(ErrorRepr::MissingWords("ghost".into())));
    }
}
