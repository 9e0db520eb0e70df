//! Iteration over the set bits of a word stream.
//!
//! [`IterImpl`] can be driven by the words of a single [`BitSet`][super::BitSet], or by words
//! computed from several sets (like the symmetric difference of two sets).

use std::marker::PhantomData;

use super::{BitValue, Word};

pub struct IterImpl<V: BitValue, N> {
    words: N,
    /// Remaining set bits of the word currently being scanned.
    word: Word,
    /// Element index of bit 0 of `word`.
    base: usize,
    started: bool,
    _p: PhantomData<V>,
}

impl<V: BitValue, N: Clone> Clone for IterImpl<V, N> {
    fn clone(&self) -> Self {
        Self {
            words: self.words.clone(),
            word: self.word,
            base: self.base,
            started: self.started,
            _p: PhantomData,
        }
    }
}

impl<V: BitValue, N> IterImpl<V, N> {
    pub fn new(words: N) -> Self {
        Self {
            words,
            word: 0,
            base: 0,
            started: false,
            _p: PhantomData,
        }
    }
}

impl<V: BitValue, N: Iterator<Item = Word>> Iterator for IterImpl<V, N> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        while self.word == 0 {
            self.word = self.words.next()?;
            if self.started {
                self.base += Word::BITS as usize;
            }
            self.started = true;
        }

        let bit = self.word.trailing_zeros() as usize;
        // Clear the lowest set bit.
        self.word &= self.word - 1;
        Some(V::from_index(self.base + bit))
    }
}
