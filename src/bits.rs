//! A [`BitSet`] indexed by event codes.
//!
//! `evdev` reports supported event types, codes and properties, as well as the state of keys,
//! LEDs, switches and sounds, as bit sets. [`BitSet`] stores that data in the same word layout the
//! kernel uses, so the word buffer can be handed to the kernel directly.
//!
//! The storage is allocated on construction and sized to fit every code up to
//! [`BitValue::MAX`] of the element type.

mod iter;

pub(crate) use sealed::BitValueImpl;

use std::{ffi::c_ulong, fmt, marker::PhantomData, slice, vec};

mod sealed {
    pub trait BitValueImpl {
        // `index` must fit in the native integer type
        fn from_index(index: usize) -> Self;
        fn into_index(self) -> usize;
    }
}

/// The underlying word type used by [`BitSet`]s.
///
/// This is an `unsigned long` in C, which may vary between platforms.
pub type Word = c_ulong;

/// Types that can be used in [`BitSet`].
///
/// This is a sealed trait with no interface. It is implemented for the event code types in this
/// library.
pub trait BitValue: Copy + sealed::BitValueImpl {
    /// The largest value that can be stored in a [`BitSet`].
    ///
    /// Attempting to insert a value above this into a [`BitSet`] will panic.
    const MAX: Self;
}

/// Returns the number of [`Word`]s needed to store every value up to `V::MAX`.
pub(crate) fn word_count<V: BitValue>() -> usize {
    (V::MAX.into_index() + 1).div_ceil(Word::BITS as usize)
}

/// A set of `V`, stored as a bit set.
pub struct BitSet<V: BitValue> {
    words: Vec<Word>,
    _p: PhantomData<V>,
}

impl<V: BitValue> Clone for BitSet<V> {
    fn clone(&self) -> Self {
        Self {
            words: self.words.clone(),
            _p: PhantomData,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.words.clone_from(&source.words);
    }
}
impl<V: BitValue> Default for BitSet<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: BitValue> BitSet<V> {
    /// Creates an empty bit set that doesn't contain any values.
    pub fn new() -> Self {
        Self {
            words: vec![0; word_count::<V>()],
            _p: PhantomData,
        }
    }

    /// Returns a reference to the underlying [`Word`]s making up this [`BitSet`].
    ///
    /// Note that the [`Word`] type varies in size and endianness between platforms.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Returns a mutable reference to the underlying [`Word`]s making up this [`BitSet`].
    ///
    /// You should not set any bits to 1 whose indices are larger than
    /// [`<V as BitValue>::MAX`][BitValue::MAX].
    pub fn words_mut(&mut self) -> &mut [Word] {
        &mut self.words
    }

    /// Returns the number of elements in this [`BitSet`] (the number of set bits).
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns whether this [`BitSet`] is empty (contains no set bits).
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Removes all values from the set.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Returns whether `self` contains `value`.
    pub fn contains(&self, value: V) -> bool {
        let index = value.into_index();
        if index > V::MAX.into_index() {
            return false;
        }
        let (wordpos, bitpos) = split_index(index);
        self.words[wordpos] & (1 << bitpos) != 0
    }

    /// Inserts `value` into `self`, setting the appropriate bit.
    ///
    /// Returns `true` if `value` was already present.
    ///
    /// # Panics
    ///
    /// Panics if `value` is larger than [`<V as BitValue>::MAX`][BitValue::MAX].
    pub fn insert(&mut self, value: V) -> bool {
        let index = value.into_index();
        assert!(
            index <= V::MAX.into_index(),
            "value out of range for `BitSet` storage (value's index is {}, max is {})",
            index,
            V::MAX.into_index(),
        );

        let present = self.contains(value);
        let (wordpos, bitpos) = split_index(index);
        self.words[wordpos] |= 1 << bitpos;
        present
    }

    /// Removes `value` from the set.
    ///
    /// Returns `true` if it was present and has been removed, or `false` if it was not present.
    pub fn remove(&mut self, value: V) -> bool {
        let index = value.into_index();
        if index > V::MAX.into_index() {
            return false;
        }
        let present = self.contains(value);
        let (wordpos, bitpos) = split_index(index);
        self.words[wordpos] &= !(1 << bitpos);
        present
    }

    /// Inserts or removes `value`, depending on `on`.
    ///
    /// Values above [`BitValue::MAX`] are ignored.
    pub fn set(&mut self, value: V, on: bool) {
        if value.into_index() > V::MAX.into_index() {
            return;
        }
        if on {
            self.insert(value);
        } else {
            self.remove(value);
        }
    }

    /// Returns an iterator over all values in `self`, in ascending order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            imp: iter::IterImpl::new(self.words.iter().copied()),
        }
    }

    /// Returns an iterator over all values that are contained in either `self` or `other`, but not
    /// both.
    pub(crate) fn symmetric_difference<'a>(
        &'a self,
        other: &'a BitSet<V>,
    ) -> SymmetricDifference<'a, V> {
        SymmetricDifference {
            imp: iter::IterImpl::new(SymmDiffWords {
                a: self.words.iter(),
                b: other.words.iter(),
            }),
        }
    }
}

fn split_index(index: usize) -> (usize, usize) {
    (index / Word::BITS as usize, index % Word::BITS as usize)
}

impl<V: BitValue + fmt::Debug> fmt::Debug for BitSet<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<V: BitValue> PartialEq for BitSet<V> {
    fn eq(&self, other: &Self) -> bool {
        self.words == other.words
    }
}
impl<V: BitValue> Eq for BitSet<V> {}

impl<V: BitValue> FromIterator<V> for BitSet<V> {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        let mut this = Self::new();
        this.extend(iter);
        this
    }
}
impl<V: BitValue> Extend<V> for BitSet<V> {
    fn extend<T: IntoIterator<Item = V>>(&mut self, iter: T) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<'a, V: BitValue> IntoIterator for &'a BitSet<V> {
    type Item = V;
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
impl<V: BitValue> IntoIterator for BitSet<V> {
    type Item = V;
    type IntoIter = IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            imp: iter::IterImpl::new(self.words.into_iter()),
        }
    }
}

/// An owning iterator over the values stored in a [`BitSet`].
pub struct IntoIter<V: BitValue> {
    imp: iter::IterImpl<V, vec::IntoIter<Word>>,
}
impl<V: BitValue> Iterator for IntoIter<V> {
    type Item = V;
    fn next(&mut self) -> Option<Self::Item> {
        self.imp.next()
    }
}
impl<V: BitValue + fmt::Debug> fmt::Debug for IntoIter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter")
            .field(&DebugAsSet(self.imp.clone()))
            .finish()
    }
}

/// An iterator over the values stored in a [`BitSet`].
pub struct Iter<'a, V: BitValue> {
    imp: iter::IterImpl<V, std::iter::Copied<slice::Iter<'a, Word>>>,
}

impl<V: BitValue> Iterator for Iter<'_, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        self.imp.next()
    }
}

impl<V: BitValue + fmt::Debug> fmt::Debug for Iter<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Iter")
            .field(&DebugAsSet(self.imp.clone()))
            .finish()
    }
}

struct DebugAsSet<I>(I);
impl<I: Clone + Iterator> fmt::Debug for DebugAsSet<I>
where
    I::Item: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.clone()).finish()
    }
}

/// An [`Iterator`] yielding elements that are in exactly one of two [`BitSet`]s.
pub(crate) struct SymmetricDifference<'a, V: BitValue> {
    imp: iter::IterImpl<V, SymmDiffWords<'a>>,
}

struct SymmDiffWords<'a> {
    a: slice::Iter<'a, Word>,
    b: slice::Iter<'a, Word>,
}

impl Iterator for SymmDiffWords<'_> {
    type Item = Word;
    fn next(&mut self) -> Option<Word> {
        Some(self.a.next().copied()? ^ self.b.next().copied()?)
    }
}

impl<V: BitValue> Iterator for SymmetricDifference<'_, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        self.imp.next()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        InputProp,
        event::{Abs, EventType, Key},
    };

    use super::*;

    #[test]
    fn storage_size() {
        assert_eq!(BitSet::<EventType>::new().words().len(), 1);
        assert_eq!(BitSet::<InputProp>::new().words().len(), 1);

        let keys = BitSet::<Key>::new().words().len() * Word::BITS as usize;
        assert!(keys > Key::MAX.raw() as usize);
        assert!(keys - (Key::MAX.raw() as usize) <= Word::BITS as usize);
    }

    #[test]
    fn bit0() {
        let mut set = BitSet::new();
        set.insert(InputProp(0));

        assert!(set.contains(InputProp::POINTER));
        assert!(!set.contains(InputProp::DIRECT));
        assert!(!set.contains(InputProp::MAX));
        assert!(!set.contains(InputProp(InputProp::MAX.0 + 1)));
        assert!(!set.contains(InputProp(u8::MAX)));

        assert_eq!(set.iter().collect::<Vec<_>>(), &[InputProp::POINTER]);
    }

    #[test]
    fn max() {
        let mut set = BitSet::new();
        set.insert(InputProp::MAX);

        assert!(set.contains(InputProp::MAX));
        assert!(!set.contains(InputProp::POINTER));
        assert!(!set.remove(InputProp(InputProp::MAX.0 + 1)));
        assert!(set.remove(InputProp::MAX));
        assert!(set.is_empty());
    }

    #[test]
    #[should_panic = "value out of range for `BitSet`"]
    fn above_max() {
        let mut set = BitSet::new();
        set.insert(Abs::from_raw(Abs::MAX.raw() + 1));
    }

    #[test]
    fn set_ignores_out_of_range() {
        let mut set = BitSet::new();
        set.set(Abs::from_raw(Abs::MAX.raw() + 1), true);
        assert!(set.is_empty());
        set.set(Abs::Y, true);
        set.set(Abs::X, true);
        set.set(Abs::Y, false);
        assert_eq!(set.iter().collect::<Vec<_>>(), &[Abs::X]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn debug() {
        let set = BitSet::from_iter([Abs::X, Abs::Y, Abs::MT_SLOT]);
        assert_eq!(format!("{set:?}"), "{ABS_X, ABS_Y, ABS_MT_SLOT}");

        let mut iter = set.iter();
        assert_eq!(iter.next(), Some(Abs::X));
        assert_eq!(format!("{iter:?}"), "Iter({ABS_Y, ABS_MT_SLOT})");

        let mut iter = set.into_iter();
        assert_eq!(iter.next(), Some(Abs::X));
        assert_eq!(format!("{iter:?}"), "IntoIter({ABS_Y, ABS_MT_SLOT})");
    }

    #[test]
    fn multiple() {
        let mut set = BitSet::new();
        set.insert(Key::KEY_RESERVED);
        set.insert(Key::KEY_Q);
        set.insert(Key::MAX);
        set.insert(Key::BTN_TOOL_FINGER);

        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            &[Key::KEY_RESERVED, Key::KEY_Q, Key::BTN_TOOL_FINGER, Key::MAX]
        );
    }

    #[test]
    fn symmdiff() {
        let mut a = BitSet::new();
        a.insert(Key::KEY_B);

        assert_eq!(
            a.symmetric_difference(&BitSet::new()).collect::<Vec<_>>(),
            &[Key::KEY_B]
        );

        let mut b = BitSet::new();
        b.insert(Key::KEY_A);

        assert_eq!(
            a.symmetric_difference(&b).collect::<Vec<_>>(),
            &[Key::KEY_A, Key::KEY_B]
        );
        assert_eq!(a.symmetric_difference(&a).collect::<Vec<_>>(), &[]);
    }
}
