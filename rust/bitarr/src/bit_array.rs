//! A fixed-length array of bits over caller-supplied storage.

use std::fmt;
use std::ops::{
    BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not, Range, ShlAssign,
    ShrAssign,
};

use crate::bit_store::BitStore;

/// A fixed-length array of bits with `[u64]` storage and bit-granular
/// operations.
///
/// `BitArrayBase` binds a storage buffer to a declared bit length and provides
/// single-bit and range mutation, cross-array section transfer, bitwise
/// algebra, ripple-carry addition, and logical shifts. The storage is whatever
/// the caller hands in: a borrowed slice (`&[u64]`, `&mut [u64]`), a boxed
/// slice, or a vector. The handle never allocates, frees, grows, or relocates
/// the buffer.
///
/// # Storage Format
///
/// The bits are stored in little-endian order within an array of `u64` words:
/// - Bit 0 corresponds to the least significant bit (LSB) of the first word
/// - Bit 63 corresponds to the most significant bit (MSB) of the first word
/// - Bit 64 corresponds to the LSB of the second word, and so on
///
/// The number of words spanned by the array is `len.div_ceil(64)`; the storage
/// may be larger, and words beyond that span are never touched. Bits beyond
/// `len` in the final word are **not** kept at any particular value: they are
/// scratch space, and every operation that consumes the array's value masks
/// them out (see [`Self::last_word_value`]).
///
/// # Contracts
///
/// Length and range preconditions on bulk operations are checked and panic
/// with a descriptive message. Single-bit indices are debug-checked; in
/// release builds an out-of-range index still panics at the word level via the
/// slice bounds check.
#[derive(Clone)]
pub struct BitArrayBase<S> {
    words: S,
    len: usize,
    word_count: usize,
    last_word: usize,
    tail_bits: usize,
    tail_mask: u64,
}

/// An array of bits over heap-allocated storage.
pub type BitArray = BitArrayBase<Box<[u64]>>;

/// A read-only array of bits over a borrowed word slice.
pub type BitArrayView<'a> = BitArrayBase<&'a [u64]>;

/// A mutable array of bits over a borrowed word slice.
pub type BitArrayViewMut<'a> = BitArrayBase<&'a mut [u64]>;

/// Adds two words and an incoming carry, producing the sum word and the
/// outgoing carry. Overflow is detected on both the carry add and the operand
/// add; either one overflowing carries out.
#[inline]
fn add_words(a: u64, b: u64, carry: bool) -> (u64, bool) {
    let (sum, c1) = a.overflowing_add(carry as u64);
    let (sum, c2) = sum.overflowing_add(b);
    (sum, c1 | c2)
}

impl<S: AsRef<[u64]>> BitArrayBase<S> {
    /// Constructs a bit array by binding existing storage to a logical bit
    /// length.
    ///
    /// The storage is interpreted as LSB-ordered words (bit 0 is the LSB of
    /// word 0) and is used as-is: no words are written, and whatever the final
    /// word holds beyond `len` stays there as don't-care scratch. The storage
    /// may be larger than `len.div_ceil(64)` words; the excess is never
    /// touched, which allows one buffer to back differently-sized views over
    /// its lifetime (see [`Self::set_len`]).
    ///
    /// # Panics
    ///
    /// Panics if the storage holds fewer than `len.div_ceil(64)` words.
    pub fn new(words: S, len: usize) -> BitArrayBase<S> {
        let mut array = BitArrayBase {
            words,
            len: 0,
            word_count: 0,
            last_word: 0,
            tail_bits: 0,
            tail_mask: u64::MAX,
        };
        array.set_len(len);
        array
    }

    /// Rebinds this handle to a new logical bit length over the same storage.
    ///
    /// Recomputes every derived field (word count, last-word index, tail
    /// width, tail mask). This is the only operation that mutates the
    /// handle's own geometry; call it whenever a buffer is reused for a
    /// differently-sized view. The storage contents are left untouched, so
    /// bits beyond a shrunken length simply become scratch again.
    ///
    /// # Panics
    ///
    /// Panics if the storage holds fewer than `len.div_ceil(64)` words.
    pub fn set_len(&mut self, len: usize) {
        let word_count = len.div_ceil(64);
        let capacity = self.words.as_ref().len();
        assert!(
            word_count <= capacity,
            "Length {len} bits needs {word_count} words, storage has {capacity}"
        );
        self.len = len;
        self.word_count = word_count;
        // For an empty array the last-word index coincides with the limiter.
        self.last_word = word_count.saturating_sub(1);
        self.tail_bits = len % 64;
        self.tail_mask = if self.tail_bits != 0 {
            u64::MAX >> (64 - self.tail_bits)
        } else {
            u64::MAX
        };
    }

    /// Check if the bit at the given index is set.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        debug_assert!(
            index < self.len,
            "Index {index} out of bounds (len: {})",
            self.len
        );
        let (word_index, bit_position) = Self::bit_position(index);
        (self.storage()[word_index] & (1u64 << bit_position)) != 0
    }

    /// Returns the value of the last word with the bits beyond `len` masked
    /// out.
    ///
    /// This is the only way to observe the true value of a possibly-partial
    /// last word; its raw stored value may carry garbage above the declared
    /// length. Returns 0 for an empty array.
    #[inline]
    pub fn last_word_value(&self) -> u64 {
        if self.word_count == 0 {
            return 0;
        }
        self.storage()[self.last_word] & self.tail_mask
    }

    /// Counts the number of set bits (1s) in the declared bit range.
    pub fn count_ones(&self) -> usize {
        self.storage()[..self.last_word]
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum::<usize>()
            + self.last_word_value().count_ones() as usize
    }

    /// Counts the number of unset bits (0s) in the declared bit range.
    pub fn count_zeros(&self) -> usize {
        self.len - self.count_ones()
    }

    /// Returns an iterator over the positions of set bits, in ascending
    /// order. Scratch bits beyond `len` are never yielded.
    pub fn iter(&self) -> BitArrayIter<'_> {
        BitArrayIter {
            words: self.storage().iter(),
            current_word: 0,
            next_word_index: 0,
            base_index: 0,
            len: self.len,
        }
    }

    /// Copies a section of this array into the full extent of `output`.
    ///
    /// The section starts at bit `start` of `self` and is `output.len()` bits
    /// long; `output` must be pre-sized to the section length. Every word of
    /// `output` is assembled from one or two adjacent source words: with a
    /// sub-word offset `r = start % 64`, word `k` becomes
    /// `src[i] >> r | src[i + 1] << (64 - r)`, stopping short of reading past
    /// this array's word span at the boundary. A zero offset degenerates to a
    /// word-wise copy, keeping every computed shift strictly below 64.
    ///
    /// # Panics
    ///
    /// Panics if `start + output.len() > self.len()`.
    pub fn read_section<S2: AsRef<[u64]> + AsMut<[u64]>>(
        &self,
        output: &mut BitArrayBase<S2>,
        start: usize,
    ) {
        assert!(
            start + output.len <= self.len,
            "Section [{start}, {}) out of bounds (len: {})",
            start + output.len,
            self.len
        );
        if output.word_count == 0 {
            return;
        }
        let rshift = start % 64;
        let out_last = output.last_word;
        let src = self.storage();
        let dst = output.storage_mut();
        let mut e = start / 64;

        if rshift != 0 {
            let lshift = 64 - rshift;
            for word in dst[..out_last].iter_mut() {
                *word = src[e] >> rshift;
                e += 1;
                *word |= src[e] << lshift;
            }
            dst[out_last] = src[e] >> rshift;
            e += 1;
            if e < src.len() {
                dst[out_last] |= src[e] << lshift;
            }
        } else {
            dst[..=out_last].copy_from_slice(&src[e..e + out_last + 1]);
        }
    }

    /// Returns the word span `[0, word_count)` of the underlying storage.
    ///
    /// The span is organized as LSB-ordered `u64` words; bits beyond the
    /// array's length in the final word are unspecified scratch.
    #[inline]
    pub fn storage(&self) -> &[u64] {
        &self.words.as_ref()[..self.word_count]
    }
}

impl<S: AsMut<[u64]>> BitArrayBase<S> {
    /// Sets the bit at the given index to 1.
    #[inline]
    pub fn set(&mut self, index: usize) {
        debug_assert!(
            index < self.len,
            "Index {index} out of bounds (len: {})",
            self.len
        );
        let (word_index, bit_position) = Self::bit_position(index);
        self.storage_mut()[word_index] |= 1u64 << bit_position;
    }

    /// Resets the bit at the given index to 0.
    #[inline]
    pub fn reset(&mut self, index: usize) {
        debug_assert!(
            index < self.len,
            "Index {index} out of bounds (len: {})",
            self.len
        );
        let (word_index, bit_position) = Self::bit_position(index);
        self.storage_mut()[word_index] &= !(1u64 << bit_position);
    }

    /// Flips the bit at the given index.
    #[inline]
    pub fn toggle(&mut self, index: usize) {
        debug_assert!(
            index < self.len,
            "Index {index} out of bounds (len: {})",
            self.len
        );
        let (word_index, bit_position) = Self::bit_position(index);
        self.storage_mut()[word_index] ^= 1u64 << bit_position;
    }

    /// Sets the bit at the given index to the specified value.
    #[inline]
    pub fn set_value(&mut self, index: usize, value: bool) {
        debug_assert!(
            index < self.len,
            "Index {index} out of bounds (len: {})",
            self.len
        );
        let (word_index, bit_position) = Self::bit_position(index);
        let mask = 1u64 << bit_position;
        let word = &mut self.storage_mut()[word_index];
        *word = (*word & !mask) | (mask & (-(value as i64) as u64));
    }

    /// Clears all bits (sets all to 0), scratch bits included.
    pub fn clear(&mut self) {
        self.storage_mut().fill(0);
    }

    /// Sets all bits to 1, scratch bits included. The scratch bits beyond
    /// `len` are masked out wherever the array's value is consumed, so no
    /// tail fixup is needed here.
    pub fn set_all(&mut self) {
        self.storage_mut().fill(u64::MAX);
    }

    /// Sets all bits in the specified range to 1.
    ///
    /// # Panics
    ///
    /// Panics if `range.end > self.len()`.
    pub fn set_range(&mut self, range: Range<usize>) {
        self.process_range(range, |word, mask| *word |= mask);
    }

    /// Resets all bits in the specified range to 0.
    ///
    /// # Panics
    ///
    /// Panics if `range.end > self.len()`.
    pub fn reset_range(&mut self, range: Range<usize>) {
        self.process_range(range, |word, mask| *word &= !mask);
    }

    /// Applies a mask function to all bits within the specified range.
    ///
    /// This is the shared walk behind [`Self::set_range`] and
    /// [`Self::reset_range`]. A range confined to one word is served with a
    /// single combined mask. A range spanning several words decomposes into
    /// the partial first word (from `range.start % 64` upward), full interior
    /// words, and the partial last word (up to `range.end % 64`); when
    /// `range.end` lands exactly on a word boundary no bit of that boundary
    /// word belongs to the range, and the word is not touched at all.
    ///
    /// The mask function receives each affected word together with a mask of
    /// the positions that fall inside the range. Empty ranges are a no-op.
    ///
    /// # Panics
    ///
    /// Panics if `range.end > self.len()`.
    pub fn process_range(&mut self, range: Range<usize>, mask_fn: impl Fn(&mut u64, u64)) {
        let start = range.start;
        let end = range.end;
        if start >= end {
            return;
        }
        assert!(
            end <= self.len,
            "Range end {} out of bounds (len: {})",
            end,
            self.len
        );

        let (start_word, start_bit) = Self::bit_position(start);
        let (end_word, end_bit) = Self::bit_position(end);
        let bits = self.storage_mut();

        if start_word == end_word {
            // end_bit can't be 0 when the range is non-empty and confined to
            // one word, so both sub-masks are well defined.
            let mask = ((1u64 << end_bit) - 1) & !((1u64 << start_bit) - 1);
            mask_fn(&mut bits[start_word], mask);
        } else {
            let first_mask = !((1u64 << start_bit) - 1);
            mask_fn(&mut bits[start_word], first_mask);

            for word in bits.iter_mut().take(end_word).skip(start_word + 1) {
                mask_fn(word, u64::MAX);
            }

            if end_bit > 0 {
                let last_mask = (1u64 << end_bit) - 1;
                mask_fn(&mut bits[end_word], last_mask);
            }
        }
    }

    /// Returns the mutable word span `[0, word_count)` of the underlying
    /// storage.
    ///
    /// Bits beyond the array's length in the final word are scratch; callers
    /// may leave anything there.
    #[inline]
    pub fn storage_mut(&mut self) -> &mut [u64] {
        let count = self.word_count;
        &mut self.words.as_mut()[..count]
    }
}

impl<S: AsRef<[u64]> + AsMut<[u64]>> BitArrayBase<S> {
    /// Copies the full contents of an equal-length array into this one.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    pub fn copy_from<S2: AsRef<[u64]>>(&mut self, source: &BitArrayBase<S2>) {
        assert_eq!(
            self.len, source.len,
            "BitArrays must have the same length for copy: {} != {}",
            self.len, source.len
        );
        self.storage_mut().copy_from_slice(source.storage());
    }

    /// Writes the full contents of `input` into this array starting at bit
    /// `start`, preserving every bit outside `[start, start + input.len())`.
    ///
    /// With a sub-word offset `lshift = start % 64`, each input word is split
    /// across two destination words by a shift-and-OR pair. The trailing,
    /// possibly-partial input word needs its own treatment: depending on how
    /// its width compares with `rshift = 64 - lshift`, it contributes to one
    /// or two destination words, and in the one-word case the destination's
    /// bits above the section are restored from a copy taken before any
    /// writes. A fully-populated trailing word is handled on a separate arm
    /// so that no shift ever reaches 64. The aligned case degenerates to a
    /// word-wise copy with a masked splice of the final word.
    ///
    /// # Panics
    ///
    /// Panics if `start + input.len() > self.len()`.
    pub fn write_section<S2: AsRef<[u64]>>(&mut self, input: &BitArrayBase<S2>, start: usize) {
        assert!(
            start + input.len <= self.len,
            "Section [{start}, {}) out of bounds (len: {})",
            start + input.len,
            self.len
        );
        if input.word_count == 0 {
            return;
        }
        let lshift = start % 64;
        let in_words = input.storage();
        let in_last = input.last_word;
        let tail_bits = input.tail_bits;
        let word_count = self.word_count;
        let dst = &mut self.words.as_mut()[..word_count];
        let mut e = start / 64;

        if lshift != 0 {
            let rshift = 64 - lshift;
            // The last destination word the section touches, captured before
            // any writes; the narrow-tail arm below restores its upper bits
            // from this copy.
            let saved = dst[(start + input.len).div_ceil(64) - 1];

            dst[e] &= u64::MAX >> rshift;

            for &word in &in_words[..in_last] {
                dst[e] |= word << lshift;
                e += 1;
                dst[e] = word >> rshift;
            }

            let last = in_words[in_last];
            if tail_bits > rshift {
                dst[e] |= last << lshift;
                e += 1;
                let mask = (1u64 << (tail_bits - rshift)) - 1;
                dst[e] = (dst[e] & !mask) | ((last >> rshift) & mask);
            } else if tail_bits != 0 && tail_bits < rshift {
                dst[e] |= input.last_word_value() << lshift;
                dst[e] |= saved & (u64::MAX << (lshift + tail_bits));
            } else if tail_bits == rshift {
                dst[e] |= last << lshift;
            } else {
                // The trailing input word is fully populated; splitting it
                // with the masked-value route would shift by 64.
                dst[e] |= last << lshift;
                e += 1;
                let mask = u64::MAX >> rshift;
                dst[e] = (dst[e] & !mask) | ((last >> rshift) & mask);
            }
        } else {
            dst[e..e + in_last].copy_from_slice(&in_words[..in_last]);
            e += in_last;
            dst[e] = (dst[e] & !input.tail_mask) | input.last_word_value();
        }
    }

    /// Performs `self = in1 + in2 + carry` with ripple carry, returning the
    /// carry out of bit `len - 1`.
    ///
    /// Words are added least significant first with a per-word full adder.
    /// The final, possibly-partial word is added over the masked values of
    /// both inputs' last words rather than their raw storage; a carry out of
    /// the declared range then lands exactly on the bit just above
    /// `len - 1` of the sum, which is read back as the carry-out. For an
    /// empty array the carry passes through unchanged.
    ///
    /// All three operands must have the same length; use
    /// [`Self::carrying_add_assign`] when the output is one of the inputs.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    pub fn carrying_add<S1: AsRef<[u64]>, S2: AsRef<[u64]>>(
        &mut self,
        in1: &BitArrayBase<S1>,
        in2: &BitArrayBase<S2>,
        carry: bool,
    ) -> bool {
        assert_eq!(
            self.len, in1.len,
            "BitArrays must have the same length for addition: {} != {}",
            self.len, in1.len
        );
        assert_eq!(
            self.len, in2.len,
            "BitArrays must have the same length for addition: {} != {}",
            self.len, in2.len
        );
        if self.word_count == 0 {
            return carry;
        }
        let mut carry = carry;
        let a = in1.storage();
        let b = in2.storage();
        let last = self.last_word;
        let tail_bits = self.tail_bits;
        let out = self.storage_mut();

        for i in 0..last {
            let (sum, next) = add_words(a[i], b[i], carry);
            out[i] = sum;
            carry = next;
        }

        if tail_bits == 0 {
            let (sum, next) = add_words(a[last], b[last], carry);
            out[last] = sum;
            next
        } else {
            let (sum, _) = add_words(in1.last_word_value(), in2.last_word_value(), carry);
            out[last] = sum;
            (sum >> tail_bits) & 1 != 0
        }
    }

    /// Performs `self = self + rhs + carry` in place, returning the carry out
    /// of bit `len - 1`. See [`Self::carrying_add`].
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    pub fn carrying_add_assign<S2: AsRef<[u64]>>(
        &mut self,
        rhs: &BitArrayBase<S2>,
        carry: bool,
    ) -> bool {
        assert_eq!(
            self.len, rhs.len,
            "BitArrays must have the same length for addition: {} != {}",
            self.len, rhs.len
        );
        if self.word_count == 0 {
            return carry;
        }
        let mut carry = carry;
        let b = rhs.storage();
        let last = self.last_word;
        let tail_bits = self.tail_bits;
        let tail_mask = self.tail_mask;
        let out = self.words.as_mut();

        for i in 0..last {
            let (sum, next) = add_words(out[i], b[i], carry);
            out[i] = sum;
            carry = next;
        }

        if tail_bits == 0 {
            let (sum, next) = add_words(out[last], b[last], carry);
            out[last] = sum;
            next
        } else {
            let (sum, _) = add_words(out[last] & tail_mask, rhs.last_word_value(), carry);
            out[last] = sum;
            (sum >> tail_bits) & 1 != 0
        }
    }

    /// Sets `self` to the bitwise AND of two equal-length arrays.
    ///
    /// The full word span is processed, scratch bits included; garbage in,
    /// garbage out above `len` is acceptable since scratch is masked at every
    /// consumption point. Use `&=` when the output aliases an input.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    pub fn and_from<S1: AsRef<[u64]>, S2: AsRef<[u64]>>(
        &mut self,
        in1: &BitArrayBase<S1>,
        in2: &BitArrayBase<S2>,
    ) {
        assert_eq!(
            self.len, in1.len,
            "BitArrays must have the same length for bitwise AND operation: {} != {}",
            self.len, in1.len
        );
        assert_eq!(
            self.len, in2.len,
            "BitArrays must have the same length for bitwise AND operation: {} != {}",
            self.len, in2.len
        );
        for (out, (left, right)) in self
            .storage_mut()
            .iter_mut()
            .zip(in1.storage().iter().zip(in2.storage().iter()))
        {
            *out = left & right;
        }
    }

    /// Sets `self` to the bitwise OR of two equal-length arrays. See
    /// [`Self::and_from`].
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    pub fn or_from<S1: AsRef<[u64]>, S2: AsRef<[u64]>>(
        &mut self,
        in1: &BitArrayBase<S1>,
        in2: &BitArrayBase<S2>,
    ) {
        assert_eq!(
            self.len, in1.len,
            "BitArrays must have the same length for bitwise OR operation: {} != {}",
            self.len, in1.len
        );
        assert_eq!(
            self.len, in2.len,
            "BitArrays must have the same length for bitwise OR operation: {} != {}",
            self.len, in2.len
        );
        for (out, (left, right)) in self
            .storage_mut()
            .iter_mut()
            .zip(in1.storage().iter().zip(in2.storage().iter()))
        {
            *out = left | right;
        }
    }

    /// Sets `self` to the bitwise XOR of two equal-length arrays. See
    /// [`Self::and_from`].
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    pub fn xor_from<S1: AsRef<[u64]>, S2: AsRef<[u64]>>(
        &mut self,
        in1: &BitArrayBase<S1>,
        in2: &BitArrayBase<S2>,
    ) {
        assert_eq!(
            self.len, in1.len,
            "BitArrays must have the same length for bitwise XOR operation: {} != {}",
            self.len, in1.len
        );
        assert_eq!(
            self.len, in2.len,
            "BitArrays must have the same length for bitwise XOR operation: {} != {}",
            self.len, in2.len
        );
        for (out, (left, right)) in self
            .storage_mut()
            .iter_mut()
            .zip(in1.storage().iter().zip(in2.storage().iter()))
        {
            *out = left ^ right;
        }
    }

    /// Sets `self` to the bitwise NOT of an equal-length array. Use
    /// [`Self::negate`] for the in-place form.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    pub fn not_from<S2: AsRef<[u64]>>(&mut self, input: &BitArrayBase<S2>) {
        assert_eq!(
            self.len, input.len,
            "BitArrays must have the same length for bitwise NOT operation: {} != {}",
            self.len, input.len
        );
        for (out, word) in self.storage_mut().iter_mut().zip(input.storage().iter()) {
            *out = !word;
        }
    }

    /// Flips all bits in place (NOT operation).
    pub fn negate(&mut self) {
        for word in self.storage_mut().iter_mut() {
            *word = !*word;
        }
    }

    /// Shifts the declared bit range left (toward higher indices) by `shift`
    /// bits in place. Vacated low bits become 0; bits shifted beyond
    /// `len - 1` are discarded.
    ///
    /// The walk is word-granular first (an offset of `shift / 64` words) with
    /// the sub-word remainder folded in by pairing each word with its lower
    /// neighbor; a remainder of 0 takes a plain copy branch so no shift ever
    /// reaches 64. Words are visited from the most significant end downward,
    /// which is what makes the in-place update sound. To shift a different
    /// source array, [`Self::copy_from`] it first.
    ///
    /// # Panics
    ///
    /// Panics if `shift > self.len()`.
    pub fn shift_left(&mut self, shift: usize) {
        assert!(
            shift <= self.len,
            "Shift count {shift} out of bounds (len: {})",
            self.len
        );
        if self.word_count == 0 {
            return;
        }
        let shift_words = shift / 64;
        let shift_bits = shift % 64;
        let word_count = self.word_count;
        let last = self.last_word;
        let words = &mut self.words.as_mut()[..word_count];
        if shift_words >= word_count {
            // Only reachable when shifting by the full length of a
            // word-aligned array; nothing survives.
            words.fill(0);
            return;
        }
        let mut from = last - shift_words;
        let mut to = last;

        if shift_bits != 0 {
            let rshift_bits = 64 - shift_bits;
            while from > 0 {
                words[to] = (words[from] << shift_bits) | (words[from - 1] >> rshift_bits);
                from -= 1;
                to -= 1;
            }
        } else {
            while from > 0 {
                words[to] = words[from];
                from -= 1;
                to -= 1;
            }
        }
        words[to] = words[from] << shift_bits;
        words[..to].fill(0);
    }

    /// Shifts the declared bit range right (toward lower indices) by `shift`
    /// bits in place. Vacated high bits become 0; bits below `shift` are
    /// discarded.
    ///
    /// Mirror of [`Self::shift_left`]: words are visited from the least
    /// significant end upward, making the in-place update sound, and the
    /// masked last-word value is folded in wherever the partial tail
    /// participates.
    ///
    /// # Panics
    ///
    /// Panics if `shift > self.len()`.
    pub fn shift_right(&mut self, shift: usize) {
        assert!(
            shift <= self.len,
            "Shift count {shift} out of bounds (len: {})",
            self.len
        );
        if self.word_count == 0 {
            return;
        }
        let shift_words = shift / 64;
        let shift_bits = shift % 64;
        let word_count = self.word_count;
        let last = self.last_word;
        let tail = self.last_word_value();
        let words = &mut self.words.as_mut()[..word_count];
        if shift_words >= word_count {
            words.fill(0);
            return;
        }
        let mut from = shift_words;
        let mut to = 0;

        if from < last {
            if shift_bits != 0 {
                let lshift_bits = 64 - shift_bits;
                while from < last - 1 {
                    words[to] = (words[from] >> shift_bits) | (words[from + 1] << lshift_bits);
                    from += 1;
                    to += 1;
                }
                words[to] = (words[from] >> shift_bits) | (tail << lshift_bits);
                to += 1;
            } else {
                while from < last {
                    words[to] = words[from];
                    from += 1;
                    to += 1;
                }
            }
        }

        words[to] = tail >> shift_bits;
        words[to + 1..].fill(0);
    }
}

impl<S: BitStore + AsRef<[u64]> + AsMut<[u64]>> BitArrayBase<S> {
    /// Creates a new bit array with all bits set to 0.
    pub fn empty(len: usize) -> BitArrayBase<S> {
        BitArrayBase::new(S::new_zeroed(len.div_ceil(64)), len)
    }

    /// Creates a new bit array with all bits set to 1.
    pub fn full(len: usize) -> BitArrayBase<S> {
        Self::new_with_pattern(len, u64::MAX)
    }

    /// Creates a new bit array by repeating a 64-bit pattern across the
    /// storage words.
    pub fn new_with_pattern(len: usize, pattern: u64) -> BitArrayBase<S> {
        BitArrayBase::new(S::new_with_pattern(len.div_ceil(64), pattern), len)
    }

    /// Creates a new bit array from a slice of u64 words in LSB order.
    ///
    /// Only the first `len.div_ceil(64)` words are copied; bits beyond `len`
    /// in the last copied word become scratch.
    ///
    /// # Panics
    ///
    /// Panics if `len > words.len() * 64`.
    pub fn from_lsb_words(words: &[u64], len: usize) -> BitArrayBase<S> {
        assert!(len <= words.len() * 64);
        let count = len.div_ceil(64);
        let mut bits = S::new_zeroed(count);
        bits.as_mut().copy_from_slice(&words[..count]);
        BitArrayBase::new(bits, len)
    }

    /// Creates a new bit array from a slice of bytes in LSB order: bit 0 is
    /// the LSB of the first byte, bit 8 the LSB of the second byte, and so
    /// on.
    pub fn from_lsb_bytes(bytes: &[u8], len: usize) -> BitArrayBase<S> {
        let mut bit_array = BitArrayBase::empty(len);
        let byte_len = len.div_ceil(8).min(bytes.len());
        if byte_len != 0 {
            bytemuck::cast_slice_mut::<_, u8>(bit_array.storage_mut())[..byte_len]
                .copy_from_slice(&bytes[..byte_len]);
        }
        bit_array
    }

    /// Creates a new bit array with bits set at the specified positions.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if any position is `>= len`.
    pub fn from_positions(positions: impl Iterator<Item = usize>, len: usize) -> BitArrayBase<S> {
        let mut bit_array = BitArrayBase::empty(len);
        for position in positions {
            bit_array.set(position);
        }
        bit_array
    }

    /// Creates a new bit array with bits set in the specified ranges.
    ///
    /// # Panics
    ///
    /// Panics if any range end is `> len`.
    pub fn from_ranges(ranges: impl Iterator<Item = Range<usize>>, len: usize) -> BitArrayBase<S> {
        let mut bit_array = BitArrayBase::empty(len);
        for range in ranges {
            bit_array.set_range(range);
        }
        bit_array
    }
}

impl<S> BitArrayBase<S> {
    /// Returns the number of bits in the array.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the bit array has zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of storage words spanned by the declared length
    /// (the one-past-last word index).
    #[inline]
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Helper function that returns the u64 index and bit position within
    /// that u64 for a given bit index in the array.
    #[inline]
    fn bit_position(index: usize) -> (usize, usize) {
        let word_index = index / 64;
        let bit_position = index % 64;
        (word_index, bit_position)
    }
}

impl<S, S1> BitAnd<&BitArrayBase<S1>> for &BitArrayBase<S>
where
    S: BitStore + AsRef<[u64]> + AsMut<[u64]>,
    S1: AsRef<[u64]>,
{
    type Output = BitArrayBase<S>;

    fn bitand(self, rhs: &BitArrayBase<S1>) -> Self::Output {
        let mut result = BitArrayBase::<S>::empty(self.len);
        result.and_from(self, rhs);
        result
    }
}

impl<S, S1> BitOr<&BitArrayBase<S1>> for &BitArrayBase<S>
where
    S: BitStore + AsRef<[u64]> + AsMut<[u64]>,
    S1: AsRef<[u64]>,
{
    type Output = BitArrayBase<S>;

    fn bitor(self, rhs: &BitArrayBase<S1>) -> Self::Output {
        let mut result = BitArrayBase::<S>::empty(self.len);
        result.or_from(self, rhs);
        result
    }
}

impl<S, S1> BitXor<&BitArrayBase<S1>> for &BitArrayBase<S>
where
    S: BitStore + AsRef<[u64]> + AsMut<[u64]>,
    S1: AsRef<[u64]>,
{
    type Output = BitArrayBase<S>;

    fn bitxor(self, rhs: &BitArrayBase<S1>) -> Self::Output {
        let mut result = BitArrayBase::<S>::empty(self.len);
        result.xor_from(self, rhs);
        result
    }
}

impl<S> Not for &BitArrayBase<S>
where
    S: BitStore + AsRef<[u64]> + AsMut<[u64]>,
{
    type Output = BitArrayBase<S>;

    fn not(self) -> Self::Output {
        let mut result = BitArrayBase::<S>::empty(self.len);
        result.not_from(self);
        result
    }
}

impl<S, S1> BitAndAssign<&BitArrayBase<S1>> for BitArrayBase<S>
where
    S: AsRef<[u64]> + AsMut<[u64]>,
    S1: AsRef<[u64]>,
{
    fn bitand_assign(&mut self, rhs: &BitArrayBase<S1>) {
        assert_eq!(
            self.len, rhs.len,
            "BitArrays must have the same length for bitwise AND-assign: {} != {}",
            self.len, rhs.len
        );
        for (left, right) in self.storage_mut().iter_mut().zip(rhs.storage().iter()) {
            *left &= *right;
        }
    }
}

impl<S, S1> BitOrAssign<&BitArrayBase<S1>> for BitArrayBase<S>
where
    S: AsRef<[u64]> + AsMut<[u64]>,
    S1: AsRef<[u64]>,
{
    fn bitor_assign(&mut self, rhs: &BitArrayBase<S1>) {
        assert_eq!(
            self.len, rhs.len,
            "BitArrays must have the same length for bitwise OR-assign: {} != {}",
            self.len, rhs.len
        );
        for (left, right) in self.storage_mut().iter_mut().zip(rhs.storage().iter()) {
            *left |= *right;
        }
    }
}

impl<S, S1> BitXorAssign<&BitArrayBase<S1>> for BitArrayBase<S>
where
    S: AsRef<[u64]> + AsMut<[u64]>,
    S1: AsRef<[u64]>,
{
    fn bitxor_assign(&mut self, rhs: &BitArrayBase<S1>) {
        assert_eq!(
            self.len, rhs.len,
            "BitArrays must have the same length for bitwise XOR-assign: {} != {}",
            self.len, rhs.len
        );
        for (left, right) in self.storage_mut().iter_mut().zip(rhs.storage().iter()) {
            *left ^= *right;
        }
    }
}

impl<S: AsRef<[u64]> + AsMut<[u64]>> ShlAssign<usize> for BitArrayBase<S> {
    fn shl_assign(&mut self, shift: usize) {
        self.shift_left(shift);
    }
}

impl<S: AsRef<[u64]> + AsMut<[u64]>> ShrAssign<usize> for BitArrayBase<S> {
    fn shr_assign(&mut self, shift: usize) {
        self.shift_right(shift);
    }
}

impl<S: AsRef<[u64]>, S1: AsRef<[u64]>> PartialEq<BitArrayBase<S1>> for BitArrayBase<S> {
    /// Two arrays are equal when they declare the same length and agree on
    /// every declared bit; scratch bits beyond `len` are ignored.
    fn eq(&self, other: &BitArrayBase<S1>) -> bool {
        self.len == other.len
            && self.storage()[..self.last_word] == other.storage()[..other.last_word]
            && self.last_word_value() == other.last_word_value()
    }
}

impl<S: AsRef<[u64]>> fmt::Debug for BitArrayBase<S> {
    /// Renders the declared contents; the final word is shown with its
    /// scratch bits masked out.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitArray {{ len: {}, words: [", self.len)?;
        for index in 0..self.word_count {
            if index != 0 {
                write!(f, ", ")?;
            }
            let word = if index == self.last_word {
                self.last_word_value()
            } else {
                self.storage()[index]
            };
            write!(f, "{word:#018x}")?;
        }
        write!(f, "] }}")
    }
}

/// An iterator over the positions of set bits in a bit array.
///
/// This iterator yields the 0-based indices of all bits that are set to 1, in
/// ascending order. Scratch bits beyond the array's length are fenced off by
/// the length bound.
#[derive(Clone)]
pub struct BitArrayIter<'a> {
    words: std::slice::Iter<'a, u64>,
    current_word: u64,
    next_word_index: usize,
    base_index: usize,
    len: usize,
}

impl<'a> Iterator for BitArrayIter<'a> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // If current word has set bits, find and return the next one
            if self.current_word != 0 {
                let bit_offset = self.current_word.trailing_zeros() as usize;
                let index = self.base_index + bit_offset;

                // Make sure we don't go beyond the bit array's length
                if index >= self.len {
                    return None;
                }

                // Clear the least significant set bit for next iteration
                self.current_word &= self.current_word - 1;

                return Some(index);
            }

            // Move to the next word
            match self.words.next() {
                Some(&word) => {
                    self.current_word = word;
                    self.base_index = self.next_word_index * 64;
                    self.next_word_index += 1;
                }
                None => return None,
            }
        }
    }
}
