use super::naive;
use crate::bit_array::BitArray;

#[test]
fn test_add_carries_out_of_full_word() {
    let all_ones = BitArray::from_lsb_words(&[u64::MAX], 64);
    let one = BitArray::from_lsb_words(&[1], 64);

    let mut sum = BitArray::empty(64);
    let carry = sum.carrying_add(&all_ones, &one, false);

    assert!(carry, "Adding 1 to an all-ones word must carry out");
    assert_eq!(sum.count_ones(), 0, "The sum must wrap to zero");

    // The same overflow driven by the carry-in alone
    let zero = BitArray::from_lsb_words(&[0], 64);
    let carry = sum.carrying_add(&all_ones, &zero, true);
    assert!(carry);
    assert_eq!(sum.count_ones(), 0);

    // No overflow without the extra one
    let carry = sum.carrying_add(&all_ones, &zero, false);
    assert!(!carry);
    assert_eq!(sum, all_ones);
}

#[test]
fn test_add_single_bit_arrays() {
    // (a, b, carry_in) -> (sum, carry_out), the full-adder truth table
    let table = [
        (false, false, false, false, false),
        (true, false, false, true, false),
        (false, true, false, true, false),
        (true, true, false, false, true),
        (false, false, true, true, false),
        (true, false, true, false, true),
        (false, true, true, false, true),
        (true, true, true, true, true),
    ];

    for &(a, b, carry_in, expected_sum, expected_carry) in &table {
        let mut left = BitArray::empty(1);
        left.set_value(0, a);
        let mut right = BitArray::empty(1);
        right.set_value(0, b);

        let mut sum = BitArray::empty(1);
        let carry = sum.carrying_add(&left, &right, carry_in);

        assert_eq!(
            sum.contains(0),
            expected_sum,
            "sum of ({a}, {b}, carry {carry_in})"
        );
        assert_eq!(carry, expected_carry, "carry of ({a}, {b}, carry {carry_in})");
    }
}

#[test]
fn test_add_partial_tail_masks_scratch() {
    // full() leaves scratch ones above bit 19; the addition must see the
    // masked value 0xFFFFF, so adding 1 wraps to zero with carry out.
    let all_ones = BitArray::full(20);
    let one = BitArray::from_lsb_words(&[1], 20);

    let mut sum = BitArray::empty(20);
    let carry = sum.carrying_add(&all_ones, &one, false);

    assert!(carry, "Adding 1 to 20 set bits must carry out of bit 19");
    assert_eq!(sum.count_ones(), 0);
}

#[test]
fn test_add_carry_lands_on_boundary_bit() {
    // 2^64 + 2^64 over 65 bits: the two top bits sum into the carry
    let a = BitArray::from_positions([64].into_iter(), 65);
    let b = BitArray::from_positions([64].into_iter(), 65);

    let mut sum = BitArray::empty(65);
    let carry = sum.carrying_add(&a, &b, false);

    assert!(carry, "Adding the top bits of a 65-bit array must carry out");
    assert_eq!(sum.count_ones(), 0);

    // The carry chain must ripple from the low word into the partial tail
    let low_ones = BitArray::from_lsb_words(&[u64::MAX, 0], 65);
    let one = BitArray::from_lsb_words(&[1, 0], 65);
    let carry = sum.carrying_add(&low_ones, &one, false);

    assert!(!carry);
    assert_eq!(sum.iter().collect::<Vec<_>>(), vec![64]);
}

#[test]
fn test_add_empty_arrays_pass_carry_through() {
    let a = BitArray::empty(0);
    let b = BitArray::empty(0);
    let mut sum = BitArray::empty(0);

    assert!(!sum.carrying_add(&a, &b, false));
    assert!(sum.carrying_add(&a, &b, true));
}

#[test]
fn test_add_randomized_against_bit_serial() {
    for case in 0..100 {
        let mut rng = fastrand::Rng::with_seed(case * 16807 + 13);
        let len = rng.usize(1..=300);
        let a = naive::random_array(&mut rng, len);
        let b = naive::random_array(&mut rng, len);
        let carry_in = rng.bool();

        let (expected_sum, expected_carry) =
            naive::add_bit_serial(&naive::to_bits(&a), &naive::to_bits(&b), carry_in);

        let mut sum = BitArray::empty(len);
        let carry = sum.carrying_add(&a, &b, carry_in);

        assert_eq!(
            naive::to_bits(&sum),
            expected_sum,
            "sum bits for len {len}, carry_in {carry_in}"
        );
        assert_eq!(carry, expected_carry, "carry out for len {len}");

        // The in-place form must agree
        let mut accumulated = a.clone();
        let assign_carry = accumulated.carrying_add_assign(&b, carry_in);
        assert_eq!(accumulated, sum, "in-place sum for len {len}");
        assert_eq!(assign_carry, carry, "in-place carry for len {len}");
    }
}

#[test]
fn test_add_word_boundary_lengths() {
    // Exact multiples of the word width take the unmasked final-word path
    for &len in &[64usize, 128, 192] {
        let mut rng = fastrand::Rng::with_seed(len as u64);
        let a = naive::random_array(&mut rng, len);
        let b = naive::random_array(&mut rng, len);

        let (expected_sum, expected_carry) =
            naive::add_bit_serial(&naive::to_bits(&a), &naive::to_bits(&b), false);

        let mut sum = BitArray::empty(len);
        let carry = sum.carrying_add(&a, &b, false);

        assert_eq!(naive::to_bits(&sum), expected_sum, "sum bits for len {len}");
        assert_eq!(carry, expected_carry, "carry out for len {len}");
    }
}

#[test]
#[should_panic(expected = "must have the same length for addition")]
fn test_add_length_mismatch() {
    let a = BitArray::empty(64);
    let b = BitArray::empty(65);
    let mut sum = BitArray::empty(64);
    sum.carrying_add(&a, &b, false);
}
