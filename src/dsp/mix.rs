//! Buffer summing and gain primitives.

/*
Summing Buses
=============

Mixing is addition. Every branch of the effects graph writes its own buffer,
and the master stage sums them:

    master = Σ branch_i × gain_i

Parallel branches each carry a full copy of the dry signal, so the sum of
several unity-gain branches is louder than any single one:

    Filter branch:    [ 0.5,  0.5]
    Reverb branch:    [ 0.3, -0.1]
    Sum:              [ 0.8,  0.4]

Nothing here clips; the master gain (default 0.5) sits after the sum and
the output device clamps whatever remains.
*/

/// Add signal B into signal A in-place (summing).
#[inline]
pub fn sum_in_place(a: &mut [f32], b: &[f32]) {
    debug_assert_eq!(a.len(), b.len());

    for (sa, &sb) in a.iter_mut().zip(b.iter()) {
        *sa += sb;
    }
}

/// Add `b × gain` into `a` in-place.
#[inline]
pub fn add_scaled(a: &mut [f32], b: &[f32], gain: f32) {
    debug_assert_eq!(a.len(), b.len());

    if gain == 0.0 {
        return;
    }
    for (sa, &sb) in a.iter_mut().zip(b.iter()) {
        *sa += sb * gain;
    }
}

/// Multiply every sample by `gain`.
#[inline]
pub fn apply_gain(buffer: &mut [f32], gain: f32) {
    for sample in buffer.iter_mut() {
        *sample *= gain;
    }
}

/// Largest absolute sample value.
pub fn peak(buffer: &[f32]) -> f32 {
    buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_can_exceed_one() {
        let mut a = [1.0, 0.5];
        let b = [1.0, 0.8];

        sum_in_place(&mut a, &b);

        assert_eq!(a[0], 2.0); // Exceeds 1.0!
        assert_eq!(a[1], 1.3);
    }

    #[test]
    fn test_add_scaled() {
        let mut a = [0.5, 0.5, 0.5];
        let b = [1.0, -1.0, 0.0];

        add_scaled(&mut a, &b, 0.25);

        assert_eq!(a, [0.75, 0.25, 0.5]);
    }

    #[test]
    fn test_add_scaled_zero_gain_is_noop() {
        let mut a = [0.5];
        add_scaled(&mut a, &[f32::NAN], 0.0);
        assert_eq!(a, [0.5]);
    }

    #[test]
    fn test_gain_and_peak() {
        let mut a = [0.2, -0.8, 0.4];
        apply_gain(&mut a, 0.5);
        assert_eq!(a, [0.1, -0.4, 0.2]);
        assert_eq!(peak(&a), 0.4);
    }
}
