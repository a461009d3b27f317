/// Element-wise kernels for the streaming hot path, vectorized with pulp when the `simd`
/// feature is enabled.
///
/// Every kernel computes each output element from the matching input elements only, so the
/// vector and scalar paths give bit-identical results whatever the slice boundaries are.
use num_traits::Float;

#[cfg(feature = "simd")]
use pulp::Arch;

/// `output[i] = input[i] * scale`
///
/// Produces the center estimate from the overlap-add accumulator.
#[inline]
pub fn scale_into<T: Float + 'static>(input: &[T], scale: T, output: &mut [T]) {
    debug_assert_eq!(input.len(), output.len());

    #[cfg(feature = "simd")]
    {
        let simd = Arch::new();
        match (
            core::any::TypeId::of::<T>(),
            core::any::TypeId::of::<f32>(),
            core::any::TypeId::of::<f64>(),
        ) {
            (t, f32_id, _) if t == f32_id => {
                scale_into_f32_simd(
                    simd,
                    unsafe { core::mem::transmute::<&[T], &[f32]>(input) },
                    unsafe { core::mem::transmute_copy::<T, f32>(&scale) },
                    unsafe { core::mem::transmute::<&mut [T], &mut [f32]>(output) },
                );
                return;
            }
            (t, _, f64_id) if t == f64_id => {
                scale_into_f64_simd(
                    simd,
                    unsafe { core::mem::transmute::<&[T], &[f64]>(input) },
                    unsafe { core::mem::transmute_copy::<T, f64>(&scale) },
                    unsafe { core::mem::transmute::<&mut [T], &mut [f64]>(output) },
                );
                return;
            }
            _ => {}
        }
    }

    for (out, &value) in output.iter_mut().zip(input) {
        *out = value * scale;
    }
}

#[cfg(feature = "simd")]
fn scale_into_f32_simd(simd: Arch, input: &[f32], scale: f32, output: &mut [f32]) {
    simd.dispatch(|| {
        let (input_head, input_tail) = pulp::as_arrays::<4, _>(input);
        let (output_head, output_tail) = pulp::as_arrays_mut::<4, _>(output);

        for (out, chunk) in output_head.iter_mut().zip(input_head) {
            *out = [
                chunk[0] * scale,
                chunk[1] * scale,
                chunk[2] * scale,
                chunk[3] * scale,
            ];
        }

        for (out, &value) in output_tail.iter_mut().zip(input_tail) {
            *out = value * scale;
        }
    });
}

#[cfg(feature = "simd")]
fn scale_into_f64_simd(simd: Arch, input: &[f64], scale: f64, output: &mut [f64]) {
    simd.dispatch(|| {
        let (input_head, input_tail) = pulp::as_arrays::<4, _>(input);
        let (output_head, output_tail) = pulp::as_arrays_mut::<4, _>(output);

        for (out, chunk) in output_head.iter_mut().zip(input_head) {
            *out = [
                chunk[0] * scale,
                chunk[1] * scale,
                chunk[2] * scale,
                chunk[3] * scale,
            ];
        }

        for (out, &value) in output_tail.iter_mut().zip(input_tail) {
            *out = value * scale;
        }
    });
}

/// `output[i] = minuend[i] - subtrahend[i]`
///
/// Produces a residual bus: raw channel minus center.
#[inline]
pub fn subtract_into<T: Float + 'static>(minuend: &[T], subtrahend: &[T], output: &mut [T]) {
    debug_assert_eq!(minuend.len(), subtrahend.len());
    debug_assert_eq!(minuend.len(), output.len());

    #[cfg(feature = "simd")]
    {
        let simd = Arch::new();
        match (
            core::any::TypeId::of::<T>(),
            core::any::TypeId::of::<f32>(),
            core::any::TypeId::of::<f64>(),
        ) {
            (t, f32_id, _) if t == f32_id => {
                subtract_into_f32_simd(
                    simd,
                    unsafe { core::mem::transmute::<&[T], &[f32]>(minuend) },
                    unsafe { core::mem::transmute::<&[T], &[f32]>(subtrahend) },
                    unsafe { core::mem::transmute::<&mut [T], &mut [f32]>(output) },
                );
                return;
            }
            (t, _, f64_id) if t == f64_id => {
                subtract_into_f64_simd(
                    simd,
                    unsafe { core::mem::transmute::<&[T], &[f64]>(minuend) },
                    unsafe { core::mem::transmute::<&[T], &[f64]>(subtrahend) },
                    unsafe { core::mem::transmute::<&mut [T], &mut [f64]>(output) },
                );
                return;
            }
            _ => {}
        }
    }

    for ((out, &a), &b) in output.iter_mut().zip(minuend).zip(subtrahend) {
        *out = a - b;
    }
}

#[cfg(feature = "simd")]
fn subtract_into_f32_simd(simd: Arch, minuend: &[f32], subtrahend: &[f32], output: &mut [f32]) {
    simd.dispatch(|| {
        let (a_head, a_tail) = pulp::as_arrays::<4, _>(minuend);
        let (b_head, b_tail) = pulp::as_arrays::<4, _>(subtrahend);
        let (output_head, output_tail) = pulp::as_arrays_mut::<4, _>(output);

        for ((out, a), b) in output_head.iter_mut().zip(a_head).zip(b_head) {
            *out = [a[0] - b[0], a[1] - b[1], a[2] - b[2], a[3] - b[3]];
        }

        for ((out, &a), &b) in output_tail.iter_mut().zip(a_tail).zip(b_tail) {
            *out = a - b;
        }
    });
}

#[cfg(feature = "simd")]
fn subtract_into_f64_simd(simd: Arch, minuend: &[f64], subtrahend: &[f64], output: &mut [f64]) {
    simd.dispatch(|| {
        let (a_head, a_tail) = pulp::as_arrays::<4, _>(minuend);
        let (b_head, b_tail) = pulp::as_arrays::<4, _>(subtrahend);
        let (output_head, output_tail) = pulp::as_arrays_mut::<4, _>(output);

        for ((out, a), b) in output_head.iter_mut().zip(a_head).zip(b_head) {
            *out = [a[0] - b[0], a[1] - b[1], a[2] - b[2], a[3] - b[3]];
        }

        for ((out, &a), &b) in output_tail.iter_mut().zip(a_tail).zip(b_tail) {
            *out = a - b;
        }
    });
}

/// `output[i] += input[i]`
///
/// Overlap-add of one inverse transform into the center accumulator.
#[inline]
pub fn accumulate<T: Float + 'static>(input: &[T], output: &mut [T]) {
    debug_assert_eq!(input.len(), output.len());

    #[cfg(feature = "simd")]
    {
        let simd = Arch::new();
        match (
            core::any::TypeId::of::<T>(),
            core::any::TypeId::of::<f32>(),
            core::any::TypeId::of::<f64>(),
        ) {
            (t, f32_id, _) if t == f32_id => {
                accumulate_f32_simd(
                    simd,
                    unsafe { core::mem::transmute::<&[T], &[f32]>(input) },
                    unsafe { core::mem::transmute::<&mut [T], &mut [f32]>(output) },
                );
                return;
            }
            (t, _, f64_id) if t == f64_id => {
                accumulate_f64_simd(
                    simd,
                    unsafe { core::mem::transmute::<&[T], &[f64]>(input) },
                    unsafe { core::mem::transmute::<&mut [T], &mut [f64]>(output) },
                );
                return;
            }
            _ => {}
        }
    }

    for (out, &value) in output.iter_mut().zip(input) {
        *out = *out + value;
    }
}

#[cfg(feature = "simd")]
fn accumulate_f32_simd(simd: Arch, input: &[f32], output: &mut [f32]) {
    simd.dispatch(|| {
        let (input_head, input_tail) = pulp::as_arrays::<4, _>(input);
        let (output_head, output_tail) = pulp::as_arrays_mut::<4, _>(output);

        for (out, chunk) in output_head.iter_mut().zip(input_head) {
            out[0] += chunk[0];
            out[1] += chunk[1];
            out[2] += chunk[2];
            out[3] += chunk[3];
        }

        for (out, &value) in output_tail.iter_mut().zip(input_tail) {
            *out += value;
        }
    });
}

#[cfg(feature = "simd")]
fn accumulate_f64_simd(simd: Arch, input: &[f64], output: &mut [f64]) {
    simd.dispatch(|| {
        let (input_head, input_tail) = pulp::as_arrays::<4, _>(input);
        let (output_head, output_tail) = pulp::as_arrays_mut::<4, _>(output);

        for (out, chunk) in output_head.iter_mut().zip(input_head) {
            out[0] += chunk[0];
            out[1] += chunk[1];
            out[2] += chunk[2];
            out[3] += chunk[3];
        }

        for (out, &value) in output_tail.iter_mut().zip(input_tail) {
            *out += value;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_into_odd_length() {
        let input: Vec<f32> = (0..7).map(|i| i as f32).collect();
        let mut output = vec![0.0f32; 7];
        scale_into(&input, 0.5, &mut output);
        assert_eq!(output, vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0]);
    }

    #[test]
    fn test_subtract_into_f64() {
        let a = [3.0f64, 2.0, 1.0, 0.0, -1.0];
        let b = [1.0f64; 5];
        let mut output = [0.0f64; 5];
        subtract_into(&a, &b, &mut output);
        assert_eq!(output, [2.0, 1.0, 0.0, -1.0, -2.0]);
    }

    #[test]
    fn test_accumulate() {
        let mut output = vec![1.0f32; 9];
        let input: Vec<f32> = (0..9).map(|i| i as f32).collect();
        accumulate(&input, &mut output);
        accumulate(&input, &mut output);
        let expected: Vec<f32> = (0..9).map(|i| 1.0 + 2.0 * i as f32).collect();
        assert_eq!(output, expected);
    }

    #[test]
    fn test_kernels_independent_of_split_point() {
        let input: Vec<f32> = (0..37).map(|i| (i as f32 * 0.37).sin()).collect();
        let mut whole = vec![0.0f32; 37];
        scale_into(&input, 0.123, &mut whole);

        let mut split = vec![0.0f32; 37];
        let (a, b) = split.split_at_mut(13);
        scale_into(&input[..13], 0.123, a);
        scale_into(&input[13..], 0.123, b);
        assert_eq!(whole, split);
    }
}
