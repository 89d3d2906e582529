/// Computes the [autocorrelation](https://en.wikipedia.org/wiki/Autocorrelation)
/// of a window using time domain convolution.
///
/// `result[tau]` receives `sum(window[j] * window[j + tau])` over every `j`
/// where both indices are in range. The number of lags computed is
/// `result.len()`, which must not exceed the window length.
///
/// The cost is quadratic in the lag count. No memory is allocated.
pub fn autocorr_conv(window: &[f32], result: &mut [f32]) {
    let window_size = window.len();
    assert!(
        result.len() <= window_size,
        "Result buffer must not be longer than the window."
    );

    for (tau, value) in result.iter_mut().enumerate() {
        *value = window[..window_size - tau]
            .iter()
            .zip(&window[tau..])
            .map(|(a, b)| a * b)
            .sum();
    }
}

#[cfg(test)]
mod tests {
    use super::autocorr_conv;

    #[test]
    fn matches_reference_values() {
        // conv(a, fliplr(a)) for a = [1 2 3 4 5 6 7 8], upper half:
        // [204 168 133 100 70 44 23 8]
        let window = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let mut result = [0.0; 8];
        autocorr_conv(&window, &mut result);
        assert_eq!(result, [204.0, 168.0, 133.0, 100.0, 70.0, 44.0, 23.0, 8.0]);
    }

    #[test]
    fn partial_lag_count() {
        let window = [1.0, -1.0, 1.0, -1.0];
        let mut result = [0.0; 2];
        autocorr_conv(&window, &mut result);
        assert_eq!(result, [4.0, -3.0]);
    }

    #[test]
    fn empty_window() {
        let mut result: [f32; 0] = [];
        autocorr_conv(&[], &mut result);
    }

    #[test]
    #[should_panic]
    fn rejects_oversized_result() {
        let mut result = [0.0; 3];
        autocorr_conv(&[1.0, 2.0], &mut result);
    }
}
