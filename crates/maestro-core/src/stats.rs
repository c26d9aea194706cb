/// Folds one more observation into an arithmetic running average.
///
/// `count` is the number of observations *including* `value`, so the first
/// call passes `count == 1` and returns `value` unchanged. A `count` of zero
/// leaves `previous` untouched.
#[must_use]
pub fn running_average(previous: f64, count: u64, value: f64) -> f64 {
    if count == 0 {
        return previous;
    }
    let count = count as f64;
    previous.mul_add(count - 1.0, value) / count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_is_the_average() {
        assert!((running_average(0.0, 1, 4.5) - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_identical_values_are_stable() {
        let mut average = 0.0;
        for count in 1..=250 {
            average = running_average(average, count, 7.25);
        }
        assert!((average - 7.25).abs() < 1e-9);
    }

    #[test]
    fn test_matches_arithmetic_mean() {
        let values = [1.0, 2.0, 6.0, 3.0];
        let mut average = 0.0;
        for (index, value) in values.iter().enumerate() {
            average = running_average(average, index as u64 + 1, *value);
        }
        assert!((average - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_count_is_noop() {
        assert!((running_average(2.0, 0, 9.0) - 2.0).abs() < f64::EPSILON);
    }
}
