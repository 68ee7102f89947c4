//! Small descriptive statistics shared by the metric groups.

use num_traits::Float;

pub fn mean<T: Float>(data: &[T]) -> Option<T> {
    if data.is_empty() {
        return None;
    }
    let sum = data.iter().fold(T::zero(), |acc, &x| acc + x);
    T::from(data.len()).map(|n| sum / n)
}

/// Variance with `ddof` delta degrees of freedom (0 = population, 1 = sample).
pub fn variance<T: Float>(data: &[T], ddof: usize) -> Option<T> {
    if data.len() <= ddof {
        return None;
    }
    let m = mean(data)?;
    let ss = data.iter().fold(T::zero(), |acc, &x| acc + (x - m) * (x - m));
    T::from(data.len() - ddof).map(|n| ss / n)
}

pub fn std_dev<T: Float>(data: &[T], ddof: usize) -> Option<T> {
    variance(data, ddof).map(|v| v.sqrt())
}

pub fn median<T: Float>(data: &[T]) -> Option<T> {
    if data.is_empty() {
        return None;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        let two = T::one() + T::one();
        Some((sorted[mid - 1] + sorted[mid]) / two)
    } else {
        Some(sorted[mid])
    }
}

pub fn min_max<T: Float>(data: &[T]) -> Option<(T, T)> {
    let first = *data.first()?;
    Some(
        data.iter()
            .fold((first, first), |(lo, hi), &x| (lo.min(x), hi.max(x))),
    )
}

/// Composite trapezoidal rule over (x, y) samples.
pub fn trapezoid<T: Float>(x: &[T], y: &[T]) -> T {
    let two = T::one() + T::one();
    x.windows(2)
        .zip(y.windows(2))
        .fold(T::zero(), |acc, (xs, ys)| {
            acc + (xs[1] - xs[0]) * (ys[0] + ys[1]) / two
        })
}
