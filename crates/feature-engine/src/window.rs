//! Rolling Window Primitives

use std::collections::VecDeque;

/// Fixed-length rolling sum that overwrites its oldest value when full.
///
/// Until `capacity` values have been pushed the sum covers the partial
/// window, so the first value's sum is the value itself.
#[derive(Debug, Clone)]
pub struct RollingSum {
    window: VecDeque<f64>,
    capacity: usize,
    sum: f64,
}

impl RollingSum {
    /// Create a rolling sum over the last `capacity` values; a zero
    /// capacity is treated as 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            sum: 0.0,
        }
    }

    /// Push a value and return the sum of the current window
    pub fn push(&mut self, value: f64) -> f64 {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(value);
        self.sum = self.window.iter().sum();
        self.sum
    }

    /// Sum of the current window
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Number of values currently in the window
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Clear the window
    pub fn reset(&mut self) {
        self.window.clear();
        self.sum = 0.0;
    }
}

/// Rolling sums with partial windows at the start of the series
pub fn rolling_sum(values: &[f64], window: usize) -> Vec<f64> {
    let mut rolling = RollingSum::new(window);
    values.iter().map(|&v| rolling.push(v)).collect()
}

/// First difference, with 0 for the first element
pub fn first_difference(values: &[f64]) -> Vec<f64> {
    let mut previous: Option<f64> = None;
    values
        .iter()
        .map(|&v| {
            let diff = previous.map_or(0.0, |p| v - p);
            previous = Some(v);
            diff
        })
        .collect()
}
