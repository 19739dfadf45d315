//! Discretized weight simplex
//!
//! Candidates are produced lazily in canonical order: lexicographic over the
//! axis points, first model's weight outermost, last model's weight innermost.
//! Only the first `N - 1` weights are enumerated; the last is derived by
//! subtraction and kept only if it lands on an axis point and the tuple sums
//! to one within the configured tolerance. The resulting sequence is exactly
//! the filtered Cartesian product, in the same order.

use super::config::GridConfig;
use crate::error::{FusionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-negative per-model weights summing to one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct WeightTuple(Vec<f64>);

impl WeightTuple {
    /// Validate against the default grid tolerance
    pub fn new(weights: Vec<f64>) -> Result<Self> {
        Self::with_tolerance(weights, &GridConfig::default())
    }

    /// Validate against the tolerance of `grid`
    pub fn with_tolerance(weights: Vec<f64>, grid: &GridConfig) -> Result<Self> {
        if weights.is_empty() {
            return Err(FusionError::InvalidInput("Weight tuple is empty".to_string()));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(FusionError::InvalidInput(format!(
                "weight {} is not a finite non-negative number",
                w
            )));
        }
        let sum: f64 = weights.iter().sum();
        if !grid.is_close(sum, 1.0) {
            return Err(FusionError::InvalidInput(format!(
                "weights sum to {}, expected 1",
                sum
            )));
        }
        Ok(Self(weights))
    }

    /// `1/n` for every model
    pub fn equal(n_models: usize) -> Self {
        Self(vec![1.0 / n_models as f64; n_models])
    }

    /// All weight on model `k`.
    ///
    /// # Panics
    ///
    /// Panics if `k >= n_models`.
    pub fn one_hot(n_models: usize, k: usize) -> Self {
        let mut weights = vec![0.0; n_models];
        weights[k] = 1.0;
        Self(weights)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<f64>> for WeightTuple {
    type Error = FusionError;

    fn try_from(weights: Vec<f64>) -> Result<Self> {
        Self::new(weights)
    }
}

impl From<WeightTuple> for Vec<f64> {
    fn from(weights: WeightTuple) -> Self {
        weights.0
    }
}

impl fmt::Display for WeightTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|w| format_weight(*w)).collect();
        write!(f, "({})", parts.join(", "))
    }
}

fn format_weight(w: f64) -> String {
    let s = format!("{:.6}", w);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// The discretized simplex for a fixed number of models
#[derive(Debug, Clone)]
pub struct SimplexGrid {
    grid: GridConfig,
    axis: Vec<f64>,
    n_models: usize,
}

impl SimplexGrid {
    pub fn new(grid: &GridConfig, n_models: usize) -> Result<Self> {
        grid.validate()?;
        if n_models == 0 {
            return Err(FusionError::ConfigError(
                "weight search needs at least one model".to_string(),
            ));
        }
        Ok(Self {
            grid: grid.clone(),
            axis: grid.axis(),
            n_models,
        })
    }

    pub fn n_models(&self) -> usize {
        self.n_models
    }

    pub fn axis(&self) -> &[f64] {
        &self.axis
    }

    /// Size of the unfiltered Cartesian product, `points ^ N`.
    ///
    /// Enumeration visits `points ^ (N - 1)` prefixes, so this bounds the cost
    /// of [`candidates`](Self::candidates) and [`candidate_count`](Self::candidate_count).
    pub fn raw_size(&self) -> Option<u128> {
        let exp = u32::try_from(self.n_models).ok()?;
        (self.axis.len() as u128).checked_pow(exp)
    }

    /// Lazily enumerate valid tuples in canonical order
    pub fn candidates(&self) -> Candidates<'_> {
        Candidates {
            grid: self,
            free: vec![0; self.n_models - 1],
            exhausted: false,
        }
    }

    /// Number of valid tuples (walks the whole sequence)
    pub fn candidate_count(&self) -> usize {
        self.candidates().count()
    }

    /// Whether any tuple sums to one, without enumerating.
    ///
    /// Every tuple sum is `m * step` for some integer `m`, so the space is
    /// non-empty exactly when the multiple of `step` nearest to one is close
    /// to one; `(0, .., 0, m * step)` is then a candidate.
    pub fn has_candidates(&self) -> bool {
        let m = (1.0 / self.grid.step).round();
        self.grid.is_close(m * self.grid.step, 1.0)
    }

    /// Fail with `EmptySearchSpace` unless at least one tuple exists
    pub fn ensure_non_empty(&self) -> Result<()> {
        if !self.has_candidates() {
            return Err(FusionError::EmptySearchSpace {
                n_models: self.n_models,
                step: self.grid.step,
            });
        }
        Ok(())
    }

    fn derive_last(&self, free_sum: f64) -> Option<f64> {
        let remainder = 1.0 - free_sum;
        let j = (remainder / self.grid.step).round();
        if !(0.0..self.axis.len() as f64).contains(&j) {
            return None;
        }
        let last = self.axis[j as usize];
        self.grid.is_close(free_sum + last, 1.0).then_some(last)
    }
}

/// Iterator over valid weight tuples, see [`SimplexGrid::candidates`]
pub struct Candidates<'a> {
    grid: &'a SimplexGrid,
    free: Vec<usize>,
    exhausted: bool,
}

impl Candidates<'_> {
    /// Move the odometer of free indices one step; innermost digit fastest
    fn advance(&mut self) {
        let points = self.grid.axis.len();
        for digit in self.free.iter_mut().rev() {
            *digit += 1;
            if *digit < points {
                return;
            }
            *digit = 0;
        }
        self.exhausted = true;
    }
}

impl Iterator for Candidates<'_> {
    type Item = WeightTuple;

    fn next(&mut self) -> Option<WeightTuple> {
        while !self.exhausted {
            let axis = &self.grid.axis;
            let free_sum: f64 = self.free.iter().map(|&i| axis[i]).sum();
            let derived = self.grid.derive_last(free_sum);
            let weights = derived.map(|last| {
                let mut w: Vec<f64> = self.free.iter().map(|&i| axis[i]).collect();
                w.push(last);
                w
            });
            self.advance();
            if let Some(w) = weights {
                return Some(WeightTuple(w));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(grid: &GridConfig, n_models: usize) -> Vec<Vec<f64>> {
        let axis = grid.axis();
        let total = axis.len().pow(n_models as u32);
        (0..total)
            .map(|mut code| {
                let mut idx = vec![0; n_models];
                for slot in idx.iter_mut().rev() {
                    *slot = code % axis.len();
                    code /= axis.len();
                }
                idx.iter().map(|&i| axis[i]).collect::<Vec<f64>>()
            })
            .filter(|w| grid.is_close(w.iter().sum(), 1.0))
            .collect()
    }

    #[test]
    fn test_three_models_default_grid() {
        let simplex = SimplexGrid::new(&GridConfig::default(), 3).unwrap();
        assert_eq!(simplex.raw_size(), Some(1331));
        assert_eq!(simplex.candidate_count(), 66);
    }

    #[test]
    fn test_matches_filtered_cartesian_product() {
        for (step, n) in [(0.1, 3), (0.25, 4), (0.5, 2), (0.2, 1)] {
            let grid = GridConfig::new().with_step(step);
            let lazy: Vec<Vec<f64>> = SimplexGrid::new(&grid, n)
                .unwrap()
                .candidates()
                .map(Vec::<f64>::from)
                .collect();
            let expected = brute_force(&grid, n);
            assert_eq!(lazy.len(), expected.len(), "step {} n {}", step, n);
            for (a, b) in lazy.iter().zip(expected.iter()) {
                for (x, y) in a.iter().zip(b.iter()) {
                    assert!((x - y).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_canonical_order() {
        let simplex = SimplexGrid::new(&GridConfig::new().with_step(0.5), 3).unwrap();
        let tuples: Vec<Vec<f64>> = simplex.candidates().map(Vec::<f64>::from).collect();
        assert_eq!(
            tuples,
            vec![
                vec![0.0, 0.0, 1.0],
                vec![0.0, 0.5, 0.5],
                vec![0.0, 1.0, 0.0],
                vec![0.5, 0.0, 0.5],
                vec![0.5, 0.5, 0.0],
                vec![1.0, 0.0, 0.0],
            ]
        );
    }

    #[test]
    fn test_emptiness_check_matches_enumeration() {
        for step in [0.1, 0.2, 0.25, 0.3, 0.4, 0.45, 0.5, 0.7, 1.0 / 3.0, 1.0] {
            for n in 1..=3 {
                let simplex = SimplexGrid::new(&GridConfig::new().with_step(step), n).unwrap();
                assert_eq!(
                    simplex.has_candidates(),
                    simplex.candidates().next().is_some(),
                    "step {} models {}",
                    step,
                    n
                );
            }
        }
    }

    #[test]
    fn test_empty_space_detected_without_enumeration() {
        // 4^19 prefixes would never finish walking
        let simplex = SimplexGrid::new(&GridConfig::new().with_step(0.3), 20).unwrap();
        assert!(matches!(
            simplex.ensure_non_empty().unwrap_err(),
            FusionError::EmptySearchSpace { n_models: 20, .. }
        ));
    }

    #[test]
    #[should_panic]
    fn test_one_hot_out_of_range_panics() {
        let _ = WeightTuple::one_hot(2, 2);
    }

    #[test]
    fn test_single_model() {
        let simplex = SimplexGrid::new(&GridConfig::default(), 1).unwrap();
        let tuples: Vec<WeightTuple> = simplex.candidates().collect();
        assert_eq!(tuples, vec![WeightTuple::one_hot(1, 0)]);
    }

    #[test]
    fn test_empty_search_space() {
        let simplex = SimplexGrid::new(&GridConfig::new().with_step(0.3), 3).unwrap();
        assert_eq!(simplex.candidate_count(), 0);
        assert!(matches!(
            simplex.ensure_non_empty().unwrap_err(),
            FusionError::EmptySearchSpace { n_models: 3, .. }
        ));
    }

    #[test]
    fn test_weight_tuple_validation() {
        assert!(WeightTuple::new(vec![0.3, 0.3, 0.4]).is_ok());
        assert!(WeightTuple::new(vec![0.5, 0.6]).is_err());
        assert!(WeightTuple::new(vec![1.5, -0.5]).is_err());
        assert!(WeightTuple::new(vec![]).is_err());
    }

    #[test]
    fn test_weight_tuple_serde_validates() {
        let ok: WeightTuple = serde_json::from_str("[0.2, 0.8]").unwrap();
        assert_eq!(ok.as_slice(), &[0.2, 0.8]);
        assert!(serde_json::from_str::<WeightTuple>("[0.2, 0.2]").is_err());
    }

    #[test]
    fn test_display() {
        let w = WeightTuple::new(vec![0.30000000000000004, 0.3, 0.4]).unwrap();
        assert_eq!(w.to_string(), "(0.3, 0.3, 0.4)");
        assert_eq!(WeightTuple::one_hot(2, 1).to_string(), "(0, 1)");
    }
}
