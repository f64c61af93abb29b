use argmin::{
    core::{CostFunction, Error, Executor, TerminationReason, TerminationStatus},
    solver::neldermead::NelderMead,
};
use ndarray::ArrayView1;
use thiserror::Error;

use super::bounds::Bound;

/// Cost reported for parameter sets that produce non-finite predictions
const PENALTY: f64 = 1e150;

/// Simplex standard-deviation tolerance, relative to the cost at the initial guess
const SD_TOLERANCE_REL: f64 = 1e-12;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("Optimal parameters not found: number of function evaluations exceeded {max_iters}")]
    DidNotConverge { max_iters: u64 },

    #[error("Parameter dimension mismatch: {guess} initial values, {bounds} bounds")]
    DimensionMismatch { guess: usize, bounds: usize },

    #[error("Optimizer failed: {0}")]
    Solver(String),
}

impl From<Error> for FitError {
    fn from(err: Error) -> Self {
        FitError::Solver(err.to_string())
    }
}

/// Outcome of a converged fit, in external (physical) parameter space
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub params: Vec<f64>,
    /// Residual sum of squares at `params`
    pub sse: f64,
    pub iterations: u64,
}

/// Sum-of-squares objective for `y ≈ model(params, t)`
struct CurveFit<'a, M> {
    model: M,
    t: ArrayView1<'a, f64>,
    y: ArrayView1<'a, f64>,
    bounds: &'a [Bound],
}

impl<M> CurveFit<'_, M>
where
    M: Fn(&[f64], f64) -> f64,
{
    fn external(&self, internal: &[f64]) -> Vec<f64> {
        internal
            .iter()
            .zip(self.bounds)
            .map(|(u, bound)| bound.to_external(*u))
            .collect()
    }

    fn sse(&self, params: &[f64]) -> f64 {
        let sse: f64 = self
            .t
            .iter()
            .zip(self.y.iter())
            .map(|(&t, &y)| (y - (self.model)(params, t)).powi(2))
            .sum();
        if sse.is_finite() {
            sse
        } else {
            PENALTY
        }
    }
}

impl<M> CostFunction for CurveFit<'_, M>
where
    M: Fn(&[f64], f64) -> f64,
{
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, internal: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.sse(&self.external(internal)))
    }
}

/// Bounded nonlinear least squares by Nelder–Mead
///
/// `guess` and `bounds` are given in physical units; the guess is clamped into
/// its bound first. Hitting `max_iters` before the simplex collapses is
/// reported as [`FitError::DidNotConverge`].
pub fn fit_least_squares<'a, M>(
    model: M,
    t: ArrayView1<'a, f64>,
    y: ArrayView1<'a, f64>,
    guess: &[f64],
    bounds: &'a [Bound],
    max_iters: u64,
) -> Result<FitOutcome, FitError>
where
    M: Fn(&[f64], f64) -> f64,
{
    if guess.len() != bounds.len() {
        return Err(FitError::DimensionMismatch {
            guess: guess.len(),
            bounds: bounds.len(),
        });
    }

    let problem = CurveFit {
        model,
        t,
        y,
        bounds,
    };

    let start: Vec<f64> = guess
        .iter()
        .zip(bounds)
        .map(|(g, bound)| bound.to_internal(bound.clamp(*g)))
        .collect();
    let initial_cost = problem.sse(&problem.external(&start));
    let tolerance = SD_TOLERANCE_REL * initial_cost.max(f64::EPSILON);

    let simplex = create_initial_simplex(&start);
    let solver: NelderMead<Vec<f64>, f64> =
        NelderMead::new(simplex).with_sd_tolerance(tolerance)?;
    let res = Executor::new(problem, solver)
        .configure(|state| state.max_iters(max_iters))
        .run()?;

    if matches!(
        res.state.termination_status,
        TerminationStatus::Terminated(TerminationReason::MaxItersReached)
    ) {
        return Err(FitError::DidNotConverge { max_iters });
    }

    let best = res
        .state
        .best_param
        .ok_or_else(|| FitError::Solver("no parameters returned".to_string()))?;
    let params: Vec<f64> = best
        .iter()
        .zip(bounds)
        .map(|(u, bound)| bound.to_external(*u))
        .collect();

    Ok(FitOutcome {
        params,
        sse: res.state.best_cost,
        iterations: res.state.iter,
    })
}

fn create_initial_simplex(initial_point: &[f64]) -> Vec<Vec<f64>> {
    let num_dimensions = initial_point.len();
    let perturbation_percentage = 0.05;

    let mut vertices = Vec::with_capacity(num_dimensions + 1);
    vertices.push(initial_point.to_vec());

    for i in 0..num_dimensions {
        let perturbation = if initial_point[i] == 0.0 {
            0.05 // zero components get an absolute step
        } else {
            perturbation_percentage * initial_point[i]
        };

        let mut perturbed_point = initial_point.to_owned();
        perturbed_point[i] += perturbation;
        vertices.push(perturbed_point);
    }

    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array1;

    fn line(p: &[f64], t: f64) -> f64 {
        p[0] + p[1] * t
    }

    #[test]
    fn test_fits_a_line() {
        let t = Array1::linspace(0.0, 1.0, 50);
        let y = t.mapv(|t| 2.0 - 3.0 * t);

        let outcome = fit_least_squares(
            line,
            t.view(),
            y.view(),
            &[0.5, 0.5],
            &[Bound::Free, Bound::Free],
            2000,
        )
        .unwrap();

        assert_relative_eq!(outcome.params[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(outcome.params[1], -3.0, epsilon = 1e-4);
        assert!(outcome.sse < 1e-6);
    }

    #[test]
    fn test_respects_bounds() {
        let t = Array1::linspace(0.0, 1.0, 20);
        let y = t.mapv(|t| 5.0 * t);

        // Slope is capped below the true value
        let outcome = fit_least_squares(
            |p: &[f64], t: f64| p[0] * t,
            t.view(),
            y.view(),
            &[1.0],
            &[Bound::interval(0.0, 2.0).unwrap()],
            2000,
        )
        .unwrap();

        assert!(outcome.params[0] <= 2.0);
        assert!(outcome.params[0] > 1.9);
    }

    #[test]
    fn test_iteration_cap_is_non_convergence() {
        let t = Array1::linspace(0.0, 1.0, 50);
        let y = t.mapv(|t| 2.0 - 3.0 * t);

        let err = fit_least_squares(
            line,
            t.view(),
            y.view(),
            &[100.0, 100.0],
            &[Bound::Free, Bound::Free],
            2,
        )
        .unwrap_err();

        assert_eq!(err, FitError::DidNotConverge { max_iters: 2 });
    }

    #[test]
    fn test_dimension_mismatch() {
        let t = Array1::linspace(0.0, 1.0, 5);
        let err =
            fit_least_squares(line, t.view(), t.view(), &[1.0], &[], 10).unwrap_err();
        assert_eq!(
            err,
            FitError::DimensionMismatch {
                guess: 1,
                bounds: 0
            }
        );
    }
}
