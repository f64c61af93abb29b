//! Membrane time constant by exponential fitting
//!
//! The fit window `[stim_start, stim_start + fit_duration)` is cut from the
//! trace and re-zeroed so the first fitted sample sits at t = 0. The models are
//!
//! ```text
//! mono: V(t) = V_ss + (V_0 - V_ss)·exp(-t/τ)
//! bi:   V(t) = V_ss + A_fast·exp(-t/τ_fast) + A_slow·exp(-t/τ_slow)
//! ```
//!
//! with every τ bounded to `tau_bounds_s` and voltages/amplitudes free.

use ndarray::{s, Array1};

use super::calc;
use super::error::PassiveError;
use super::types::{BiExpFit, MonoExpFit, TauModel, TauOptions, TauResult};
use crate::data::Trace;
use crate::optimize::{fit_least_squares, Bound, FitError, FitOutcome};

/// Initial τ for the mono-exponential fit (s)
const MONO_TAU_GUESS: f64 = 0.01;

/// Fit the configured exponential model and return the time constant(s)
///
/// Failures are logged and returned: too few samples in the window, optimizer
/// non-convergence within the evaluation cap, or non-finite parameters.
pub fn calculate_tau(trace: &Trace, options: &TauOptions) -> Result<TauResult, PassiveError> {
    let window = options.fit_window()?;
    let (tau_min, tau_max) = options.tau_bounds_s;
    let tau_bound =
        Bound::interval(tau_min, tau_max).ok_or_else(|| PassiveError::InvalidParameter {
            param: "tau_bounds".to_string(),
            value: format!("({}, {})", tau_min, tau_max),
        })?;

    let Some((v_fit, t_abs)) = trace.slice_with_time(&window) else {
        tracing::warn!(
            start = window.start(),
            end = window.end(),
            "no samples in tau fit window"
        );
        return Err(PassiveError::EmptyWindow {
            name: "fit",
            start: window.start(),
            end: window.end(),
        });
    };

    let required = options.model.min_samples();
    if v_fit.len() < required {
        tracing::warn!(
            n = v_fit.len(),
            required,
            model = %options.model,
            "not enough samples for tau fit"
        );
        return Err(PassiveError::InsufficientSamples {
            n: v_fit.len(),
            required,
        });
    }

    if let Some(i) = v_fit.iter().position(|v| !v.is_finite()) {
        tracing::warn!(index = i, "non-finite sample in tau fit window");
        return Err(PassiveError::InvalidParameter {
            param: "trace".to_string(),
            value: format!("non-finite sample at t = {} s in fit window", t_abs[i]),
        });
    }

    let t0 = t_abs[0];
    let t_fit = t_abs.mapv(|t| t - t0);
    let v_0 = v_fit[0];
    let tail = v_fit.slice(s![v_fit.len().saturating_sub(5)..]);
    let v_ss_guess = calc::mean(tail).unwrap_or(v_0);

    let result = match options.model {
        TauModel::Mono => fit_mono(&t_fit, &v_fit, v_0, v_ss_guess, tau_bound, options),
        TauModel::Bi => fit_bi(&t_fit, &v_fit, v_0, v_ss_guess, tau_bound, options),
    };

    match &result {
        Ok(tau) => tracing::debug!(
            model = %options.model,
            tau_ms = tau.membrane_tau_ms(),
            r_squared = tau.r_squared(),
            "tau fit converged"
        ),
        Err(PassiveError::Fit(err @ FitError::DidNotConverge { .. })) => {
            tracing::warn!(%err, model = %options.model, "tau fit did not converge")
        }
        Err(err) => tracing::error!(
            %err,
            model = %options.model,
            stim_start_s = options.stim_start_s,
            fit_duration_s = options.fit_duration_s,
            n_samples = v_fit.len(),
            "tau fit failed"
        ),
    }
    result
}

fn fit_mono(
    t: &Array1<f64>,
    v: &Array1<f64>,
    v_0: f64,
    v_ss_guess: f64,
    tau_bound: Bound,
    options: &TauOptions,
) -> Result<TauResult, PassiveError> {
    let outcome = fit_least_squares(
        mono_exponential,
        t.view(),
        v.view(),
        &[v_ss_guess, v_0, MONO_TAU_GUESS],
        &[Bound::Free, Bound::Free, tau_bound],
        options.max_evals(),
    )?;
    ensure_finite(&outcome)?;

    let (r_squared, rmse_mv) = goodness_of_fit(v, &outcome);
    let p = &outcome.params;
    Ok(TauResult::Mono(MonoExpFit {
        tau_ms: p[2] * 1000.0,
        v_ss: p[0],
        v_0: p[1],
        r_squared,
        rmse_mv,
        n_samples: v.len(),
    }))
}

fn fit_bi(
    t: &Array1<f64>,
    v: &Array1<f64>,
    v_0: f64,
    v_ss_guess: f64,
    tau_bound: Bound,
    options: &TauOptions,
) -> Result<TauResult, PassiveError> {
    let (_, tau_max) = options.tau_bounds_s;
    let deflection = v_0 - v_ss_guess;
    let guess = [
        v_ss_guess,
        0.6 * deflection,
        0.005_f64.min(0.1 * tau_max),
        0.4 * deflection,
        0.05_f64.min(0.5 * tau_max),
    ];

    let outcome = fit_least_squares(
        bi_exponential,
        t.view(),
        v.view(),
        &guess,
        &[Bound::Free, Bound::Free, tau_bound, Bound::Free, tau_bound],
        options.max_evals(),
    )?;
    ensure_finite(&outcome)?;

    let (r_squared, rmse_mv) = goodness_of_fit(v, &outcome);
    let p = &outcome.params;
    let (mut amplitude_fast, mut tau_fast) = (p[1], p[2]);
    let (mut amplitude_slow, mut tau_slow) = (p[3], p[4]);
    if tau_fast > tau_slow {
        std::mem::swap(&mut tau_fast, &mut tau_slow);
        std::mem::swap(&mut amplitude_fast, &mut amplitude_slow);
    }

    Ok(TauResult::Bi(BiExpFit {
        tau_fast_ms: tau_fast * 1000.0,
        tau_slow_ms: tau_slow * 1000.0,
        amplitude_fast,
        amplitude_slow,
        v_ss: p[0],
        r_squared,
        rmse_mv,
        n_samples: v.len(),
    }))
}

/// `[V_ss, V_0, τ]`
fn mono_exponential(p: &[f64], t: f64) -> f64 {
    p[0] + (p[1] - p[0]) * (-t / p[2]).exp()
}

/// `[V_ss, A_fast, τ_fast, A_slow, τ_slow]`
fn bi_exponential(p: &[f64], t: f64) -> f64 {
    p[0] + p[1] * (-t / p[2]).exp() + p[3] * (-t / p[4]).exp()
}

fn ensure_finite(outcome: &FitOutcome) -> Result<(), PassiveError> {
    if outcome.params.iter().all(|p| p.is_finite()) {
        Ok(())
    } else {
        Err(PassiveError::NonFiniteFit)
    }
}

fn goodness_of_fit(v: &Array1<f64>, outcome: &FitOutcome) -> (f64, f64) {
    let n = v.len() as f64;
    let r_squared = calc::coefficient_of_determination(&v.to_vec(), outcome.sse);
    (r_squared, (outcome.sse / n).sqrt())
}

/// Membrane capacitance (pF) from a time constant (ms) and input resistance (MOhm)
///
/// `Cm = τ / Rin`; ms / MOhm is nF, reported here in pF.
pub fn calculate_capacitance(tau_ms: f64, rin_mohm: f64) -> Result<f64, PassiveError> {
    if !tau_ms.is_finite() || tau_ms <= 0.0 {
        return Err(PassiveError::InvalidParameter {
            param: "tau_ms".to_string(),
            value: tau_ms.to_string(),
        });
    }
    if !rin_mohm.is_finite() || rin_mohm <= 0.0 {
        return Err(PassiveError::InvalidParameter {
            param: "rin_mohm".to_string(),
            value: rin_mohm.to_string(),
        });
    }
    Ok(tau_ms / rin_mohm * 1000.0)
}
