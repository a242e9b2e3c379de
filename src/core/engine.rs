use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{debug, trace};

use super::rng::{Rng, derive_seed, entropy_seed};
use super::stats::{roi_efficiency, success_probability, summarize};
use super::types::{EXPERIENCE_BOOST_CAP, GrowthNoise, ScenarioParameters, SimulationResult};
use crate::error::{SimResult, SimulationError};

/// Trials per batch between cancellation checks.
const TRIAL_BATCH: u32 = 1_024;

/// Runs `trial_count` independent career projections and aggregates them.
///
/// With `rng_seed` set the result is bit-identical across calls. Without it a
/// fresh seed is drawn and reported back in `SimulationResult::seed`.
pub fn simulate(params: &ScenarioParameters, rng_seed: Option<u64>) -> SimResult<SimulationResult> {
    run(params, rng_seed, None)
}

/// Same as [`simulate`], but stops between batches once `cancel` is raised.
pub fn simulate_cancellable(
    params: &ScenarioParameters,
    rng_seed: Option<u64>,
    cancel: &AtomicBool,
) -> SimResult<SimulationResult> {
    run(params, rng_seed, Some(cancel))
}

pub fn validate_parameters(params: &ScenarioParameters) -> SimResult<()> {
    if params.trial_count == 0 {
        return Err(SimulationError::invalid("trial count must be > 0"));
    }

    if params.time_horizon_years == 0 {
        return Err(SimulationError::invalid("time horizon must be >= 1 year"));
    }

    if !params.discount_rate.is_finite() || params.discount_rate < 0.0 {
        return Err(SimulationError::invalid("discount rate must be >= 0"));
    }

    if !params.base_salary.is_finite() || params.base_salary < 0.0 {
        return Err(SimulationError::invalid("base salary must be >= 0"));
    }

    if !params.volatility.is_finite() || params.volatility < 0.0 {
        return Err(SimulationError::invalid("volatility must be >= 0"));
    }

    if !params.volatility_reduction.is_finite() || params.volatility_reduction < 0.0 {
        return Err(SimulationError::invalid("volatility reduction must be >= 0"));
    }

    if !params.annual_growth_rate.is_finite() || params.annual_growth_rate <= -1.0 {
        return Err(SimulationError::invalid("annual growth rate must be > -100%"));
    }

    if !(0.0..=1.0).contains(&params.take_home_fraction) {
        return Err(SimulationError::invalid(
            "take-home fraction must be between 0 and 1",
        ));
    }

    if !(0.0..=EXPERIENCE_BOOST_CAP).contains(&params.experience_boost) {
        return Err(SimulationError::invalid(format!(
            "experience boost must be between 0 and {EXPERIENCE_BOOST_CAP}"
        )));
    }

    if !params.total_cost.is_finite() || params.total_cost < 0.0 {
        return Err(SimulationError::invalid("total cost must be >= 0"));
    }

    if let GrowthNoise::Normal { sigma } = params.growth_noise {
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(SimulationError::invalid("growth noise sigma must be >= 0"));
        }
    }

    Ok(())
}

fn run(
    params: &ScenarioParameters,
    rng_seed: Option<u64>,
    cancel: Option<&AtomicBool>,
) -> SimResult<SimulationResult> {
    validate_parameters(params)?;

    let seed = rng_seed.unwrap_or_else(entropy_seed);
    debug!(
        seed,
        trials = params.trial_count,
        horizon = params.time_horizon_years,
        "starting career simulation"
    );

    let mut outcomes = Vec::with_capacity(params.trial_count as usize);
    let mut batch_start = 0_u32;
    while batch_start < params.trial_count {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            debug!(completed = batch_start, "simulation cancelled");
            return Err(SimulationError::Cancelled);
        }

        let batch_end = batch_start
            .saturating_add(TRIAL_BATCH)
            .min(params.trial_count);
        let batch: Vec<f64> = (batch_start..batch_end)
            .into_par_iter()
            .map(|trial_id| {
                let mut rng = Rng::new(derive_seed(seed, trial_id));
                simulate_trial(params, &mut rng)
            })
            .collect();
        outcomes.extend(batch);
        trace!(completed = batch_end, "trial batch finished");

        batch_start = batch_end;
    }

    build_result(seed, outcomes, params.total_cost)
}

/// One career path: sampled starting salary compounded and discounted over
/// the horizon, net of the total cost of attendance.
fn simulate_trial(params: &ScenarioParameters, rng: &mut Rng) -> f64 {
    let std_dev = params.base_salary * params.effective_volatility();
    let drawn = rng.normal(params.base_salary, std_dev);
    let start_salary = (drawn * (1.0 + params.experience_boost)).max(0.0);

    let mut salary = start_salary;
    let mut career_cashflow = 0.0;
    for year in 0..params.time_horizon_years {
        let take_home = salary * params.take_home_fraction;
        career_cashflow += take_home / (1.0 + params.discount_rate).powi(year as i32);

        let noise = match params.growth_noise {
            GrowthNoise::Off => 0.0,
            GrowthNoise::Normal { sigma } => rng.normal(0.0, sigma),
        };
        salary *= 1.0 + params.annual_growth_rate + noise;
    }

    career_cashflow - params.total_cost
}

fn build_result(seed: u64, outcomes: Vec<f64>, total_cost: f64) -> SimResult<SimulationResult> {
    let summary = summarize(&outcomes)?;
    Ok(SimulationResult {
        seed,
        success_probability: success_probability(&outcomes),
        roi: roi_efficiency(summary.median, total_cost),
        summary,
        outcomes,
        total_cost,
    })
}
