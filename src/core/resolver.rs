use tracing::debug;

use super::catalog::MANDATORY_FEES;
use super::engine::validate_parameters;
use super::types::{
    CostInputs, CostProfile, EXPERIENCE_BOOST_CAP, Experience, IncomeBracket, MajorProfile,
    MajorSelection, ProfileInputs, Residency, SalaryAdjustments, ScenarioParameters,
};
use crate::error::{SimResult, SimulationError};

const GPA_BONUS_FLOOR: f64 = 3.0;
const GPA_BONUS_PER_POINT: f64 = 0.08;
const MAX_GPA: f64 = 4.0;
const GROWTH_BONUS_PER_WORK_YEAR: f64 = 0.005;
/// Volatility offset granted for any consistent volunteer involvement.
const VOLUNTEER_VOLATILITY_REDUCTION: f64 = 0.02;

/// Merges major, cost, and experience inputs into one validated
/// `ScenarioParameters`. Pure; draws no randomness.
pub fn resolve_scenario(inputs: &ProfileInputs) -> SimResult<ScenarioParameters> {
    let major = resolve_major(inputs.major)?;
    let costs = resolve_costs(&inputs.costs)?;
    let boost = experience_boost(&inputs.experience);
    let salary_multiplier = salary_multiplier(&inputs.adjustments)?;

    if inputs.adjustments.work_experience_years > inputs.costs.years_enrolled {
        return Err(SimulationError::invalid(
            "work experience years cannot exceed years enrolled",
        ));
    }
    let growth_bonus = inputs.adjustments.work_experience_years as f64 * GROWTH_BONUS_PER_WORK_YEAR;

    let settings = &inputs.settings;
    let volunteer_reduction = if inputs.experience.volunteer_roles.is_empty() {
        0.0
    } else {
        VOLUNTEER_VOLATILITY_REDUCTION
    };
    let params = ScenarioParameters {
        base_salary: major.base_salary * salary_multiplier,
        annual_growth_rate: major.annual_growth_rate + growth_bonus,
        volatility: major.volatility,
        volatility_reduction: volunteer_reduction + settings.volatility_reduction,
        upside_bonus: major.upside_bonus,
        experience_boost: boost,
        total_cost: costs.total_cost,
        time_horizon_years: settings.time_horizon_years,
        discount_rate: settings.discount_rate,
        trial_count: settings.trial_count,
        take_home_fraction: settings.take_home_fraction,
        growth_noise: settings.growth_noise,
    };
    validate_parameters(&params)?;

    debug!(
        base_salary = params.base_salary,
        experience_boost = params.experience_boost,
        total_cost = params.total_cost,
        "resolved scenario parameters"
    );
    Ok(params)
}

pub fn resolve_major(selection: MajorSelection) -> SimResult<MajorProfile> {
    let profile = match selection {
        MajorSelection::Catalog(major) => major.profile(),
        MajorSelection::Custom(custom) => {
            let missing = |field: &str| {
                SimulationError::invalid(format!("custom major is missing {field}"))
            };
            MajorProfile {
                base_salary: custom.base_salary.ok_or_else(|| missing("base salary"))?,
                annual_growth_rate: custom
                    .annual_growth_rate
                    .ok_or_else(|| missing("annual growth rate"))?,
                volatility: custom.volatility.ok_or_else(|| missing("volatility"))?,
                upside_bonus: custom.upside_bonus.unwrap_or(0.0),
            }
        }
    };

    if !profile.base_salary.is_finite() || profile.base_salary <= 0.0 {
        return Err(SimulationError::invalid("major base salary must be > 0"));
    }
    if !profile.annual_growth_rate.is_finite() || profile.annual_growth_rate <= -1.0 {
        return Err(SimulationError::invalid(
            "major annual growth rate must be > -100%",
        ));
    }
    if !profile.volatility.is_finite() || profile.volatility < 0.0 {
        return Err(SimulationError::invalid("major volatility must be >= 0"));
    }
    if !profile.upside_bonus.is_finite() || profile.upside_bonus < 0.0 {
        return Err(SimulationError::invalid("major upside bonus must be >= 0"));
    }
    Ok(profile)
}

/// Tuition after the income-conditioned resident waiver: the lowest bracket
/// pays nothing, the second bracket pays half.
pub fn net_tuition(tuition: f64, residency: Residency, bracket: IncomeBracket) -> f64 {
    match (residency, bracket) {
        (Residency::InState, IncomeBracket::Under65k) => 0.0,
        (Residency::InState, IncomeBracket::From65kTo100k) => tuition * 0.5,
        _ => tuition,
    }
}

pub fn resolve_costs(costs: &CostInputs) -> SimResult<CostProfile> {
    for (name, value) in [
        ("scholarships", costs.scholarships),
        ("side income", costs.side_income),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(SimulationError::invalid(format!("{name} must be >= 0")));
        }
    }
    if costs.years_enrolled == 0 {
        return Err(SimulationError::invalid("years enrolled must be > 0"));
    }

    let tuition = costs.residency.annual_tuition();
    let tuition_net = net_tuition(tuition, costs.residency, costs.income_bracket);
    let housing = costs.housing.annual_cost();
    let meal_plan = costs.meal_plan.annual_cost();
    let gross_annual_cost = tuition_net + MANDATORY_FEES + housing + meal_plan;
    let net_annual_cost = (gross_annual_cost - costs.scholarships - costs.side_income).max(0.0);

    Ok(CostProfile {
        tuition,
        tuition_net,
        mandatory_fees: MANDATORY_FEES,
        housing,
        meal_plan,
        gross_annual_cost,
        net_annual_cost,
        years_enrolled: costs.years_enrolled,
        total_cost: net_annual_cost * costs.years_enrolled as f64,
    })
}

pub fn experience_boost(experience: &Experience) -> f64 {
    let internships: f64 = experience.internships.iter().map(|t| t.weight()).sum();
    let certifications: f64 = experience.certifications.iter().map(|c| c.weight()).sum();
    let leadership: f64 = experience.volunteer_roles.iter().map(|l| l.weight()).sum();
    (internships + certifications + leadership).clamp(0.0, EXPERIENCE_BOOST_CAP)
}

fn salary_multiplier(adjustments: &SalaryAdjustments) -> SimResult<f64> {
    let gpa_multiplier = match adjustments.gpa {
        None => 1.0,
        Some(gpa) if gpa.is_finite() && (0.0..=MAX_GPA).contains(&gpa) => {
            1.0 + (gpa - GPA_BONUS_FLOOR).max(0.0) * GPA_BONUS_PER_POINT
        }
        Some(_) => return Err(SimulationError::invalid("gpa must be between 0 and 4")),
    };
    Ok(gpa_multiplier * adjustments.location.salary_multiplier())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{
        CertificationImpact, CustomMajor, Housing, InternshipTier, LeadershipLevel, Major,
        MealPlan, ModelSettings, TargetLocation,
    };
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_costs() -> CostInputs {
        CostInputs {
            residency: Residency::InState,
            income_bracket: IncomeBracket::Over100k,
            scholarships: 0.0,
            side_income: 0.0,
            housing: Housing::OnCampus,
            meal_plan: MealPlan::Standard,
            years_enrolled: 4,
        }
    }

    fn sample_inputs() -> ProfileInputs {
        ProfileInputs {
            major: MajorSelection::Catalog(Major::ComputerScience),
            costs: sample_costs(),
            experience: Experience::default(),
            adjustments: SalaryAdjustments::default(),
            settings: ModelSettings::default(),
        }
    }

    #[test]
    fn aid_policy_depends_only_on_residency_and_bracket() {
        let tuition = 13_500.0;
        assert_approx(
            net_tuition(tuition, Residency::InState, IncomeBracket::Under65k),
            0.0,
        );
        assert_approx(
            net_tuition(tuition, Residency::InState, IncomeBracket::From65kTo100k),
            6_750.0,
        );
        assert_approx(
            net_tuition(tuition, Residency::InState, IncomeBracket::Over100k),
            tuition,
        );
        for bracket in [
            IncomeBracket::Under65k,
            IncomeBracket::From65kTo100k,
            IncomeBracket::Over100k,
        ] {
            assert_approx(net_tuition(tuition, Residency::OutOfState, bracket), tuition);
        }
    }

    #[test]
    fn resolve_costs_sums_components_over_enrollment() {
        let profile = resolve_costs(&sample_costs()).expect("valid costs");
        let gross = 13_500.0 + MANDATORY_FEES + 9_800.0 + 4_900.0;
        assert_approx(profile.gross_annual_cost, gross);
        assert_approx(profile.net_annual_cost, gross);
        assert_approx(profile.total_cost, gross * 4.0);
    }

    #[test]
    fn resolve_costs_respects_configured_enrollment_length() {
        let mut costs = sample_costs();
        costs.years_enrolled = 5;
        let profile = resolve_costs(&costs).expect("valid costs");
        assert_approx(profile.total_cost, profile.net_annual_cost * 5.0);
    }

    #[test]
    fn resolve_costs_rejects_negative_aid() {
        let mut costs = sample_costs();
        costs.scholarships = -1.0;
        let err = resolve_costs(&costs).expect_err("negative scholarships");
        assert!(err.to_string().contains("scholarships"));
    }

    #[test]
    fn resolve_costs_rejects_zero_enrollment() {
        let mut costs = sample_costs();
        costs.years_enrolled = 0;
        assert!(resolve_costs(&costs).is_err());
    }

    #[test]
    fn custom_major_requires_core_fields() {
        let custom = CustomMajor {
            base_salary: Some(70_000.0),
            annual_growth_rate: None,
            volatility: Some(0.1),
            upside_bonus: None,
        };
        let err = resolve_major(MajorSelection::Custom(custom)).expect_err("missing growth");
        assert!(matches!(err, SimulationError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("annual growth rate"));
    }

    #[test]
    fn custom_major_defaults_upside_to_zero() {
        let custom = CustomMajor {
            base_salary: Some(70_000.0),
            annual_growth_rate: Some(0.03),
            volatility: Some(0.1),
            upside_bonus: None,
        };
        let profile = resolve_major(MajorSelection::Custom(custom)).expect("complete custom");
        assert_approx(profile.upside_bonus, 0.0);
        assert_approx(profile.base_salary, 70_000.0);
    }

    #[test]
    fn experience_boost_sums_weights() {
        let experience = Experience {
            internships: vec![InternshipTier::Fortune500, InternshipTier::CampusLocal],
            certifications: vec![CertificationImpact::High],
            volunteer_roles: vec![LeadershipLevel::Coordinator],
        };
        assert_approx(experience_boost(&experience), 0.08 + 0.03 + 0.05 + 0.015);
    }

    #[test]
    fn experience_boost_saturates_at_cap() {
        let experience = Experience {
            internships: vec![InternshipTier::TopTier; 10],
            ..Experience::default()
        };
        assert_approx(experience_boost(&experience), EXPERIENCE_BOOST_CAP);
    }

    #[test]
    fn resolve_scenario_applies_salary_adjustments() {
        let mut inputs = sample_inputs();
        inputs.adjustments = SalaryAdjustments {
            gpa: Some(3.5),
            location: TargetLocation::NycSf,
            work_experience_years: 2,
        };
        let params = resolve_scenario(&inputs).expect("valid inputs");
        assert_approx(params.base_salary, 88_000.0 * 1.04 * 1.20);
        assert_approx(params.annual_growth_rate, 0.05 + 0.01);
    }

    #[test]
    fn volunteering_lowers_salary_volatility() {
        let mut inputs = sample_inputs();
        let baseline = resolve_scenario(&inputs).expect("valid inputs");
        assert_approx(baseline.volatility_reduction, 0.0);

        inputs.experience.volunteer_roles = vec![LeadershipLevel::Member];
        let volunteer = resolve_scenario(&inputs).expect("valid inputs");
        assert_approx(volunteer.volatility_reduction, VOLUNTEER_VOLATILITY_REDUCTION);
        assert!(volunteer.effective_volatility() < baseline.effective_volatility());

        inputs.experience.volunteer_roles.push(LeadershipLevel::President);
        inputs.settings.volatility_reduction = 0.03;
        let stacked = resolve_scenario(&inputs).expect("valid inputs");
        assert_approx(stacked.volatility_reduction, VOLUNTEER_VOLATILITY_REDUCTION + 0.03);
    }

    #[test]
    fn resolve_scenario_rejects_out_of_range_gpa() {
        let mut inputs = sample_inputs();
        inputs.adjustments.gpa = Some(4.3);
        let err = resolve_scenario(&inputs).expect_err("gpa above 4");
        assert!(err.to_string().contains("gpa"));
    }

    #[test]
    fn resolve_scenario_rejects_zero_trials() {
        let mut inputs = sample_inputs();
        inputs.settings.trial_count = 0;
        let err = resolve_scenario(&inputs).expect_err("zero trials");
        assert!(err.to_string().contains("trial count"));
    }

    #[test]
    fn resolve_scenario_carries_upside_without_applying_it() {
        let params = resolve_scenario(&sample_inputs()).expect("valid inputs");
        let profile = Major::ComputerScience.profile();
        assert_approx(params.upside_bonus, profile.upside_bonus);
        assert_approx(params.base_salary, profile.base_salary);
    }

    proptest! {
        #[test]
        fn prop_net_annual_cost_is_never_negative(
            scholarships in 0.0f64..200_000.0,
            side_income in 0.0f64..100_000.0,
            out_of_state in proptest::bool::ANY,
            bracket in 0u8..3,
        ) {
            let mut costs = sample_costs();
            costs.scholarships = scholarships;
            costs.side_income = side_income;
            costs.residency = if out_of_state { Residency::OutOfState } else { Residency::InState };
            costs.income_bracket = match bracket {
                0 => IncomeBracket::Under65k,
                1 => IncomeBracket::From65kTo100k,
                _ => IncomeBracket::Over100k,
            };
            let profile = resolve_costs(&costs).expect("valid costs");
            prop_assert!(profile.net_annual_cost >= 0.0);
            prop_assert!(profile.total_cost >= 0.0);
            prop_assert!(profile.net_annual_cost <= profile.gross_annual_cost);
        }

        #[test]
        fn prop_boost_is_monotone_and_capped(
            internships in proptest::collection::vec(0u8..4, 0..12),
            extra in 0u8..4,
        ) {
            let tier = |t: u8| match t {
                0 => InternshipTier::CampusLocal,
                1 => InternshipTier::Regional,
                2 => InternshipTier::Fortune500,
                _ => InternshipTier::TopTier,
            };
            let mut experience = Experience {
                internships: internships.into_iter().map(tier).collect(),
                ..Experience::default()
            };
            let before = experience_boost(&experience);
            experience.internships.push(tier(extra));
            let after = experience_boost(&experience);

            prop_assert!(before >= 0.0);
            prop_assert!(after >= before);
            prop_assert!(after <= EXPERIENCE_BOOST_CAP);
            if before >= EXPERIENCE_BOOST_CAP {
                prop_assert_eq!(after, before);
            }
        }
    }
}
