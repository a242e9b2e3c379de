mod catalog;
mod engine;
mod resolver;
mod rng;
mod stats;
mod types;

pub use catalog::MANDATORY_FEES;
pub use engine::{simulate, simulate_cancellable, validate_parameters};
pub use resolver::{
    experience_boost, net_tuition, resolve_costs, resolve_major, resolve_scenario,
};
pub use stats::{histogram, percentile_sorted, roi_efficiency, success_probability, summarize};
pub use types::{
    CertificationImpact, CostInputs, CostProfile, CustomMajor, EXPERIENCE_BOOST_CAP, Experience,
    GrowthNoise, HistogramBin, Housing, IncomeBracket, InternshipTier, LeadershipLevel, Major,
    MajorProfile, MajorSelection, MealPlan, ModelSettings, ProfileInputs, Residency,
    RoiEfficiency, SalaryAdjustments, ScenarioParameters, SimulationResult, SummaryStats,
    TargetLocation,
};
