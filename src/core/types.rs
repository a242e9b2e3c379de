use serde::Serialize;

/// Upper bound on the summed experience uplift, regardless of item count.
pub const EXPERIENCE_BOOST_CAP: f64 = 0.60;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Major {
    Business,
    ComputerScience,
    Engineering,
    HealthSciences,
    Humanities,
    FineArts,
    Education,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MajorProfile {
    pub base_salary: f64,
    pub annual_growth_rate: f64,
    pub volatility: f64,
    pub upside_bonus: f64,
}

/// User-entered profile. Every field except `upside_bonus` must be present.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CustomMajor {
    pub base_salary: Option<f64>,
    pub annual_growth_rate: Option<f64>,
    pub volatility: Option<f64>,
    pub upside_bonus: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MajorSelection {
    Catalog(Major),
    Custom(CustomMajor),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Residency {
    InState,
    OutOfState,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncomeBracket {
    Under65k,
    From65kTo100k,
    Over100k,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Housing {
    OnCampus,
    OffCampus,
    Commuter,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MealPlan {
    Unlimited,
    Standard,
    NoPlan,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TargetLocation {
    NycSf,
    JerseyCityPhilly,
    Other,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InternshipTier {
    CampusLocal,
    Regional,
    Fortune500,
    TopTier,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CertificationImpact {
    Low,
    Medium,
    High,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LeadershipLevel {
    Member,
    Coordinator,
    President,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Experience {
    pub internships: Vec<InternshipTier>,
    pub certifications: Vec<CertificationImpact>,
    pub volunteer_roles: Vec<LeadershipLevel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostInputs {
    pub residency: Residency,
    pub income_bracket: IncomeBracket,
    pub scholarships: f64,
    pub side_income: f64,
    pub housing: Housing,
    pub meal_plan: MealPlan,
    pub years_enrolled: u32,
}

/// Salary-side adjustments that shape the major's baseline before simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryAdjustments {
    pub gpa: Option<f64>,
    pub location: TargetLocation,
    pub work_experience_years: u32,
}

impl Default for SalaryAdjustments {
    fn default() -> Self {
        Self {
            gpa: None,
            location: TargetLocation::Other,
            work_experience_years: 0,
        }
    }
}

/// Year-over-year noise added to the growth rate.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum GrowthNoise {
    Off,
    Normal { sigma: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub time_horizon_years: u32,
    pub discount_rate: f64,
    pub trial_count: u32,
    pub take_home_fraction: f64,
    pub growth_noise: GrowthNoise,
    pub volatility_reduction: f64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            time_horizon_years: 10,
            discount_rate: 0.08,
            trial_count: 5_000,
            take_home_fraction: 0.75,
            growth_noise: GrowthNoise::Off,
            volatility_reduction: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileInputs {
    pub major: MajorSelection,
    pub costs: CostInputs,
    pub experience: Experience,
    pub adjustments: SalaryAdjustments,
    pub settings: ModelSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostProfile {
    pub tuition: f64,
    pub tuition_net: f64,
    pub mandatory_fees: f64,
    pub housing: f64,
    pub meal_plan: f64,
    pub gross_annual_cost: f64,
    pub net_annual_cost: f64,
    pub years_enrolled: u32,
    pub total_cost: f64,
}

/// Fully resolved simulation input. One instance per run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioParameters {
    pub base_salary: f64,
    pub annual_growth_rate: f64,
    pub volatility: f64,
    pub volatility_reduction: f64,
    pub upside_bonus: f64,
    pub experience_boost: f64,
    pub total_cost: f64,
    pub time_horizon_years: u32,
    pub discount_rate: f64,
    pub trial_count: u32,
    pub take_home_fraction: f64,
    pub growth_noise: GrowthNoise,
}

impl ScenarioParameters {
    pub fn effective_volatility(&self) -> f64 {
        (self.volatility - self.volatility_reduction).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub mean: f64,
    pub median: f64,
    pub p5: f64,
    pub p95: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum RoiEfficiency {
    Ratio(f64),
    DebtFree,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub seed: u64,
    pub outcomes: Vec<f64>,
    pub summary: SummaryStats,
    pub success_probability: f64,
    pub roi: RoiEfficiency,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u32,
}
