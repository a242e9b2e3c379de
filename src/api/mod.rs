use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::de::{self, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::core::{
    CertificationImpact, CostInputs, CostProfile, CustomMajor, Experience, GrowthNoise,
    HistogramBin, Housing, IncomeBracket, InternshipTier, LeadershipLevel, Major, MajorProfile,
    MajorSelection, MealPlan, ModelSettings, ProfileInputs, Residency, RoiEfficiency,
    SalaryAdjustments, ScenarioParameters, SummaryStats, TargetLocation, histogram,
    resolve_costs, resolve_major, resolve_scenario, simulate,
};
use crate::error::SimulationError;

/// Upper bound on trials per request; outcomes are held in memory.
const MAX_SIMULATIONS: u32 = 1_000_000;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum CliMajor {
    Business,
    #[serde(alias = "computerScience", alias = "cs")]
    ComputerScience,
    Engineering,
    #[serde(alias = "healthSciences")]
    HealthSciences,
    Humanities,
    #[serde(alias = "fineArts")]
    FineArts,
    Education,
    Custom,
}

impl CliMajor {
    fn catalog(self) -> Option<Major> {
        match self {
            CliMajor::Business => Some(Major::Business),
            CliMajor::ComputerScience => Some(Major::ComputerScience),
            CliMajor::Engineering => Some(Major::Engineering),
            CliMajor::HealthSciences => Some(Major::HealthSciences),
            CliMajor::Humanities => Some(Major::Humanities),
            CliMajor::FineArts => Some(Major::FineArts),
            CliMajor::Education => Some(Major::Education),
            CliMajor::Custom => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum CliResidency {
    #[serde(alias = "inState", alias = "resident")]
    InState,
    #[serde(alias = "outOfState", alias = "non-resident")]
    OutOfState,
}

impl From<CliResidency> for Residency {
    fn from(value: CliResidency) -> Self {
        match value {
            CliResidency::InState => Residency::InState,
            CliResidency::OutOfState => Residency::OutOfState,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum CliIncomeBracket {
    #[value(name = "under-65k")]
    #[serde(rename = "under-65k", alias = "under65k")]
    Under65k,
    #[value(name = "65k-to-100k")]
    #[serde(rename = "65k-to-100k", alias = "from65kTo100k")]
    From65kTo100k,
    #[value(name = "over-100k")]
    #[serde(rename = "over-100k", alias = "over100k")]
    Over100k,
}

impl From<CliIncomeBracket> for IncomeBracket {
    fn from(value: CliIncomeBracket) -> Self {
        match value {
            CliIncomeBracket::Under65k => IncomeBracket::Under65k,
            CliIncomeBracket::From65kTo100k => IncomeBracket::From65kTo100k,
            CliIncomeBracket::Over100k => IncomeBracket::Over100k,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum CliHousing {
    #[serde(alias = "onCampus")]
    OnCampus,
    #[serde(alias = "offCampus")]
    OffCampus,
    Commuter,
}

impl From<CliHousing> for Housing {
    fn from(value: CliHousing) -> Self {
        match value {
            CliHousing::OnCampus => Housing::OnCampus,
            CliHousing::OffCampus => Housing::OffCampus,
            CliHousing::Commuter => Housing::Commuter,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum CliMealPlan {
    Unlimited,
    Standard,
    #[value(name = "none")]
    #[serde(rename = "none")]
    NoPlan,
}

impl From<CliMealPlan> for MealPlan {
    fn from(value: CliMealPlan) -> Self {
        match value {
            CliMealPlan::Unlimited => MealPlan::Unlimited,
            CliMealPlan::Standard => MealPlan::Standard,
            CliMealPlan::NoPlan => MealPlan::NoPlan,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum CliLocation {
    #[serde(alias = "nycSf")]
    NycSf,
    #[serde(alias = "jerseyCityPhilly")]
    JerseyCityPhilly,
    #[serde(alias = "remote")]
    Other,
}

impl From<CliLocation> for TargetLocation {
    fn from(value: CliLocation) -> Self {
        match value {
            CliLocation::NycSf => TargetLocation::NycSf,
            CliLocation::JerseyCityPhilly => TargetLocation::JerseyCityPhilly,
            CliLocation::Other => TargetLocation::Other,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum CliInternshipTier {
    #[serde(alias = "campusLocal", alias = "local")]
    CampusLocal,
    #[serde(alias = "statewide")]
    Regional,
    #[value(name = "fortune-500")]
    #[serde(rename = "fortune-500", alias = "fortune500", alias = "big4")]
    Fortune500,
    #[serde(alias = "topTier", alias = "top-tech", alias = "quant")]
    TopTier,
}

impl From<CliInternshipTier> for InternshipTier {
    fn from(value: CliInternshipTier) -> Self {
        match value {
            CliInternshipTier::CampusLocal => InternshipTier::CampusLocal,
            CliInternshipTier::Regional => InternshipTier::Regional,
            CliInternshipTier::Fortune500 => InternshipTier::Fortune500,
            CliInternshipTier::TopTier => InternshipTier::TopTier,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum CliCertificationImpact {
    Low,
    Medium,
    High,
}

impl From<CliCertificationImpact> for CertificationImpact {
    fn from(value: CliCertificationImpact) -> Self {
        match value {
            CliCertificationImpact::Low => CertificationImpact::Low,
            CliCertificationImpact::Medium => CertificationImpact::Medium,
            CliCertificationImpact::High => CertificationImpact::High,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum CliLeadershipLevel {
    Member,
    Coordinator,
    #[serde(alias = "founder")]
    President,
}

impl From<CliLeadershipLevel> for LeadershipLevel {
    fn from(value: CliLeadershipLevel) -> Self {
        match value {
            CliLeadershipLevel::Member => LeadershipLevel::Member,
            CliLeadershipLevel::Coordinator => LeadershipLevel::Coordinator,
            CliLeadershipLevel::President => LeadershipLevel::President,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    major: Option<CliMajor>,
    custom_base_salary: Option<f64>,
    custom_growth_rate: Option<f64>,
    custom_volatility: Option<f64>,
    custom_upside_bonus: Option<f64>,

    residency: Option<CliResidency>,
    income_bracket: Option<CliIncomeBracket>,
    scholarships: Option<f64>,
    side_income: Option<f64>,
    housing: Option<CliHousing>,
    meal_plan: Option<CliMealPlan>,
    years_enrolled: Option<u32>,

    #[serde(deserialize_with = "deserialize_list")]
    internships: Option<Vec<CliInternshipTier>>,
    #[serde(deserialize_with = "deserialize_list")]
    certifications: Option<Vec<CliCertificationImpact>>,
    #[serde(deserialize_with = "deserialize_list")]
    volunteer_roles: Option<Vec<CliLeadershipLevel>>,

    gpa: Option<f64>,
    location: Option<CliLocation>,
    work_experience_years: Option<u32>,

    horizon_years: Option<u32>,
    discount_rate: Option<f64>,
    simulations: Option<u32>,
    seed: Option<u64>,
    take_home: Option<f64>,
    growth_noise: Option<f64>,
    volatility_reduction: Option<f64>,
    histogram_bins: Option<u32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrCsv<T> {
    List(Vec<T>),
    Csv(String),
}

/// JSON bodies send arrays; query strings send `internships=top-tier,regional`.
fn deserialize_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match ListOrCsv::<T>::deserialize(deserializer)? {
        ListOrCsv::List(items) => Ok(Some(items)),
        ListOrCsv::Csv(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                T::deserialize(item.to_string().into_deserializer())
                    .map_err(|e: de::value::Error| de::Error::custom(e))
            })
            .collect::<Result<Vec<T>, D::Error>>()
            .map(Some),
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "degree-roi",
    about = "Monte Carlo estimator of the net present value of a college major"
)]
struct Cli {
    #[arg(long, value_enum, default_value_t = CliMajor::ComputerScience)]
    major: CliMajor,
    #[arg(long, help = "Starting salary mean for --major custom")]
    custom_base_salary: Option<f64>,
    #[arg(long, help = "Annual salary growth in percent for --major custom")]
    custom_growth_rate: Option<f64>,
    #[arg(
        long,
        help = "Starting salary volatility in percent of the mean for --major custom"
    )]
    custom_volatility: Option<f64>,
    #[arg(long, help = "Upside bonus in percent for --major custom (reported only)")]
    custom_upside_bonus: Option<f64>,

    #[arg(long, value_enum, default_value_t = CliResidency::InState)]
    residency: CliResidency,
    #[arg(long, value_enum, default_value_t = CliIncomeBracket::Over100k)]
    income_bracket: CliIncomeBracket,
    #[arg(long, default_value_t = 0.0, help = "Annual scholarships and grants")]
    scholarships: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual income applied to costs")]
    side_income: f64,
    #[arg(long, value_enum, default_value_t = CliHousing::OnCampus)]
    housing: CliHousing,
    #[arg(long, value_enum, default_value_t = CliMealPlan::Standard)]
    meal_plan: CliMealPlan,
    #[arg(long, default_value_t = 4)]
    years_enrolled: u32,

    #[arg(long = "internship", value_enum, help = "Repeat once per internship")]
    internships: Vec<CliInternshipTier>,
    #[arg(long = "certification", value_enum, help = "Repeat once per certification")]
    certifications: Vec<CliCertificationImpact>,
    #[arg(long = "volunteer-role", value_enum, help = "Repeat once per volunteer role")]
    volunteer_roles: Vec<CliLeadershipLevel>,

    #[arg(long, help = "Cumulative GPA on a 4.0 scale")]
    gpa: Option<f64>,
    #[arg(long, value_enum, default_value_t = CliLocation::Other)]
    location: CliLocation,
    #[arg(long, default_value_t = 0, help = "Years worked during college")]
    work_experience_years: u32,

    #[arg(long, default_value_t = 10)]
    horizon_years: u32,
    #[arg(long, default_value_t = 8.0, help = "Annual discount rate in percent")]
    discount_rate: f64,
    #[arg(long, default_value_t = 5_000)]
    simulations: u32,
    #[arg(long, help = "Seed for a reproducible run")]
    seed: Option<u64>,
    #[arg(
        long,
        default_value_t = 75.0,
        help = "Share of gross salary kept as cash flow, in percent"
    )]
    take_home: f64,
    #[arg(
        long,
        help = "Enables year-over-year growth noise with this sigma in percent, e.g. 2"
    )]
    growth_noise: Option<f64>,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Percentage points subtracted from starting salary volatility"
    )]
    volatility_reduction: f64,
    #[arg(long, default_value_t = 70)]
    histogram_bins: u32,
}

#[derive(Debug)]
struct ApiOptions {
    seed: Option<u64>,
    histogram_bins: u32,
}

#[derive(Debug)]
struct ApiRequest {
    inputs: ProfileInputs,
    options: ApiOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MajorResponse {
    key: Option<Major>,
    label: &'static str,
    profile: MajorProfile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    major: MajorResponse,
    costs: CostProfile,
    parameters: ScenarioParameters,
    seed: u64,
    trial_count: usize,
    summary: SummaryStats,
    success_probability: f64,
    roi: RoiEfficiency,
    histogram: Vec<HistogramBin>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_request(cli: Cli) -> Result<ApiRequest, String> {
    if cli.simulations == 0 {
        return Err("--simulations must be > 0".to_string());
    }

    if cli.simulations > MAX_SIMULATIONS {
        return Err(format!("--simulations must be <= {MAX_SIMULATIONS}"));
    }

    if cli.horizon_years == 0 {
        return Err("--horizon-years must be > 0".to_string());
    }

    if !cli.discount_rate.is_finite() || cli.discount_rate < 0.0 {
        return Err("--discount-rate must be >= 0".to_string());
    }

    if !(0.0..=100.0).contains(&cli.take_home) {
        return Err("--take-home must be between 0 and 100".to_string());
    }

    if let Some(sigma) = cli.growth_noise {
        if !sigma.is_finite() || sigma < 0.0 {
            return Err("--growth-noise must be >= 0".to_string());
        }
    }

    if !cli.volatility_reduction.is_finite() || cli.volatility_reduction < 0.0 {
        return Err("--volatility-reduction must be >= 0".to_string());
    }

    if cli.histogram_bins == 0 {
        return Err("--histogram-bins must be > 0".to_string());
    }

    if cli.major != CliMajor::Custom
        && (cli.custom_base_salary.is_some()
            || cli.custom_growth_rate.is_some()
            || cli.custom_volatility.is_some()
            || cli.custom_upside_bonus.is_some())
    {
        return Err("--custom-* values require --major custom".to_string());
    }

    let major = match cli.major.catalog() {
        Some(major) => MajorSelection::Catalog(major),
        None => MajorSelection::Custom(CustomMajor {
            base_salary: cli.custom_base_salary,
            annual_growth_rate: cli.custom_growth_rate.map(|v| v / 100.0),
            volatility: cli.custom_volatility.map(|v| v / 100.0),
            upside_bonus: cli.custom_upside_bonus.map(|v| v / 100.0),
        }),
    };

    let inputs = ProfileInputs {
        major,
        costs: CostInputs {
            residency: cli.residency.into(),
            income_bracket: cli.income_bracket.into(),
            scholarships: cli.scholarships,
            side_income: cli.side_income,
            housing: cli.housing.into(),
            meal_plan: cli.meal_plan.into(),
            years_enrolled: cli.years_enrolled,
        },
        experience: Experience {
            internships: cli.internships.into_iter().map(Into::into).collect(),
            certifications: cli.certifications.into_iter().map(Into::into).collect(),
            volunteer_roles: cli.volunteer_roles.into_iter().map(Into::into).collect(),
        },
        adjustments: SalaryAdjustments {
            gpa: cli.gpa,
            location: cli.location.into(),
            work_experience_years: cli.work_experience_years,
        },
        settings: ModelSettings {
            time_horizon_years: cli.horizon_years,
            discount_rate: cli.discount_rate / 100.0,
            trial_count: cli.simulations,
            take_home_fraction: cli.take_home / 100.0,
            growth_noise: match cli.growth_noise {
                Some(sigma) => GrowthNoise::Normal {
                    sigma: sigma / 100.0,
                },
                None => GrowthNoise::Off,
            },
            volatility_reduction: cli.volatility_reduction / 100.0,
        },
    };

    Ok(ApiRequest {
        inputs,
        options: ApiOptions {
            seed: cli.seed,
            histogram_bins: cli.histogram_bins,
        },
    })
}

fn run_scenario(request: &ApiRequest) -> Result<SimulateResponse, SimulationError> {
    let inputs = &request.inputs;
    let profile = resolve_major(inputs.major)?;
    let costs = resolve_costs(&inputs.costs)?;
    let parameters = resolve_scenario(inputs)?;
    let result = simulate(&parameters, request.options.seed)?;
    let bins = histogram(&result.outcomes, request.options.histogram_bins)?;

    let major = match inputs.major {
        MajorSelection::Catalog(major) => MajorResponse {
            key: Some(major),
            label: major.label(),
            profile,
        },
        MajorSelection::Custom(_) => MajorResponse {
            key: None,
            label: "Custom",
            profile,
        },
    };

    info!(
        label = major.label,
        seed = result.seed,
        mean = result.summary.mean,
        success = result.success_probability,
        "scenario simulated"
    );

    Ok(SimulateResponse {
        major,
        costs,
        parameters,
        seed: result.seed,
        trial_count: result.outcomes.len(),
        summary: result.summary,
        success_probability: result.success_probability,
        roi: result.roi,
        histogram: bins,
    })
}

/// Parses process arguments, runs one scenario, and prints the JSON response.
pub fn run_cli() -> Result<(), String> {
    let request = build_request(Cli::parse())?;
    let response = run_scenario(&request).map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(&response).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/majors", get(majors_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("degree ROI HTTP API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn majors_handler() -> Response {
    let majors: Vec<MajorResponse> = Major::ALL
        .iter()
        .map(|major| MajorResponse {
            key: Some(*major),
            label: major.label(),
            profile: major.profile(),
        })
        .collect();
    json_response(StatusCode::OK, majors)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(
    payload: Result<Query<SimulatePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => simulate_handler_impl(payload).await,
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

async fn simulate_post_handler(payload: Result<Json<SimulatePayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => simulate_handler_impl(payload).await,
        Err(rejection) => error_response(rejection.status(), &rejection.body_text()),
    }
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    // Trials fan out over the rayon pool; keep them off the async workers.
    let outcome = tokio::task::spawn_blocking(move || run_scenario(&request)).await;
    match outcome {
        Ok(Ok(response)) => json_response(StatusCode::OK, response),
        Ok(Err(e)) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        Err(e) => {
            error!("simulation task failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Simulation failed")
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.major {
        cli.major = v;
    }
    if let Some(v) = payload.custom_base_salary {
        cli.custom_base_salary = Some(v);
    }
    if let Some(v) = payload.custom_growth_rate {
        cli.custom_growth_rate = Some(v);
    }
    if let Some(v) = payload.custom_volatility {
        cli.custom_volatility = Some(v);
    }
    if let Some(v) = payload.custom_upside_bonus {
        cli.custom_upside_bonus = Some(v);
    }

    if let Some(v) = payload.residency {
        cli.residency = v;
    }
    if let Some(v) = payload.income_bracket {
        cli.income_bracket = v;
    }
    if let Some(v) = payload.scholarships {
        cli.scholarships = v;
    }
    if let Some(v) = payload.side_income {
        cli.side_income = v;
    }
    if let Some(v) = payload.housing {
        cli.housing = v;
    }
    if let Some(v) = payload.meal_plan {
        cli.meal_plan = v;
    }
    if let Some(v) = payload.years_enrolled {
        cli.years_enrolled = v;
    }

    if let Some(v) = payload.internships {
        cli.internships = v;
    }
    if let Some(v) = payload.certifications {
        cli.certifications = v;
    }
    if let Some(v) = payload.volunteer_roles {
        cli.volunteer_roles = v;
    }

    if let Some(v) = payload.gpa {
        cli.gpa = Some(v);
    }
    if let Some(v) = payload.location {
        cli.location = v;
    }
    if let Some(v) = payload.work_experience_years {
        cli.work_experience_years = v;
    }

    if let Some(v) = payload.horizon_years {
        cli.horizon_years = v;
    }
    if let Some(v) = payload.discount_rate {
        cli.discount_rate = v;
    }
    if let Some(v) = payload.simulations {
        cli.simulations = v;
    }
    if let Some(v) = payload.seed {
        cli.seed = Some(v);
    }
    if let Some(v) = payload.take_home {
        cli.take_home = v;
    }
    if let Some(v) = payload.growth_noise {
        cli.growth_noise = Some(v);
    }
    if let Some(v) = payload.volatility_reduction {
        cli.volatility_reduction = v;
    }
    if let Some(v) = payload.histogram_bins {
        cli.histogram_bins = v;
    }

    build_request(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        major: CliMajor::ComputerScience,
        custom_base_salary: None,
        custom_growth_rate: None,
        custom_volatility: None,
        custom_upside_bonus: None,
        residency: CliResidency::InState,
        income_bracket: CliIncomeBracket::Over100k,
        scholarships: 0.0,
        side_income: 0.0,
        housing: CliHousing::OnCampus,
        meal_plan: CliMealPlan::Standard,
        years_enrolled: 4,
        internships: Vec::new(),
        certifications: Vec::new(),
        volunteer_roles: Vec::new(),
        gpa: None,
        location: CliLocation::Other,
        work_experience_years: 0,
        horizon_years: 10,
        discount_rate: 8.0,
        simulations: 5_000,
        seed: None,
        take_home: 75.0,
        growth_noise: None,
        volatility_reduction: 0.0,
        histogram_bins: 70,
    }
}
