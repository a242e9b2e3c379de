//! Static reference tables: major salary profiles, cost of attendance, and
//! experience weights.

use super::types::{
    CertificationImpact, Housing, InternshipTier, LeadershipLevel, Major, MajorProfile, MealPlan,
    Residency, TargetLocation,
};

pub const MANDATORY_FEES: f64 = 3_600.0;

impl Major {
    pub const ALL: [Major; 7] = [
        Major::Business,
        Major::ComputerScience,
        Major::Engineering,
        Major::HealthSciences,
        Major::Humanities,
        Major::FineArts,
        Major::Education,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Major::Business => "Business (BAIT/Finance/Accounting)",
            Major::ComputerScience => "Computer Science / Software Engineering",
            Major::Engineering => "Engineering (Mechanical/Civil/Aero)",
            Major::HealthSciences => "Biological / Health Sciences",
            Major::Humanities => "Humanities / Social Sciences",
            Major::FineArts => "Fine Arts / Design",
            Major::Education => "Education",
        }
    }

    // Upside values are reference data only; the projection never applies them.
    pub fn profile(self) -> MajorProfile {
        let (base_salary, annual_growth_rate, volatility, upside_bonus) = match self {
            Major::Business => (75_000.0, 0.045, 0.15, 0.10),
            Major::ComputerScience => (88_000.0, 0.05, 0.20, 0.15),
            Major::Engineering => (80_000.0, 0.04, 0.10, 0.08),
            Major::HealthSciences => (63_000.0, 0.035, 0.12, 0.06),
            Major::Humanities => (55_000.0, 0.03, 0.15, 0.05),
            Major::FineArts => (52_000.0, 0.03, 0.25, 0.10),
            // Low risk, low growth.
            Major::Education => (58_000.0, 0.025, 0.05, 0.02),
        };
        MajorProfile {
            base_salary,
            annual_growth_rate,
            volatility,
            upside_bonus,
        }
    }
}

impl Residency {
    pub fn annual_tuition(self) -> f64 {
        match self {
            Residency::InState => 13_500.0,
            Residency::OutOfState => 33_000.0,
        }
    }
}

impl Housing {
    pub fn annual_cost(self) -> f64 {
        match self {
            Housing::OnCampus => 9_800.0,
            Housing::OffCampus => 8_400.0,
            Housing::Commuter => 0.0,
        }
    }
}

impl MealPlan {
    pub fn annual_cost(self) -> f64 {
        match self {
            MealPlan::Unlimited => 6_300.0,
            MealPlan::Standard => 4_900.0,
            MealPlan::NoPlan => 0.0,
        }
    }
}

impl TargetLocation {
    pub fn salary_multiplier(self) -> f64 {
        match self {
            TargetLocation::NycSf => 1.20,
            TargetLocation::JerseyCityPhilly | TargetLocation::Other => 1.0,
        }
    }
}

impl InternshipTier {
    pub fn weight(self) -> f64 {
        match self {
            InternshipTier::CampusLocal => 0.03,
            InternshipTier::Regional => 0.05,
            InternshipTier::Fortune500 => 0.08,
            InternshipTier::TopTier => 0.12,
        }
    }
}

impl CertificationImpact {
    pub fn weight(self) -> f64 {
        match self {
            CertificationImpact::Low => 0.01,
            CertificationImpact::Medium => 0.03,
            CertificationImpact::High => 0.05,
        }
    }
}

impl LeadershipLevel {
    pub fn weight(self) -> f64 {
        match self {
            LeadershipLevel::Member => 0.005,
            LeadershipLevel::Coordinator => 0.015,
            LeadershipLevel::President => 0.03,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_major_has_a_sane_profile() {
        for major in Major::ALL {
            let profile = major.profile();
            assert!(profile.base_salary > 0.0, "{major:?}");
            assert!(profile.annual_growth_rate >= 0.0, "{major:?}");
            assert!(profile.volatility >= 0.0, "{major:?}");
            assert!(profile.upside_bonus >= 0.0, "{major:?}");
            assert!(!major.label().is_empty());
        }
    }

    #[test]
    fn tier_weights_increase_with_tier() {
        assert!(InternshipTier::CampusLocal.weight() < InternshipTier::Regional.weight());
        assert!(InternshipTier::Regional.weight() < InternshipTier::Fortune500.weight());
        assert!(InternshipTier::Fortune500.weight() < InternshipTier::TopTier.weight());
        assert!(CertificationImpact::Low.weight() < CertificationImpact::High.weight());
        assert!(LeadershipLevel::Member.weight() < LeadershipLevel::President.weight());
    }

    #[test]
    fn out_of_state_tuition_exceeds_in_state() {
        assert!(Residency::OutOfState.annual_tuition() > Residency::InState.annual_tuition());
    }
}
