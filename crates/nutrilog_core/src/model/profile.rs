//! User profile and daily calorie target model.
//!
//! # Responsibility
//! - Hold static physiological data plus per-date weight/activity profiles.
//! - Compute basal metabolic rate and daily calorie targets.
//!
//! # Invariants
//! - A date without its own daily profile inherits the most recent earlier
//!   one, or the default profile when none exists.
//! - Reading a profile never mutates the per-date map.

use crate::model::date::DateKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_WEIGHT_KG: f64 = 70.0;
const DEFAULT_HEIGHT_CM: f64 = 170.0;
const DEFAULT_AGE: u32 = 30;
const DEFAULT_USER_ID: &str = "user";

pub type ProfileResult<T> = Result<T, ProfileError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    #[default]
    ModeratelyActive,
    VeryActive,
    ExtremelyActive,
}

impl ActivityLevel {
    /// TDEE multiplier applied on top of BMR.
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Sedentary => 1.2,
            Self::LightlyActive => 1.375,
            Self::ModeratelyActive => 1.55,
            Self::VeryActive => 1.725,
            Self::ExtremelyActive => 1.9,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Sedentary => "Sedentary",
            Self::LightlyActive => "Lightly Active",
            Self::ModeratelyActive => "Moderately Active",
            Self::VeryActive => "Very Active",
            Self::ExtremelyActive => "Extremely Active",
        }
    }
}

/// BMR equation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    HarrisBenedict,
    #[default]
    MifflinStJeor,
}

impl CalculationMethod {
    pub fn label(self) -> &'static str {
        match self {
            Self::HarrisBenedict => "Harris-Benedict",
            Self::MifflinStJeor => "Mifflin-St Jeor",
        }
    }
}

/// Values that may change from day to day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProfile {
    #[serde(rename = "weight")]
    pub weight_kg: f64,
    pub activity_level: ActivityLevel,
}

impl DailyProfile {
    pub fn new(weight_kg: f64, activity_level: ActivityLevel) -> Self {
        Self {
            weight_kg,
            activity_level,
        }
    }

    pub fn validate(&self) -> ProfileResult<()> {
        if !is_positive(self.weight_kg) {
            return Err(ProfileError::InvalidWeight(self.weight_kg));
        }
        Ok(())
    }
}

impl Default for DailyProfile {
    fn default() -> Self {
        Self::new(DEFAULT_WEIGHT_KG, ActivityLevel::default())
    }
}

/// Persisted user profile (`user_profile.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub gender: Gender,
    #[serde(rename = "height")]
    pub height_cm: f64,
    pub age: u32,
    pub calculation_method: CalculationMethod,
    #[serde(default)]
    daily_profiles: BTreeMap<DateKey, DailyProfile>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_USER_ID.to_string(),
            gender: Gender::default(),
            height_cm: DEFAULT_HEIGHT_CM,
            age: DEFAULT_AGE,
            calculation_method: CalculationMethod::default(),
            daily_profiles: BTreeMap::new(),
        }
    }
}

impl UserProfile {
    /// Validates static fields and every stored daily profile.
    pub fn validate(&self) -> ProfileResult<()> {
        if !is_positive(self.height_cm) {
            return Err(ProfileError::InvalidHeight(self.height_cm));
        }
        if self.age == 0 {
            return Err(ProfileError::InvalidAge(self.age));
        }
        for daily in self.daily_profiles.values() {
            daily.validate()?;
        }
        Ok(())
    }

    pub fn has_daily_profile(&self, date: &DateKey) -> bool {
        self.daily_profiles.contains_key(date)
    }

    /// Stores the weight/activity profile for one date.
    pub fn set_daily_profile(&mut self, date: DateKey, profile: DailyProfile) -> ProfileResult<()> {
        profile.validate()?;
        self.daily_profiles.insert(date, profile);
        Ok(())
    }

    /// Effective daily profile for `date`.
    pub fn daily_profile(&self, date: &DateKey) -> DailyProfile {
        self.daily_profiles
            .range(..=date.clone())
            .next_back()
            .map(|(_, profile)| *profile)
            .unwrap_or_default()
    }

    /// Dates with an explicitly stored daily profile, oldest first.
    pub fn profile_dates(&self) -> impl Iterator<Item = &DateKey> {
        self.daily_profiles.keys()
    }

    /// Basal metabolic rate for `weight_kg` using the configured equation.
    pub fn basal_metabolic_rate(&self, weight_kg: f64) -> f64 {
        let height = self.height_cm;
        let age = f64::from(self.age);
        let male = self.gender == Gender::Male;
        match self.calculation_method {
            CalculationMethod::HarrisBenedict => {
                if male {
                    66.5 + 13.75 * weight_kg + 5.003 * height - 6.75 * age
                } else {
                    655.1 + 9.563 * weight_kg + 1.850 * height - 4.676 * age
                }
            }
            CalculationMethod::MifflinStJeor => {
                let base = 10.0 * weight_kg + 6.25 * height - 5.0 * age;
                if male {
                    base + 5.0
                } else {
                    base - 161.0
                }
            }
        }
    }

    /// Daily calorie target (BMR times activity multiplier) for `date`.
    pub fn daily_calorie_target(&self, date: &DateKey) -> f64 {
        let daily = self.daily_profile(date);
        self.basal_metabolic_rate(daily.weight_kg) * daily.activity_level.multiplier()
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Target-versus-consumed report for one date.
#[derive(Debug, Clone, PartialEq)]
pub struct CalorieSummary {
    pub date: DateKey,
    pub target: f64,
    pub consumed: f64,
    /// `consumed - target`; positive when over target.
    pub difference: f64,
}

impl CalorieSummary {
    pub fn new(date: DateKey, target: f64, consumed: f64) -> Self {
        Self {
            date,
            target,
            consumed,
            difference: consumed - target,
        }
    }

    pub fn is_over_target(&self) -> bool {
        self.difference > 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileError {
    InvalidWeight(f64),
    InvalidHeight(f64),
    InvalidAge(u32),
}

impl Display for ProfileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidWeight(value) => write!(f, "weight must be a positive number, got {value}"),
            Self::InvalidHeight(value) => write!(f, "height must be a positive number, got {value}"),
            Self::InvalidAge(value) => write!(f, "age must be positive, got {value}"),
        }
    }
}

impl Error for ProfileError {}

#[cfg(test)]
mod tests {
    use super::{ActivityLevel, CalculationMethod, DailyProfile, Gender, UserProfile};
    use crate::model::date::DateKey;

    fn date(value: &str) -> DateKey {
        DateKey::parse(value).unwrap()
    }

    #[test]
    fn mifflin_target_for_male_matches_formula() {
        let mut profile = UserProfile {
            gender: Gender::Male,
            height_cm: 180.0,
            age: 25,
            ..UserProfile::default()
        };
        profile
            .set_daily_profile(date("2024-01-01"), DailyProfile::new(80.0, ActivityLevel::Sedentary))
            .unwrap();

        // 10*80 + 6.25*180 - 5*25 + 5 = 1805
        let target = profile.daily_calorie_target(&date("2024-01-01"));
        assert!((target - 1805.0 * 1.2).abs() < 1e-9);
    }

    #[test]
    fn harris_benedict_female_formula() {
        let profile = UserProfile {
            gender: Gender::Female,
            height_cm: 160.0,
            age: 40,
            calculation_method: CalculationMethod::HarrisBenedict,
            ..UserProfile::default()
        };
        let bmr = profile.basal_metabolic_rate(60.0);
        let expected = 655.1 + 9.563 * 60.0 + 1.850 * 160.0 - 4.676 * 40.0;
        assert!((bmr - expected).abs() < 1e-9);
    }

    #[test]
    fn daily_profile_inherits_most_recent_earlier_date() {
        let mut profile = UserProfile::default();
        profile
            .set_daily_profile(date("2024-01-01"), DailyProfile::new(72.0, ActivityLevel::VeryActive))
            .unwrap();
        profile
            .set_daily_profile(date("2024-01-10"), DailyProfile::new(71.0, ActivityLevel::Sedentary))
            .unwrap();

        assert_eq!(profile.daily_profile(&date("2024-01-05")).weight_kg, 72.0);
        assert_eq!(profile.daily_profile(&date("2024-02-01")).weight_kg, 71.0);
        assert_eq!(profile.daily_profile(&date("2023-12-31")), DailyProfile::default());
        assert!(!profile.has_daily_profile(&date("2024-01-05")));
    }

    #[test]
    fn set_daily_profile_rejects_non_positive_weight() {
        let mut profile = UserProfile::default();
        assert!(profile
            .set_daily_profile(date("2024-01-01"), DailyProfile::new(0.0, ActivityLevel::Sedentary))
            .is_err());
        assert_eq!(profile.profile_dates().count(), 0);
    }

    #[test]
    fn serialization_uses_camel_case_fields() {
        let mut profile = UserProfile::default();
        profile
            .set_daily_profile(date("2024-03-01"), DailyProfile::default())
            .unwrap();
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["userId"], "user");
        assert_eq!(json["calculationMethod"], "mifflin_st_jeor");
        assert_eq!(json["dailyProfiles"]["2024-03-01"]["weight"], 70.0);
        assert_eq!(
            json["dailyProfiles"]["2024-03-01"]["activityLevel"],
            "moderately_active"
        );

        let decoded: UserProfile = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, profile);
    }
}
