//! Target-versus-consumed calorie reporting.
//!
//! Reads diary totals only through `DiaryStore::total_calories`.

use crate::diary::DiaryStore;
use crate::model::date::DateKey;
use crate::model::profile::{CalorieSummary, UserProfile};

/// Builds the calorie summary for `date`.
pub fn calorie_summary(profile: &UserProfile, diary: &DiaryStore, date: &DateKey) -> CalorieSummary {
    CalorieSummary::new(
        date.clone(),
        profile.daily_calorie_target(date),
        diary.total_calories(date),
    )
}

#[cfg(test)]
mod tests {
    use super::calorie_summary;
    use crate::catalog::FoodCatalog;
    use crate::diary::DiaryStore;
    use crate::model::date::DateKey;
    use crate::model::food::FoodRecord;
    use crate::model::profile::UserProfile;

    #[test]
    fn summary_for_empty_day_is_under_target() {
        let date = DateKey::parse("2024-06-01").unwrap();
        let summary = calorie_summary(&UserProfile::default(), &DiaryStore::new(), &date);
        assert_eq!(summary.consumed, 0.0);
        assert!(summary.target > 0.0);
        assert!(!summary.is_over_target());
    }

    #[test]
    fn summary_difference_is_consumed_minus_target() {
        let date = DateKey::parse("2024-06-01").unwrap();
        let mut catalog = FoodCatalog::new();
        catalog.add(FoodRecord::basic("Feast", &[], 5000.0)).unwrap();
        let mut diary = DiaryStore::new();
        diary.add_entry(&catalog, &date, "Feast", 1.0).unwrap();

        let summary = calorie_summary(&UserProfile::default(), &diary, &date);
        assert_eq!(summary.difference, 5000.0 - summary.target);
        assert!(summary.is_over_target());
    }
}
