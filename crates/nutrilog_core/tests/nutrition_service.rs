use nutrilog_core::{
    ActivityLevel, CatalogError, DailyProfile, DateKey, DocumentKind, FileDocumentStore, FoodRecord, Gender,
    LoadWarning, MemoryDocumentStore, NutritionService, ServiceError,
};

const FOOD_DATABASE: &str = r#"[
  {"name": "Pancakes", "keywords": ["breakfast"], "type": "composite",
   "components": [{"name": "Flour", "servings": 1.5}, {"name": "Syrup", "servings": 1}]},
  {"name": "Flour", "keywords": ["baking"], "type": "basic", "calories": 100},
  {"name": "Syrup", "keywords": ["sweet"], "type": "basic", "calories": 50},
  {"name": "Waffles", "keywords": ["breakfast"], "type": "composite",
   "components": [{"name": "Flour", "servings": 2}, {"name": "Cream", "servings": 1}]}
]"#;

fn date(value: &str) -> DateKey {
    DateKey::parse(value).unwrap()
}

fn seeded_store() -> MemoryDocumentStore {
    MemoryDocumentStore::new().with_document(DocumentKind::FoodDatabase, FOOD_DATABASE)
}

#[test]
fn open_resolves_catalog_and_reports_warnings() {
    let service = NutritionService::open(seeded_store()).unwrap();

    assert_eq!(service.catalog().len(), 4);
    assert_eq!(service.catalog().get("Pancakes").unwrap().calories(), 200.0);
    assert_eq!(service.catalog().get("Waffles").unwrap().calories(), 200.0);
    assert_eq!(
        service.load_report().warnings,
        vec![LoadWarning::MissingComponent {
            composite: "Waffles".to_string(),
            component: "Cream".to_string(),
        }]
    );
    assert_eq!(service.diary().day_count(), 0);
    assert!(!service.has_unsaved_changes());
}

#[test]
fn empty_store_starts_with_defaults() {
    let service = NutritionService::open(MemoryDocumentStore::new()).unwrap();
    assert!(service.catalog().is_empty());
    assert_eq!(service.profile().user_id, "user");
    assert!(service.load_report().is_clean());
}

#[test]
fn save_and_reopen_round_trips_every_document() {
    let day = date("2024-01-15");
    let mut service = NutritionService::open(seeded_store()).unwrap();
    service
        .add_food(FoodRecord::composite("Brunch", &["weekend"], &[("Pancakes", 2.0)]))
        .unwrap();
    service.log_food(&day, "Brunch", 1.0).unwrap();
    service.log_food(&day, "Syrup", 0.5).unwrap();
    service
        .set_daily_profile(day.clone(), DailyProfile::new(82.5, ActivityLevel::VeryActive))
        .unwrap();
    service
        .update_profile(|profile| {
            profile.gender = Gender::Female;
            profile.age = 41;
        })
        .unwrap();
    assert!(service.has_unsaved_changes());

    service.save().unwrap();
    assert!(!service.has_unsaved_changes());
    let store = service.into_store();

    let reopened = NutritionService::open(store).unwrap();
    assert_eq!(reopened.catalog().get("Brunch").unwrap().calories(), 400.0);
    assert_eq!(reopened.diary().total_calories(&day), 425.0);
    assert_eq!(reopened.profile().age, 41);
    assert_eq!(
        reopened.profile().daily_profile(&date("2024-02-01")).weight_kg,
        82.5
    );
    // Missing components were dropped on load and are not written back.
    assert!(reopened.load_report().is_clean());
}

#[test]
fn undo_goes_through_service_history() {
    let day = date("2024-01-20");
    let mut service = NutritionService::open(seeded_store()).unwrap();
    service.log_food(&day, "Flour", 1.0).unwrap();
    service.log_food(&day, "Syrup", 2.0).unwrap();
    service.delete_entry(&day, 0).unwrap();

    assert_eq!(service.undo_history().len(), 3);
    assert!(service.undo_history()[0].starts_with("Delete 1 serving(s) of Flour"));

    assert!(service.undo().unwrap().starts_with("Delete"));
    assert!(service.undo().unwrap().starts_with("Add 2 serving(s) of Syrup"));
    assert_eq!(service.diary().total_calories(&day), 100.0);
    service.undo().unwrap();
    assert_eq!(service.diary().day_count(), 0);

    let err = service.undo().unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Diary(nutrilog_core::DiaryError::NothingToUndo)
    ));
}

#[test]
fn calorie_summary_compares_target_with_snapshots() {
    let day = date("2024-03-03");
    let mut service = NutritionService::open(seeded_store()).unwrap();
    service
        .update_profile(|profile| {
            profile.gender = Gender::Male;
            profile.height_cm = 180.0;
            profile.age = 25;
        })
        .unwrap();
    service
        .set_daily_profile(day.clone(), DailyProfile::new(80.0, ActivityLevel::Sedentary))
        .unwrap();
    service.log_food(&day, "Pancakes", 3.0).unwrap();

    let summary = service.calorie_summary(&day);
    assert!((summary.target - 1805.0 * 1.2).abs() < 1e-9);
    assert_eq!(summary.consumed, 600.0);
    assert!(!summary.is_over_target());
}

#[test]
fn invalid_profile_update_keeps_previous_profile() {
    let mut service = NutritionService::open(MemoryDocumentStore::new()).unwrap();
    let err = service
        .update_profile(|profile| profile.height_cm = -1.0)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Profile(_)));
    assert_eq!(service.profile().height_cm, 170.0);
    assert!(!service.has_unsaved_changes());
}

#[test]
fn malformed_profile_aborts_open() {
    let store = seeded_store().with_document(DocumentKind::UserProfile, r#"{"userId": 7}"#);
    let err = NutritionService::open(store).err().unwrap();
    assert!(matches!(err, ServiceError::MalformedProfile(_)));
}

#[test]
fn malformed_catalog_aborts_open() {
    let store = MemoryDocumentStore::new().with_document(DocumentKind::FoodDatabase, "[");
    let err = NutritionService::open(store).err().unwrap();
    assert!(matches!(
        err,
        ServiceError::Catalog(CatalogError::MalformedPersistentState(_))
    ));
}

#[test]
fn reload_without_saved_catalog_keeps_current_one() {
    let mut service = NutritionService::open(MemoryDocumentStore::new()).unwrap();
    service
        .add_food(FoodRecord::basic("Tea", &["drink"], 2.0))
        .unwrap();

    service.reload_catalog().unwrap();
    assert_eq!(service.catalog().len(), 1);

    service.save().unwrap();
    service.set_food_calories("Tea", 5.0).unwrap();
    service.reload_catalog().unwrap();
    assert_eq!(service.catalog().get("Tea").unwrap().calories(), 2.0);
    assert!(service
        .store()
        .document(DocumentKind::FoodDatabase)
        .is_some_and(|body| body.contains("Tea")));
}

#[test]
fn file_store_round_trip_uses_document_file_names() {
    let dir = tempfile::tempdir().unwrap();
    let day = date("2024-08-08");

    let store = FileDocumentStore::open(dir.path()).unwrap();
    let mut service = NutritionService::open(store).unwrap();
    service
        .add_food(FoodRecord::basic("Banana", &["fruit"], 105.0))
        .unwrap();
    service.log_food(&day, "Banana", 2.0).unwrap();
    service.save().unwrap();

    for name in ["food_database.json", "food_log.json", "user_profile.json"] {
        assert!(dir.path().join(name).is_file(), "missing {name}");
    }
    let log: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("food_log.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(log["2024-08-08"][0]["food"], "Banana");
    assert_eq!(log["2024-08-08"][0]["calories"], 210.0);

    let reopened = NutritionService::open(FileDocumentStore::open(dir.path()).unwrap()).unwrap();
    assert_eq!(reopened.diary().total_calories(&day), 210.0);
    assert_eq!(reopened.catalog().get("Banana").unwrap().calories(), 105.0);
}
