mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use common::{client, mount_account};
use fitcoach_client::error::Error;
use fitcoach_client::plans::{
    bucket_by_day, AiMealPlanRequest, DayKey, Exercise, Meal, MealPlan, NewMealPlan, NewWorkoutPlan,
};
use fitcoach_client::view::ViewGuard;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn oats() -> Meal {
    Meal {
        name: "Oats".to_string(),
        time: "08:00".to_string(),
        calories: 350.0,
        protein: 12.0,
        carbs: 60.0,
        fats: 6.0,
        ingredients: "oats, milk".to_string(),
    }
}

fn meal_plan_json(id: i64, user_id: i64, scheduled_date: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": "Lean week",
        "description": "High protein",
        "meals": serde_json::to_string(&[oats()]).unwrap(),
        "scheduled_date": scheduled_date,
        "user_id": user_id,
        "created_at": "2024-05-01T09:15:00.123456"
    })
}

#[tokio::test]
async fn test_assigned_meal_plan_shows_on_its_day_only() {
    let server = MockServer::start().await;
    mount_account(&server, "coach@example.com", "admin-tok", true).await;
    mount_account(&server, "athlete@example.com", "user-tok", false).await;

    Mock::given(method("POST"))
        .and(path("/meal-plans/"))
        .and(header("authorization", "Bearer admin-tok"))
        .and(header("content-type", "application/json"))
        .and(body_string_contains("\"user_id\":7"))
        .and(body_string_contains("\"scheduled_date\":\"2024-05-10T00:00:00Z\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(meal_plan_json(11, 7, "2024-05-10T00:00:00")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/meal-plans/user"))
        .and(header("authorization", "Bearer user-tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            meal_plan_json(11, 7, "2024-05-10T00:00:00"),
            meal_plan_json(12, 7, "2024-05-12T07:00:00")
        ])))
        .mount(&server)
        .await;

    let (coach, _) = client(&server);
    coach.auth().login("coach@example.com", "pw").await.unwrap();
    assert!(coach.auth().is_admin());

    let date = Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap();
    let created = coach
        .meals()
        .create(&NewMealPlan::new("Lean week", 7, date, &[oats()]).unwrap().with_description("High protein"))
        .await
        .unwrap();
    assert_eq!(created.id, 11);
    assert_eq!(created.items().unwrap(), vec![oats()]);

    let (athlete, _) = client(&server);
    athlete.auth().login("athlete@example.com", "pw").await.unwrap();

    let on_the_day = athlete.meals().for_day(DayKey::from_ymd(2024, 5, 10).unwrap()).await.unwrap();
    assert_eq!(on_the_day.iter().map(|p| p.id).collect::<Vec<_>>(), vec![11]);

    let next_day = athlete.meals().for_day(DayKey::from_ymd(2024, 5, 11).unwrap()).await.unwrap();
    assert!(next_day.is_empty());
}

#[tokio::test]
async fn test_non_admin_cannot_create_plans() {
    let server = MockServer::start().await;
    mount_account(&server, "athlete@example.com", "user-tok", false).await;
    Mock::given(method("POST"))
        .and(path("/workout-plans/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "detail": "Not enough permissions" })))
        .expect(1)
        .mount(&server)
        .await;

    let (athlete, _) = client(&server);
    athlete.auth().login("athlete@example.com", "pw").await.unwrap();

    let squat = Exercise {
        name: "Squat".to_string(),
        sets: Some("5".to_string()),
        reps: Some("5".to_string()),
        weight: None,
    };
    let plan = NewWorkoutPlan::new("Legs", 7, Utc::now(), &[squat]).unwrap();
    let err = athlete.workouts().create(&plan).await.unwrap_err();

    assert!(matches!(err, Error::Forbidden { .. }));
    assert!(athlete.auth().is_authenticated());
}

#[tokio::test]
async fn test_late_evening_naive_timestamps_stay_on_their_day() {
    let server = MockServer::start().await;
    mount_account(&server, "athlete@example.com", "user-tok", false).await;
    Mock::given(method("GET"))
        .and(path("/workout-plans/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1,
                "title": "Evening run",
                "exercises": "[{\"name\": \"Run\", \"sets\": 1, \"reps\": \"5km\"}]",
                "scheduled_date": "2024-03-01T23:30:00",
                "user_id": 7
            },
            {
                "id": 2,
                "title": "Morning lift",
                "exercises": "Bench 3x5",
                "scheduled_date": "2024-03-02T06:00:00+00:00",
                "user_id": 7
            }
        ])))
        .mount(&server)
        .await;

    let (athlete, _) = client(&server);
    athlete.auth().login("athlete@example.com", "pw").await.unwrap();

    let plans = athlete.workouts().list_for_user().await.unwrap();
    let buckets = bucket_by_day(&plans);

    let first = DayKey::from_ymd(2024, 3, 1).unwrap();
    let second = DayKey::from_ymd(2024, 3, 2).unwrap();
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[&first][0].id, 1);
    assert_eq!(buckets[&second][0].id, 2);

    assert_eq!(buckets[&first][0].items()[0].sets.as_deref(), Some("1"));
    assert_eq!(buckets[&second][0].items()[0].name, "Bench 3x5");
}

#[tokio::test]
async fn test_ai_generation_preview_and_save() {
    let server = MockServer::start().await;
    mount_account(&server, "coach@example.com", "admin-tok", true).await;
    Mock::given(method("POST"))
        .and(path("/meal-plans/ai-generate/"))
        .and(body_string_contains("\"meals_per_day\":3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Bulk",
            "description": "Calorie surplus",
            "meals": [oats()],
            "reasoning": "More carbs in the morning"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/meal-plans/ai-generate-and-save/"))
        .and(body_string_contains("\"user_id\":7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(meal_plan_json(21, 7, "2024-06-01T00:00:00")))
        .expect(1)
        .mount(&server)
        .await;

    let (coach, _) = client(&server);
    coach.auth().login("coach@example.com", "pw").await.unwrap();

    let date = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let request = AiMealPlanRequest::new(7, "gain weight", date);

    let preview = coach.meals().generate_with_ai(&request).await.unwrap();
    assert_eq!(preview.title, "Bulk");
    assert_eq!(preview.meals, vec![oats()]);

    let saved: MealPlan = coach.meals().generate_and_save(&request).await.unwrap();
    assert_eq!(saved.id, 21);
    assert_eq!(DayKey::of(&saved.scheduled_date), DayKey::from_ymd(2024, 6, 1).unwrap());
}

#[tokio::test]
async fn test_view_drops_response_after_navigation() {
    let server = MockServer::start().await;
    mount_account(&server, "athlete@example.com", "user-tok", false).await;
    Mock::given(method("GET"))
        .and(path("/meal-plans/user"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([meal_plan_json(11, 7, "2024-05-10T00:00:00")]))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let (athlete, _) = client(&server);
    athlete.auth().login("athlete@example.com", "pw").await.unwrap();

    let guard = ViewGuard::new();
    let shown: Arc<Mutex<Vec<MealPlan>>> = Arc::default();
    let ticket = guard.begin();

    let meals = athlete.meals();
    let (result, ()) = tokio::join!(meals.list_for_user(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        guard.leave();
    });

    let plans = result.unwrap();
    assert_eq!(plans.len(), 1);
    let applied = guard.apply(ticket, plans, |plans| shown.lock().unwrap().extend(plans));
    assert!(!applied);
    assert!(shown.lock().unwrap().is_empty());
}
