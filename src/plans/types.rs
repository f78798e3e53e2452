//! Workout and meal plan types

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::Result;

/// Anything placed on the calendar
pub trait Scheduled {
    fn scheduled_date(&self) -> DateTime<Utc>;
}

/// Accepts `"3"` as well as `3`; form inputs arrive as strings.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Lenient>::deserialize(deserializer)? {
        Some(Lenient::Text(s)) if s.trim().is_empty() => None,
        Some(Lenient::Text(s)) => Some(s),
        Some(Lenient::Number(n)) => Some(n.to_string()),
        None => None,
    })
}

/// One exercise of a workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub sets: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub reps: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
}

/// One meal of a meal plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub name: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fats: f64,
    #[serde(default)]
    pub ingredients: String,
}

/// Workout plan as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Free text or a JSON list of [`Exercise`]
    #[serde(default)]
    pub exercises: String,
    #[serde(with = "super::timestamp")]
    pub scheduled_date: DateTime<Utc>,
    pub user_id: i64,
    #[serde(default, with = "super::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl WorkoutPlan {
    /// Structured exercises. Plain-text plans yield a single entry named
    /// after the text.
    pub fn items(&self) -> Vec<Exercise> {
        let text = self.exercises.trim();
        if text.is_empty() {
            return Vec::new();
        }
        serde_json::from_str(text).unwrap_or_else(|_| {
            vec![Exercise {
                name: text.to_string(),
                sets: None,
                reps: None,
                weight: None,
            }]
        })
    }
}

impl Scheduled for WorkoutPlan {
    fn scheduled_date(&self) -> DateTime<Utc> {
        self.scheduled_date
    }
}

/// Meal plan as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// JSON-encoded list of [`Meal`]
    #[serde(default)]
    pub meals: String,
    #[serde(with = "super::timestamp")]
    pub scheduled_date: DateTime<Utc>,
    pub user_id: i64,
    #[serde(default, with = "super::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl MealPlan {
    /// Decoded meals
    pub fn items(&self) -> Result<Vec<Meal>> {
        if self.meals.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&self.meals)?)
    }
}

impl Scheduled for MealPlan {
    fn scheduled_date(&self) -> DateTime<Utc> {
        self.scheduled_date
    }
}

/// Payload for `POST /workout-plans/`
#[derive(Debug, Clone, Serialize)]
pub struct NewWorkoutPlan {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub exercises: String,
    #[serde(with = "super::timestamp")]
    pub scheduled_date: DateTime<Utc>,
    pub user_id: i64,
}

impl NewWorkoutPlan {
    pub fn new(title: &str, user_id: i64, scheduled_date: DateTime<Utc>, exercises: &[Exercise]) -> Result<Self> {
        Ok(Self {
            title: title.to_string(),
            description: None,
            exercises: serde_json::to_string(exercises)?,
            scheduled_date,
            user_id,
        })
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Payload for `POST /meal-plans/`
#[derive(Debug, Clone, Serialize)]
pub struct NewMealPlan {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub meals: String,
    #[serde(with = "super::timestamp")]
    pub scheduled_date: DateTime<Utc>,
    pub user_id: i64,
}

impl NewMealPlan {
    pub fn new(title: &str, user_id: i64, scheduled_date: DateTime<Utc>, meals: &[Meal]) -> Result<Self> {
        Ok(Self {
            title: title.to_string(),
            description: None,
            meals: serde_json::to_string(meals)?,
            scheduled_date,
            user_id,
        })
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

fn default_meals_per_day() -> u32 {
    3
}

/// Input of the AI meal-plan generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiMealPlanRequest {
    pub user_id: i64,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary_preferences: Option<String>,
    #[serde(default)]
    pub calories_target: Option<u32>,
    #[serde(default)]
    pub protein_target: Option<u32>,
    #[serde(default)]
    pub carbs_target: Option<u32>,
    #[serde(default)]
    pub fats_target: Option<u32>,
    #[serde(default = "default_meals_per_day")]
    pub meals_per_day: u32,
    #[serde(with = "super::timestamp")]
    pub scheduled_date: DateTime<Utc>,
}

impl AiMealPlanRequest {
    pub fn new(user_id: i64, prompt: &str, scheduled_date: DateTime<Utc>) -> Self {
        Self {
            user_id,
            prompt: prompt.to_string(),
            dietary_preferences: None,
            calories_target: None,
            protein_target: None,
            carbs_target: None,
            fats_target: None,
            meals_per_day: default_meals_per_day(),
            scheduled_date,
        }
    }
}

/// Structured plan returned by the AI generator (not yet saved)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiMealPlanResponse {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub meals: Vec<Meal>,
    #[serde(default)]
    pub reasoning: Option<String>,
}
