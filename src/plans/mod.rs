//! Workout and meal plan endpoints

pub mod bucket;
pub mod timestamp;
mod types;

use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;
use crate::fetch::Gateway;

pub use bucket::{bucket_by_day, for_day, DayKey};
pub use types::*;

/// A plan collection exposed by the backend
pub trait PlanResource: Scheduled + DeserializeOwned + Clone {
    /// Collection path, e.g. `/workout-plans/`
    const PATH: &'static str;
    /// Path listing the signed-in user's own plans
    const USER_PATH: &'static str;
    /// Creation payload
    type New: Serialize;
}

impl PlanResource for WorkoutPlan {
    const PATH: &'static str = "/workout-plans/";
    const USER_PATH: &'static str = "/workout-plans/user";
    type New = NewWorkoutPlan;
}

impl PlanResource for MealPlan {
    const PATH: &'static str = "/meal-plans/";
    const USER_PATH: &'static str = "/meal-plans/user";
    type New = NewMealPlan;
}

/// Client for one plan collection
pub struct PlansClient<P> {
    gateway: Arc<Gateway>,
    _kind: PhantomData<P>,
}

pub type WorkoutPlansClient = PlansClient<WorkoutPlan>;
pub type MealPlansClient = PlansClient<MealPlan>;

impl<P: PlanResource> PlansClient<P> {
    pub(crate) fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            _kind: PhantomData,
        }
    }

    /// All plans visible to the caller (admins see the plans they manage)
    pub async fn list(&self) -> Result<Vec<P>> {
        self.gateway.get(P::PATH).execute().await
    }

    /// Plans assigned to the signed-in user
    pub async fn list_for_user(&self) -> Result<Vec<P>> {
        self.gateway.get(P::USER_PATH).execute().await
    }

    /// Create and assign a plan (admin only)
    pub async fn create(&self, plan: &P::New) -> Result<P> {
        self.gateway.post(P::PATH).json(plan)?.execute().await
    }

    /// The signed-in user's plans scheduled on `day`
    pub async fn for_day(&self, day: impl Into<DayKey>) -> Result<Vec<P>> {
        let plans = self.list_for_user().await?;
        Ok(bucket::for_day(&plans, day))
    }
}

impl PlansClient<MealPlan> {
    /// Ask the AI generator for a plan without saving it
    pub async fn generate_with_ai(&self, request: &AiMealPlanRequest) -> Result<AiMealPlanResponse> {
        self.gateway
            .post("/meal-plans/ai-generate/")
            .json(request)?
            .execute()
            .await
    }

    /// Generate a plan with AI and save it for `request.user_id`
    pub async fn generate_and_save(&self, request: &AiMealPlanRequest) -> Result<MealPlan> {
        self.gateway
            .post("/meal-plans/ai-generate-and-save/")
            .json(request)?
            .execute()
            .await
    }
}
