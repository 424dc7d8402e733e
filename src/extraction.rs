// ABOUTME: Structured extraction client turning photos into schema-validated recipe objects
// ABOUTME: Defines the RecipeAi seam, the strict result types, and their JSON schemas
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Snapdish

//! # Structured Extraction
//!
//! The extraction contract: a model call either yields an object satisfying
//! the fixed recipe schema or fails with an extraction error. Nothing
//! partial or schema-nonconforming is ever accepted — the request carries a
//! strict JSON schema, and the response is additionally deserialized into
//! [`RecipeDraft`] with unknown fields rejected.
//!
//! Two smaller pre-check variants exist to short-circuit the expensive full
//! extraction when an image is clearly unusable: [`FoodCheck`] (boolean
//! is-food) and [`ImageCheck`] (meal / recipe / invalid).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::{AppError, AppResult};
use crate::llm::OpenAiProvider;
use crate::models::Difficulty;

// ============================================================================
// Prompts
// ============================================================================

const RECIPE_SYSTEM_PROMPT: &str = "Generate a recipe based on the supplied image.";
const RECIPE_USER_PROMPT: &str = "Generate a recipe based on the supplied image.";

const FOOD_CHECK_SYSTEM_PROMPT: &str = "Check whether the supplied image contains food.";
const FOOD_CHECK_USER_PROMPT: &str =
    "Generate the name of the recipe if the supplied image contains food.";

const IMAGE_CHECK_SYSTEM_PROMPT: &str =
    "Check whether the supplied image shows food or a recipe.";
const IMAGE_CHECK_USER_PROMPT: &str = "Is this food or a recipe?";

const COVER_PROMPT_SYSTEM: &str =
    "Write a prompt for an image generation model. The prompt must produce a realistic photograph.";

/// Size passed to the image model for synthesized covers
const COVER_IMAGE_SIZE: &str = "1024x1024";

// ============================================================================
// Extraction Result Types
// ============================================================================

/// A schema-validated recipe extracted from an image
///
/// Unknown fields are rejected so a drifting model response cannot be
/// silently accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeDraft {
    /// Recipe name
    pub name: String,
    /// Short description
    pub description: String,
    /// Cook time as free text
    #[serde(rename = "cookTime")]
    pub cook_time: String,
    /// Number of servings
    pub servings: i64,
    /// Calorie estimate
    pub calories: i64,
    /// One of the three difficulty values
    pub difficulty: Difficulty,
    /// Ingredient names in the order the model produced them
    pub ingredients: Vec<String>,
    /// Instruction strings; list order becomes the step order
    pub instructions: Vec<String>,
}

/// Result of the boolean is-food pre-check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FoodCheck {
    /// Short name for what the image shows
    pub name: String,
    /// Whether the image depicts food
    #[serde(rename = "isFood")]
    pub is_food: bool,
}

/// Category assigned by the two-way pre-check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    /// A photographed dish
    Meal,
    /// A written or printed recipe
    Recipe,
    /// Neither; unusable for extraction
    Invalid,
}

/// Result of the meal/recipe pre-check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageCheck {
    /// Short name for what the image shows
    pub name: String,
    /// Whether the image is usable at all
    #[serde(rename = "isFoodOrRecipe")]
    pub is_food_or_recipe: bool,
    /// Which of the two usable categories it belongs to
    #[serde(rename = "type")]
    pub kind: ImageKind,
}

impl ImageCheck {
    /// Whether the pipeline may proceed to upload and full extraction
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        self.is_food_or_recipe && !matches!(self.kind, ImageKind::Invalid)
    }
}

// ============================================================================
// JSON Schemas (strict structured outputs)
// ============================================================================

/// Schema for the full recipe extraction
#[must_use]
pub fn recipe_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": [
            "name", "description", "cookTime", "servings",
            "calories", "difficulty", "ingredients", "instructions"
        ],
        "properties": {
            "name": { "type": "string" },
            "description": { "type": "string" },
            "cookTime": { "type": "string" },
            "servings": { "type": "integer" },
            "calories": { "type": "integer" },
            "difficulty": { "type": "string", "enum": ["Beginner", "Intermediate", "Advanced"] },
            "ingredients": { "type": "array", "items": { "type": "string" } },
            "instructions": { "type": "array", "items": { "type": "string" } }
        }
    })
}

/// Schema for the boolean is-food pre-check
#[must_use]
pub fn food_check_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["name", "isFood"],
        "properties": {
            "name": { "type": "string" },
            "isFood": { "type": "boolean" }
        }
    })
}

/// Schema for the meal/recipe pre-check
#[must_use]
pub fn image_check_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["name", "isFoodOrRecipe", "type"],
        "properties": {
            "name": { "type": "string" },
            "isFoodOrRecipe": { "type": "boolean" },
            "type": { "type": "string", "enum": ["meal", "recipe", "invalid"] }
        }
    })
}

// ============================================================================
// RecipeAi Trait
// ============================================================================

/// Vision-model operations the ingestion pipeline depends on
///
/// The request handler only sees this trait; production wires it to
/// [`RecipeExtractor`], tests substitute a stub.
#[async_trait]
pub trait RecipeAi: Send + Sync {
    /// Derive a schema-validated recipe from a base64-encoded image
    async fn extract_recipe(&self, image_base64: &str) -> AppResult<RecipeDraft>;

    /// Cheap pre-check: does the image depict food at all?
    async fn check_food(&self, image_base64: &str) -> AppResult<FoodCheck>;

    /// Cheap pre-check: is the image a meal, a recipe, or neither?
    async fn check_image(&self, image_base64: &str) -> AppResult<ImageCheck>;

    /// Render a cover image for a recipe name, returning PNG bytes
    async fn synthesize_image(&self, recipe_name: &str) -> AppResult<Vec<u8>>;
}

/// Production extraction client backed by the `OpenAI` provider
pub struct RecipeExtractor {
    provider: OpenAiProvider,
}

impl RecipeExtractor {
    /// Wrap a configured provider
    #[must_use]
    pub const fn new(provider: OpenAiProvider) -> Self {
        Self { provider }
    }

    fn parse_draft(value: Value) -> AppResult<RecipeDraft> {
        let draft: RecipeDraft = serde_json::from_value(value)
            .map_err(|e| AppError::extraction(format!("schema validation failed: {e}")))?;
        if draft.name.trim().is_empty() {
            return Err(AppError::extraction(
                "schema validation failed: recipe name is empty",
            ));
        }
        Ok(draft)
    }
}

#[async_trait]
impl RecipeAi for RecipeExtractor {
    async fn extract_recipe(&self, image_base64: &str) -> AppResult<RecipeDraft> {
        let value = self
            .provider
            .generate_object(
                RECIPE_SYSTEM_PROMPT,
                RECIPE_USER_PROMPT,
                image_base64,
                "recipe",
                "A detailed recipe with ingredients and instructions.",
                recipe_schema(),
            )
            .await?;
        Self::parse_draft(value)
    }

    async fn check_food(&self, image_base64: &str) -> AppResult<FoodCheck> {
        let value = self
            .provider
            .generate_object(
                FOOD_CHECK_SYSTEM_PROMPT,
                FOOD_CHECK_USER_PROMPT,
                image_base64,
                "foodCheck",
                "A schema to check if the given image is food.",
                food_check_schema(),
            )
            .await?;
        serde_json::from_value(value)
            .map_err(|e| AppError::extraction(format!("schema validation failed: {e}")))
    }

    async fn check_image(&self, image_base64: &str) -> AppResult<ImageCheck> {
        let value = self
            .provider
            .generate_object(
                IMAGE_CHECK_SYSTEM_PROMPT,
                IMAGE_CHECK_USER_PROMPT,
                image_base64,
                "foodCheck",
                "A schema to check if the given image is food or a recipe.",
                image_check_schema(),
            )
            .await?;
        serde_json::from_value(value)
            .map_err(|e| AppError::extraction(format!("schema validation failed: {e}")))
    }

    async fn synthesize_image(&self, recipe_name: &str) -> AppResult<Vec<u8>> {
        let prompt = self
            .provider
            .generate_text(
                COVER_PROMPT_SYSTEM,
                &format!("Generate an image of the recipe \"{recipe_name}\"."),
            )
            .await?;
        self.provider.generate_image(&prompt, COVER_IMAGE_SIZE).await
    }
}
