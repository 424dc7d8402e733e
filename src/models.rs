// ABOUTME: Core domain models for recipes, ingredients, instructions, and user profiles
// ABOUTME: Mirrors the relational schema with serde-serializable row structs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Snapdish

//! # Data Models
//!
//! Row-level domain types. A [`Recipe`] exclusively owns its [`Ingredient`]
//! and [`Instruction`] rows (deleting a recipe removes its children); a
//! [`UserProfile`] is referenced by recipes but does not own them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Recipe difficulty rating, one of exactly three values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    /// Suitable for first-time cooks
    Beginner,
    /// Requires some kitchen experience
    Intermediate,
    /// Involved technique or timing
    Advanced,
}

impl Difficulty {
    /// Database/wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }

    /// Parse from the stored text representation
    ///
    /// # Errors
    /// Returns an error for any value outside the three-member enumeration.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "Beginner" => Ok(Self::Beginner),
            "Intermediate" => Ok(Self::Intermediate),
            "Advanced" => Ok(Self::Advanced),
            other => Err(AppError::invalid_input(format!(
                "unknown difficulty value: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user profile row, keyed separately from the external auth subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Profile row id (recipes reference this, not the auth subject)
    pub id: i64,
    /// Subject identifier issued by the external auth platform
    pub auth_subject: String,
    /// Display name
    pub full_name: String,
    /// Contact email
    pub email: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A recipe row. The name is required and non-empty; the id is immutable
/// once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Recipe identifier
    pub id: i64,
    /// Owning user profile id
    pub user_id: i64,
    /// Recipe name (non-empty)
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Cook time as free text ("45 minutes", "1-2 hours")
    pub cook_time: String,
    /// Number of servings
    pub servings: i64,
    /// Calorie estimate per serving
    pub calories: i64,
    /// Difficulty rating
    pub difficulty: Difficulty,
    /// Denormalized display name of the creating user
    pub chef: String,
    /// Public address of the recipe photo, if one was uploaded
    pub image_url: Option<String>,
    /// Visibility flag; recipes are created private
    pub is_public: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// An ingredient row, unordered relative to its siblings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    /// Ingredient row id
    pub id: i64,
    /// Owning recipe id
    pub recipe_id: i64,
    /// Free-text ingredient name ("2 cups flour")
    pub name: String,
}

/// An instruction row. Step numbers are one-based, contiguous, and unique
/// within a recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    /// Instruction row id
    pub id: i64,
    /// Owning recipe id
    pub recipe_id: i64,
    /// One-based step number
    pub step_number: i64,
    /// Step description
    pub description: String,
}

/// A recipe joined with its child collections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetail {
    /// The parent recipe row
    pub recipe: Recipe,
    /// Ingredient rows
    pub ingredients: Vec<Ingredient>,
    /// Instruction rows ordered by step number
    pub instructions: Vec<Instruction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_roundtrip() {
        for d in [
            Difficulty::Beginner,
            Difficulty::Intermediate,
            Difficulty::Advanced,
        ] {
            assert_eq!(Difficulty::parse(d.as_str()).unwrap(), d);
        }
    }

    #[test]
    fn test_difficulty_rejects_unknown() {
        assert!(Difficulty::parse("Expert").is_err());
        assert!(Difficulty::parse("beginner").is_err());
    }

    #[test]
    fn test_difficulty_serde_uses_exact_names() {
        let json = serde_json::to_string(&Difficulty::Intermediate).unwrap();
        assert_eq!(json, "\"Intermediate\"");
        let parsed: Difficulty = serde_json::from_str("\"Advanced\"").unwrap();
        assert_eq!(parsed, Difficulty::Advanced);
    }
}
