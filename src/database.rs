// ABOUTME: Database management for user profiles, recipes, and their child rows
// ABOUTME: SQLite via sqlx with an inline migration and a transactional recipe writer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Snapdish

//! # Database Management
//!
//! Persistence layer for the ingestion pipeline. The central operation is
//! [`Database::insert_recipe`], which writes the recipe row and both child
//! collections inside one transaction: a failure after the parent insert
//! rolls the whole recipe back, so no orphaned parents can exist.
//!
//! Step numbers are assigned from the order of the extracted instruction
//! list (first item = step 1) and are unique per recipe at the schema level.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use crate::errors::{AppError, AppResult};
use crate::extraction::RecipeDraft;
use crate::models::{Difficulty, Ingredient, Instruction, Recipe, RecipeDetail, UserProfile};

/// Database manager for profile and recipe storage
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the database and run migrations
    ///
    /// # Errors
    /// Returns an error if the connection options are invalid, the pool
    /// cannot be established, or the migration fails.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            // Cascade deletes from recipes to children rely on this pragma
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations
    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                auth_subject TEXT UNIQUE NOT NULL,
                full_name TEXT NOT NULL,
                email TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS recipes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                name TEXT NOT NULL CHECK (length(name) > 0),
                description TEXT NOT NULL DEFAULT '',
                cook_time TEXT NOT NULL DEFAULT '',
                servings INTEGER NOT NULL DEFAULT 0,
                calories INTEGER NOT NULL DEFAULT 0,
                difficulty TEXT NOT NULL DEFAULT 'Beginner',
                chef TEXT NOT NULL DEFAULT 'Unknown Chef',
                image_url TEXT,
                is_public INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS ingredients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                name TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS instructions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                step_number INTEGER NOT NULL,
                description TEXT NOT NULL,
                UNIQUE (recipe_id, step_number)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_recipes_user_id ON recipes(user_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_ingredients_recipe_id ON ingredients(recipe_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_instructions_recipe_id ON instructions(recipe_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Access the underlying pool (used by tests and diagnostics)
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a user profile row for an auth subject
    ///
    /// # Errors
    /// Returns a database error if the subject already has a profile.
    pub async fn create_user(
        &self,
        auth_subject: &str,
        full_name: &str,
        email: &str,
    ) -> AppResult<UserProfile> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (auth_subject, full_name, email, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(auth_subject)
        .bind(full_name)
        .bind(email)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(UserProfile {
            id: result.last_insert_rowid(),
            auth_subject: auth_subject.to_owned(),
            full_name: full_name.to_owned(),
            email: email.to_owned(),
            created_at,
        })
    }

    /// Look up a profile by its external auth subject
    ///
    /// # Errors
    /// Returns a database error if the query fails.
    pub async fn get_user_by_subject(&self, auth_subject: &str) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query(
            "SELECT id, auth_subject, full_name, email, created_at FROM users WHERE auth_subject = ?",
        )
        .bind(auth_subject)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Resolve the profile for an authenticated subject, failing the write
    /// path if no profile exists
    ///
    /// # Errors
    /// Returns a persistence error when the subject has no profile row.
    pub async fn require_user_by_subject(&self, auth_subject: &str) -> AppResult<UserProfile> {
        self.get_user_by_subject(auth_subject)
            .await?
            .ok_or_else(|| AppError::persistence("user profile not found for auth subject"))
    }

    /// Insert a recipe with its ingredients and ordered instructions as one
    /// logical unit of write
    ///
    /// Visibility defaults to private. Step numbers are assigned from the
    /// instruction list order, starting at 1. All three inserts share one
    /// transaction.
    ///
    /// # Errors
    /// Returns an invalid-input error for an empty recipe name, or a
    /// persistence error (with the whole recipe rolled back) if any insert
    /// fails.
    pub async fn insert_recipe(
        &self,
        user: &UserProfile,
        draft: &RecipeDraft,
        image_url: Option<&str>,
    ) -> AppResult<i64> {
        if draft.name.trim().is_empty() {
            return Err(AppError::invalid_input("recipe name must be non-empty"));
        }

        self.insert_recipe_tx(user, draft, image_url)
            .await
            .map_err(|e| AppError::persistence(e.to_string()).with_source(e))
    }

    async fn insert_recipe_tx(
        &self,
        user: &UserProfile,
        draft: &RecipeDraft,
        image_url: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let recipe_id = sqlx::query(
            r"
            INSERT INTO recipes
                (user_id, name, description, cook_time, servings, calories,
                 difficulty, chef, image_url, is_public, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
            ",
        )
        .bind(user.id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.cook_time)
        .bind(draft.servings)
        .bind(draft.calories)
        .bind(draft.difficulty.as_str())
        .bind(&user.full_name)
        .bind(image_url)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for ingredient in &draft.ingredients {
            sqlx::query("INSERT INTO ingredients (recipe_id, name) VALUES (?, ?)")
                .bind(recipe_id)
                .bind(ingredient)
                .execute(&mut *tx)
                .await?;
        }

        // The extracted list is consumed exactly once; first item = step 1
        for (index, description) in draft.instructions.iter().enumerate() {
            sqlx::query(
                "INSERT INTO instructions (recipe_id, step_number, description) VALUES (?, ?, ?)",
            )
            .bind(recipe_id)
            .bind(index as i64 + 1)
            .bind(description)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(recipe_id)
    }

    /// List recipes visible to a user: their own plus public ones, newest
    /// first
    ///
    /// # Errors
    /// Returns a database error if the query fails.
    pub async fn list_recipes_for(&self, user_id: i64) -> AppResult<Vec<Recipe>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, name, description, cook_time, servings, calories,
                   difficulty, chef, image_url, is_public, created_at
            FROM recipes
            WHERE user_id = ? OR is_public = 1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_recipe).collect()
    }

    /// Fetch a recipe with its children, if it exists and is visible to the
    /// viewer (owner or public)
    ///
    /// # Errors
    /// Returns a database error if any query fails.
    pub async fn get_recipe_detail(
        &self,
        recipe_id: i64,
        viewer_user_id: i64,
    ) -> AppResult<Option<RecipeDetail>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, name, description, cook_time, servings, calories,
                   difficulty, chef, image_url, is_public, created_at
            FROM recipes
            WHERE id = ?
            ",
        )
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let recipe = row_to_recipe(&row)?;
        if recipe.user_id != viewer_user_id && !recipe.is_public {
            return Ok(None);
        }

        let ingredients = sqlx::query("SELECT id, recipe_id, name FROM ingredients WHERE recipe_id = ?")
            .bind(recipe_id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| -> AppResult<Ingredient> {
                Ok(Ingredient {
                    id: row.try_get("id")?,
                    recipe_id: row.try_get("recipe_id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let instructions = sqlx::query(
            r"
            SELECT id, recipe_id, step_number, description
            FROM instructions
            WHERE recipe_id = ?
            ORDER BY step_number ASC
            ",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| -> AppResult<Instruction> {
            Ok(Instruction {
                id: row.try_get("id")?,
                recipe_id: row.try_get("recipe_id")?,
                step_number: row.try_get("step_number")?,
                description: row.try_get("description")?,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

        Ok(Some(RecipeDetail {
            recipe,
            ingredients,
            instructions,
        }))
    }

    /// Delete a recipe the caller owns; children are removed by cascade
    ///
    /// Returns `false` when the recipe does not exist or belongs to someone
    /// else.
    ///
    /// # Errors
    /// Returns a database error if the delete fails.
    pub async fn delete_recipe(&self, recipe_id: i64, owner_user_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = ? AND user_id = ?")
            .bind(recipe_id)
            .bind(owner_user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_user(row: &SqliteRow) -> AppResult<UserProfile> {
    Ok(UserProfile {
        id: row.try_get("id")?,
        auth_subject: row.try_get("auth_subject")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
    })
}

fn row_to_recipe(row: &SqliteRow) -> AppResult<Recipe> {
    Ok(Recipe {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        cook_time: row.try_get("cook_time")?,
        servings: row.try_get("servings")?,
        calories: row.try_get("calories")?,
        difficulty: Difficulty::parse(&row.try_get::<String, _>("difficulty")?)?,
        chef: row.try_get("chef")?,
        image_url: row.try_get("image_url")?,
        is_public: row.try_get("is_public")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
    })
}

fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::internal(format!("invalid stored timestamp {value}: {e}")))
}
