// ABOUTME: Recipe route handlers - photo ingestion pipeline, pre-checks, and read paths
// ABOUTME: Sequences validate, pre-check, upload, extract, persist per request with no retries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Snapdish

//! Recipe routes
//!
//! The ingestion handler walks a strictly linear pipeline per request:
//! validate the payload and credential, pre-check the image content, upload
//! the photo, run the full extraction, persist parent and children in one
//! transaction, respond with the new recipe id. Any failure is terminal for
//! the request — the client may resubmit, which mints a new blob key and a
//! new recipe row (no deduplication by content).

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::{token_from_request, AccessClaims};
use crate::errors::AppError;
use crate::extraction::RecipeDraft;
use crate::models::UserProfile;
use crate::resources::ServerResources;
use crate::storage::object_key;

/// Content type for all uploaded recipe photos
const IMAGE_CONTENT_TYPE: &str = "image/png";

// ============================================================================
// Request Types
// ============================================================================

/// Body of the ingestion endpoint
#[derive(Debug, Deserialize)]
pub struct RecipeFromImageRequest {
    /// Base64-encoded photo
    #[serde(default)]
    pub base64: Option<String>,
    /// Access token fallback for clients that cannot set headers
    #[serde(default, rename = "accessToken")]
    pub access_token: Option<String>,
    /// Render a cover image with the image model instead of uploading the
    /// user photo
    #[serde(default, rename = "synthesizeImage")]
    pub synthesize_image: bool,
}

/// Body of the two pre-check endpoints
#[derive(Debug, Deserialize)]
pub struct ImageCheckRequest {
    /// Base64-encoded photo
    #[serde(default)]
    pub base64: Option<String>,
    /// What the client believes it is uploading ("meal" or "recipe")
    #[serde(default, rename = "uploadType")]
    pub upload_type: Option<String>,
}

// ============================================================================
// Recipe Routes
// ============================================================================

/// Recipe routes handler
pub struct RecipeRoutes;

impl RecipeRoutes {
    /// Create all recipe routes
    #[must_use]
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/recipes/from-image", post(Self::create_from_image))
            .route("/api/recipes/food-check", post(Self::food_check))
            .route("/api/recipes/image-check", post(Self::image_check))
            .route("/api/recipes", get(Self::list_recipes))
            .route(
                "/api/recipes/:recipe_id",
                get(Self::get_recipe).delete(Self::delete_recipe),
            )
            .with_state(resources)
    }

    /// Validate the request credential and return its claims
    fn authenticate(
        headers: &HeaderMap,
        body_token: Option<&str>,
        resources: &ServerResources,
    ) -> Result<AccessClaims, AppError> {
        let token = token_from_request(headers, body_token)?;
        resources.auth.validate(&token)
    }

    /// Resolve the profile row for an authenticated subject
    async fn resolve_profile(
        claims: &AccessClaims,
        resources: &ServerResources,
    ) -> Result<UserProfile, AppError> {
        resources.database.require_user_by_subject(&claims.sub).await
    }

    /// Require the image payload field and return it
    fn require_image(base64: Option<&str>) -> Result<&str, AppError> {
        match base64 {
            Some(image) if !image.is_empty() => Ok(image),
            _ => Err(AppError::validation("Image not provided")),
        }
    }

    /// Decode the payload into raw bytes (data-URL prefix tolerated)
    fn decode_image(image_base64: &str) -> Result<Vec<u8>, AppError> {
        let encoded = image_base64
            .split_once(";base64,")
            .map_or(image_base64, |(_, rest)| rest);
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| AppError::invalid_input(format!("image is not valid base64: {e}")))
    }

    /// POST /api/recipes/from-image
    ///
    /// The full ingestion pipeline. Strictly sequential; each failure is
    /// terminal for the request.
    async fn create_from_image(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<RecipeFromImageRequest>,
    ) -> Result<Response, AppError> {
        // Received -> Validated
        let image = Self::require_image(request.base64.as_deref())?;
        let claims =
            Self::authenticate(&headers, request.access_token.as_deref(), &resources)?;

        // Content pre-check runs before any upload or full extraction so an
        // unusable image costs neither storage nor the expensive model call
        let check = resources.ai.check_image(image).await?;
        if !check.is_usable() {
            return Err(AppError::image_rejected(format!(
                "The image does not appear to contain food or a recipe ({})",
                check.name
            )));
        }

        // Validated -> Uploaded (skipped when a cover will be synthesized;
        // that variant uploads the rendered image after extraction instead)
        let photo_url = if request.synthesize_image {
            None
        } else {
            let bytes = Self::decode_image(image)?;
            let key = object_key(&claims.sub, Utc::now());
            Some(resources.storage.put(&key, bytes, IMAGE_CONTENT_TYPE).await?)
        };

        // Uploaded -> Extracted
        let draft = resources.ai.extract_recipe(image).await?;

        let image_url = match photo_url {
            Some(url) => url,
            None => {
                let rendered = resources.ai.synthesize_image(&draft.name).await?;
                let key = object_key(&claims.sub, Utc::now());
                resources.storage.put(&key, rendered, IMAGE_CONTENT_TYPE).await?
            }
        };

        // Extracted -> Persisted
        let profile = Self::resolve_profile(&claims, &resources).await?;
        let recipe_id = Self::persist(&resources, &profile, &draft, &image_url).await?;

        info!(
            recipe_id,
            user = profile.id,
            steps = draft.instructions.len(),
            "recipe created from image"
        );

        // Persisted -> Responded
        Ok((
            StatusCode::OK,
            Json(json!({ "data": { "success": true, "recipeId": recipe_id } })),
        )
            .into_response())
    }

    async fn persist(
        resources: &ServerResources,
        profile: &UserProfile,
        draft: &RecipeDraft,
        image_url: &str,
    ) -> Result<i64, AppError> {
        resources
            .database
            .insert_recipe(profile, draft, Some(image_url))
            .await
    }

    /// POST /api/recipes/food-check
    async fn food_check(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ImageCheckRequest>,
    ) -> Result<Response, AppError> {
        let image = Self::require_image(request.base64.as_deref())?;
        Self::authenticate(&headers, None, &resources)?;

        let check = resources.ai.check_food(image).await?;
        Ok(Json(check).into_response())
    }

    /// POST /api/recipes/image-check
    async fn image_check(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ImageCheckRequest>,
    ) -> Result<Response, AppError> {
        let image = Self::require_image(request.base64.as_deref())?;
        Self::authenticate(&headers, None, &resources)?;

        if let Some(upload_type) = request.upload_type.as_deref() {
            debug!(upload_type, "image check requested");
        }

        let check = resources.ai.check_image(image).await?;
        Ok(Json(check).into_response())
    }

    /// GET /api/recipes — the caller's own recipes plus public ones
    async fn list_recipes(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let claims = Self::authenticate(&headers, None, &resources)?;
        let profile = Self::resolve_profile(&claims, &resources).await?;

        let recipes = resources.database.list_recipes_for(profile.id).await?;
        Ok(Json(json!({ "recipes": recipes })).into_response())
    }

    /// GET /api/recipes/:recipe_id — recipe with ingredients and ordered steps
    async fn get_recipe(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(recipe_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let claims = Self::authenticate(&headers, None, &resources)?;
        let profile = Self::resolve_profile(&claims, &resources).await?;

        let detail = resources
            .database
            .get_recipe_detail(recipe_id, profile.id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe"))?;
        Ok(Json(detail).into_response())
    }

    /// DELETE /api/recipes/:recipe_id — owner only; children cascade
    async fn delete_recipe(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(recipe_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let claims = Self::authenticate(&headers, None, &resources)?;
        let profile = Self::resolve_profile(&claims, &resources).await?;

        let deleted = resources
            .database
            .delete_recipe(recipe_id, profile.id)
            .await?;
        if !deleted {
            return Err(AppError::not_found("Recipe"));
        }

        info!(recipe_id, user = profile.id, "recipe deleted");
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}
