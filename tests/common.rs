// ABOUTME: Shared fixtures for integration tests
// ABOUTME: Provides a stub extraction client, in-memory blob store, and token minting

#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use sqlx::Row;

use snapdish_server::{
    auth::AuthValidator,
    database::Database,
    errors::{AppError, AppResult},
    extraction::{FoodCheck, ImageCheck, ImageKind, RecipeAi, RecipeDraft},
    models::{Difficulty, UserProfile},
    resources::ServerResources,
    routes::RecipeRoutes,
    storage::MemoryBlobStore,
};

/// Shared JWT secret for all tests
pub const TEST_JWT_SECRET: &[u8] = b"test-jwt-secret";

/// A small valid base64 payload standing in for a photo
pub const TEST_IMAGE_BASE64: &str = "aGVsbG8gd29ybGQ=";

/// Stub `RecipeAi` with configurable results and call counters
pub struct StubRecipeAi {
    /// Draft returned by `extract_recipe`; `None` simulates a
    /// schema-nonconforming model response
    pub draft: Mutex<Option<RecipeDraft>>,
    /// Result returned by `check_image`
    pub image_check: Mutex<ImageCheck>,
    /// Result returned by `check_food`
    pub food_check: Mutex<FoodCheck>,
    /// Number of `extract_recipe` calls
    pub extract_calls: AtomicUsize,
    /// Number of pre-check calls (either variant)
    pub check_calls: AtomicUsize,
    /// Number of `synthesize_image` calls
    pub synth_calls: AtomicUsize,
}

impl Default for StubRecipeAi {
    fn default() -> Self {
        Self {
            draft: Mutex::new(Some(hamburger_draft())),
            image_check: Mutex::new(ImageCheck {
                name: "Hamburger".to_owned(),
                is_food_or_recipe: true,
                kind: ImageKind::Meal,
            }),
            food_check: Mutex::new(FoodCheck {
                name: "Hamburger".to_owned(),
                is_food: true,
            }),
            extract_calls: AtomicUsize::new(0),
            check_calls: AtomicUsize::new(0),
            synth_calls: AtomicUsize::new(0),
        }
    }
}

impl StubRecipeAi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `extract_recipe` fail as if the model returned a malformed object
    pub fn fail_extraction(&self) {
        *self.draft.lock().unwrap() = None;
    }

    /// Make the pre-checks report a non-food image
    pub fn reject_images(&self, name: &str) {
        *self.image_check.lock().unwrap() = ImageCheck {
            name: name.to_owned(),
            is_food_or_recipe: false,
            kind: ImageKind::Invalid,
        };
        *self.food_check.lock().unwrap() = FoodCheck {
            name: name.to_owned(),
            is_food: false,
        };
    }
}

#[async_trait]
impl RecipeAi for StubRecipeAi {
    async fn extract_recipe(&self, _image_base64: &str) -> AppResult<RecipeDraft> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        self.draft.lock().unwrap().clone().ok_or_else(|| {
            AppError::extraction("schema validation failed: missing field `servings`")
        })
    }

    async fn check_food(&self, _image_base64: &str) -> AppResult<FoodCheck> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.food_check.lock().unwrap().clone())
    }

    async fn check_image(&self, _image_base64: &str) -> AppResult<ImageCheck> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.image_check.lock().unwrap().clone())
    }

    async fn synthesize_image(&self, _recipe_name: &str) -> AppResult<Vec<u8>> {
        self.synth_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}

/// The concrete scenario draft: four ordered instructions
pub fn hamburger_draft() -> RecipeDraft {
    RecipeDraft {
        name: "Hamburger Deluxe".to_owned(),
        description: "A juicy grilled burger.".to_owned(),
        cook_time: "30 minutes".to_owned(),
        servings: 2,
        calories: 650,
        difficulty: Difficulty::Beginner,
        ingredients: vec![
            "2 burger buns".to_owned(),
            "300g ground beef".to_owned(),
            "2 slices cheddar".to_owned(),
        ],
        instructions: vec![
            "Preheat grill".to_owned(),
            "Form patties".to_owned(),
            "Grill 4 minutes per side".to_owned(),
            "Assemble burger".to_owned(),
        ],
    }
}

#[derive(Serialize)]
struct TestTokenClaims {
    sub: String,
    email: String,
    exp: i64,
}

/// Mint an HS256 access token for a subject
pub fn mint_token(subject: &str) -> String {
    let claims = TestTokenClaims {
        sub: subject.to_owned(),
        email: format!("{subject}@example.com"),
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET),
    )
    .unwrap()
}

/// Everything a test needs: wired resources plus handles to the stubs
pub struct TestContext {
    pub resources: Arc<ServerResources>,
    pub database: Database,
    pub store: Arc<MemoryBlobStore>,
    pub ai: Arc<StubRecipeAi>,
    pub profile: UserProfile,
    pub token: String,
    _db_file: tempfile::NamedTempFile,
}

impl TestContext {
    /// Router over the recipe routes
    pub fn router(&self) -> axum::Router {
        RecipeRoutes::routes(self.resources.clone())
    }

    /// Bearer header value for the seeded user
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Count rows in a table directly
    pub async fn count(&self, table: &str) -> i64 {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {table}"))
            .fetch_one(self.database.pool())
            .await
            .unwrap();
        row.try_get("n").unwrap()
    }
}

/// Create a file-backed database, seed one user, and wire stub resources
pub async fn setup() -> TestContext {
    let db_file = tempfile::NamedTempFile::new().unwrap();
    let database = Database::new(&format!("sqlite:{}", db_file.path().display()))
        .await
        .unwrap();

    let profile = database
        .create_user("subject-1", "Test Chef", "chef@example.com")
        .await
        .unwrap();

    let store = Arc::new(MemoryBlobStore::new());
    let ai = Arc::new(StubRecipeAi::new());
    let auth = AuthValidator::new(TEST_JWT_SECRET);

    let resources = Arc::new(ServerResources::new(
        database.clone(),
        store.clone(),
        ai.clone(),
        auth,
    ));

    TestContext {
        resources,
        database,
        store,
        ai,
        profile,
        token: mint_token("subject-1"),
        _db_file: db_file,
    }
}
