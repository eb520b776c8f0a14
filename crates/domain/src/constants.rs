//! Client constants
//!
//! Centralized defaults and keyword tables used across the Tether crates.

// Endpoint defaults
pub const DEFAULT_HEALTH_PATH: &str = "/health";
pub const CACHE_BUST_PARAM: &str = "_t";

// Timeouts
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

// Retry policy
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;
/// Opportunistic probing stops once this many consecutive failures pile up.
pub const DEFAULT_PROBE_FAILURE_THRESHOLD: u32 = 3;

// Adaptive polling
pub const HEALTHY_POLL_INTERVAL_SECS: u64 = 30;
pub const DEGRADED_POLL_INTERVAL_SECS: u64 = 120;
pub const ONLINE_SETTLE_DELAY_MS: u64 = 1000;

// Pending work queue
pub const DEFAULT_DRAIN_BATCH_SIZE: usize = 5;
pub const DEFAULT_DRAIN_BATCH_PAUSE_MS: u64 = 1000;

// Event names (wire format)
pub const EVENT_BACKEND_STATUS_CHANGE: &str = "backend-status-change";
pub const EVENT_PENDING_REQUESTS_CHANGE: &str = "pending-requests-change";
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

// Fallback content keyword tables.
// Matching is case-insensitive substring search over the caller's free text.
pub const HEALTH_PROTEIN_KEYWORDS: &[&str] = &["protein", "muscle", "bulk"];
pub const HEALTH_WEIGHT_LOSS_KEYWORDS: &[&str] =
    &["lose weight", "weight loss", "fat loss", "slim down"];
pub const HEALTH_CARDIO_KEYWORDS: &[&str] = &["cardio", "running", "endurance", "stamina"];
pub const HEALTH_SLEEP_KEYWORDS: &[&str] = &["sleep", "insomnia", "tired"];

pub const RECIPE_VEGETARIAN_KEYWORDS: &[&str] = &["vegetarian", "vegan", "plant-based", "tofu"];
pub const RECIPE_CHICKEN_KEYWORDS: &[&str] = &["chicken", "poultry"];
pub const RECIPE_PASTA_KEYWORDS: &[&str] = &["pasta", "spaghetti", "noodle"];

pub const WORKOUT_STRENGTH_KEYWORDS: &[&str] = &["strength", "weights", "lifting", "muscle"];
pub const WORKOUT_CARDIO_KEYWORDS: &[&str] = &["cardio", "running", "hiit", "cycling"];
pub const WORKOUT_MOBILITY_KEYWORDS: &[&str] = &["yoga", "stretch", "mobility", "flexibility"];

pub const MEAL_PLAN_HIGH_PROTEIN_KEYWORDS: &[&str] = &["protein", "muscle", "bulk"];
pub const MEAL_PLAN_LOW_CARB_KEYWORDS: &[&str] = &["low carb", "keto", "lose weight"];

pub const TASK_WORK_KEYWORDS: &[&str] = &["work", "project", "meeting", "deadline"];
pub const TASK_HOME_KEYWORDS: &[&str] = &["home", "clean", "groceries", "laundry"];
