//! Offline fallback content
//!
//! When no backend is reachable the client can still answer content requests
//! with canned, keyword-selected responses. Generation is pure: the same
//! category and hints always produce the same JSON, and every response is
//! tagged `offline: true`.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use tether_core::fallback::{generate, FallbackCategory};
//!
//! let advice = generate(FallbackCategory::HealthAdvice, &json!({"goal": "More protein"}));
//! assert_eq!(advice["offline"], true);
//! assert_eq!(advice["topic"], "protein");
//! ```

mod templates;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tether_domain::impl_wire_name_conversions;
use tracing::debug;

/// Content families the client knows how to synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackCategory {
    HealthAdvice,
    Recipe,
    WorkoutPlan,
    MealPlan,
    TaskSuggestions,
}

impl_wire_name_conversions!(FallbackCategory {
    HealthAdvice => "health_advice",
    Recipe => "recipe",
    WorkoutPlan => "workout_plan",
    MealPlan => "meal_plan",
    TaskSuggestions => "task_suggestions",
});

/// Generate fallback content from structured hints
///
/// Every string inside `hints` (object values, array items, nested) is
/// searched for keywords, so a request payload can be passed as-is.
pub fn generate(category: FallbackCategory, hints: &Value) -> Value {
    generate_from_text(category, &hint_text(hints))
}

/// Generate fallback content from free text
pub fn generate_from_text(category: FallbackCategory, text: &str) -> Value {
    let text = text.to_lowercase();
    let mut content = match category {
        FallbackCategory::HealthAdvice => templates::health_advice(&text),
        FallbackCategory::Recipe => templates::recipe(&text),
        FallbackCategory::WorkoutPlan => templates::workout_plan(&text),
        FallbackCategory::MealPlan => templates::meal_plan(&text),
        FallbackCategory::TaskSuggestions => templates::task_suggestions(&text),
    };

    if let Value::Object(map) = &mut content {
        map.insert("category".to_string(), Value::String(category.to_string()));
        map.insert("offline".to_string(), Value::Bool(true));
        map.insert(
            "message".to_string(),
            Value::String("Generated offline. Connect to get personalized results.".to_string()),
        );
    }

    debug!(category = %category, "Generated fallback content");
    content
}

/// Case-insensitive substring match against a keyword table
pub(crate) fn matches_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

fn hint_text(hints: &Value) -> String {
    let mut parts = Vec::new();
    collect_strings(hints, &mut parts);
    parts.join(" ")
}

fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_strings(item, out)),
        _ => {}
    }
}
