//! Canned content per category
//!
//! Each builder receives lowercased hint text and returns a JSON object;
//! the caller adds the shared `category`/`offline`/`message` tags.

use serde_json::{json, Value};
use tether_domain::constants::{
    HEALTH_CARDIO_KEYWORDS, HEALTH_PROTEIN_KEYWORDS, HEALTH_SLEEP_KEYWORDS,
    HEALTH_WEIGHT_LOSS_KEYWORDS, MEAL_PLAN_HIGH_PROTEIN_KEYWORDS, MEAL_PLAN_LOW_CARB_KEYWORDS,
    RECIPE_CHICKEN_KEYWORDS, RECIPE_PASTA_KEYWORDS, RECIPE_VEGETARIAN_KEYWORDS,
    TASK_HOME_KEYWORDS, TASK_WORK_KEYWORDS, WORKOUT_CARDIO_KEYWORDS, WORKOUT_MOBILITY_KEYWORDS,
    WORKOUT_STRENGTH_KEYWORDS,
};

use super::matches_any;

const HEALTH_DISCLAIMER: &str =
    "General guidance only. Consult a healthcare professional for personal advice.";

pub(super) fn health_advice(text: &str) -> Value {
    let (topic, advice): (&str, &[&str]) = if matches_any(text, HEALTH_PROTEIN_KEYWORDS) {
        (
            "protein",
            &[
                "Include a protein source in every meal, such as eggs, legumes, fish or poultry.",
                "Spread protein intake evenly across the day.",
                "Pair protein with resistance training to support muscle growth.",
            ],
        )
    } else if matches_any(text, HEALTH_WEIGHT_LOSS_KEYWORDS) {
        (
            "weight_loss",
            &[
                "Aim for a modest, sustainable calorie deficit.",
                "Fill half your plate with vegetables.",
                "Prefer water over sugary drinks.",
                "Stay active daily, even with short walks.",
            ],
        )
    } else if matches_any(text, HEALTH_CARDIO_KEYWORDS) {
        (
            "cardio",
            &[
                "Build up to 150 minutes of moderate cardio per week.",
                "Warm up for 5 to 10 minutes before harder efforts.",
                "Increase duration gradually, about 10% per week.",
            ],
        )
    } else if matches_any(text, HEALTH_SLEEP_KEYWORDS) {
        (
            "sleep",
            &[
                "Keep a consistent sleep and wake time.",
                "Avoid screens for an hour before bed.",
                "Limit caffeine after early afternoon.",
            ],
        )
    } else {
        (
            "general",
            &[
                "Eat a variety of whole foods.",
                "Drink water throughout the day.",
                "Move your body every day.",
                "Aim for 7 to 9 hours of sleep.",
            ],
        )
    };

    json!({
        "topic": topic,
        "advice": advice,
        "disclaimer": HEALTH_DISCLAIMER,
    })
}

pub(super) fn recipe(text: &str) -> Value {
    if matches_any(text, RECIPE_VEGETARIAN_KEYWORDS) {
        json!({
            "variant": "vegetarian",
            "title": "Chickpea and Vegetable Stir-Fry",
            "prep_minutes": 20,
            "ingredients": ["1 can chickpeas", "2 cups mixed vegetables", "2 tbsp soy sauce", "1 tbsp olive oil", "1 clove garlic"],
            "steps": [
                "Heat the oil and sauté the garlic.",
                "Add vegetables and cook until tender-crisp.",
                "Stir in chickpeas and soy sauce; heat through.",
            ],
        })
    } else if matches_any(text, RECIPE_CHICKEN_KEYWORDS) {
        json!({
            "variant": "chicken",
            "title": "Simple Baked Chicken",
            "prep_minutes": 35,
            "ingredients": ["2 chicken breasts", "1 tbsp olive oil", "1 tsp paprika", "salt", "pepper"],
            "steps": [
                "Preheat the oven to 200°C.",
                "Rub chicken with oil and seasoning.",
                "Bake for 22 to 25 minutes until cooked through.",
            ],
        })
    } else if matches_any(text, RECIPE_PASTA_KEYWORDS) {
        json!({
            "variant": "pasta",
            "title": "Garlic Tomato Pasta",
            "prep_minutes": 25,
            "ingredients": ["200 g pasta", "1 can chopped tomatoes", "2 cloves garlic", "1 tbsp olive oil", "fresh basil"],
            "steps": [
                "Cook pasta according to the package.",
                "Simmer garlic and tomatoes in oil for 10 minutes.",
                "Toss pasta with the sauce and top with basil.",
            ],
        })
    } else {
        json!({
            "variant": "general",
            "title": "Quick Veggie Omelette",
            "prep_minutes": 10,
            "ingredients": ["3 eggs", "1/2 cup chopped vegetables", "salt", "pepper"],
            "steps": [
                "Whisk the eggs with salt and pepper.",
                "Cook the vegetables briefly in a pan.",
                "Pour in the eggs and cook until set.",
            ],
        })
    }
}

pub(super) fn workout_plan(text: &str) -> Value {
    let (focus, exercises) = if matches_any(text, WORKOUT_STRENGTH_KEYWORDS) {
        (
            "strength",
            json!([
                {"name": "Squats", "sets": 3, "reps": 10},
                {"name": "Push-ups", "sets": 3, "reps": 12},
                {"name": "Bent-over rows", "sets": 3, "reps": 10},
                {"name": "Plank", "sets": 3, "duration_seconds": 45},
            ]),
        )
    } else if matches_any(text, WORKOUT_CARDIO_KEYWORDS) {
        (
            "cardio",
            json!([
                {"name": "Brisk warm-up walk", "duration_minutes": 5},
                {"name": "Intervals: 1 min fast, 2 min easy", "sets": 6},
                {"name": "Cool-down walk", "duration_minutes": 5},
            ]),
        )
    } else if matches_any(text, WORKOUT_MOBILITY_KEYWORDS) {
        (
            "mobility",
            json!([
                {"name": "Cat-cow", "sets": 2, "reps": 10},
                {"name": "Hip flexor stretch", "sets": 2, "duration_seconds": 30},
                {"name": "Thoracic rotations", "sets": 2, "reps": 8},
                {"name": "Child's pose", "sets": 1, "duration_seconds": 60},
            ]),
        )
    } else {
        (
            "full_body",
            json!([
                {"name": "Jumping jacks", "sets": 2, "duration_seconds": 45},
                {"name": "Bodyweight squats", "sets": 3, "reps": 12},
                {"name": "Push-ups", "sets": 3, "reps": 8},
                {"name": "Glute bridges", "sets": 3, "reps": 12},
            ]),
        )
    };

    json!({
        "focus": focus,
        "duration_minutes": 30,
        "exercises": exercises,
    })
}

pub(super) fn meal_plan(text: &str) -> Value {
    if matches_any(text, MEAL_PLAN_HIGH_PROTEIN_KEYWORDS) {
        json!({
            "variant": "high_protein",
            "meals": {
                "breakfast": "Greek yogurt with nuts and berries",
                "lunch": "Grilled chicken salad with quinoa",
                "dinner": "Baked salmon with roasted vegetables",
                "snack": "Cottage cheese or a protein shake",
            },
        })
    } else if matches_any(text, MEAL_PLAN_LOW_CARB_KEYWORDS) {
        json!({
            "variant": "low_carb",
            "meals": {
                "breakfast": "Vegetable omelette",
                "lunch": "Tuna lettuce wraps",
                "dinner": "Grilled steak with green beans",
                "snack": "A handful of almonds",
            },
        })
    } else {
        json!({
            "variant": "balanced",
            "meals": {
                "breakfast": "Oatmeal with fruit",
                "lunch": "Whole-grain wrap with lean protein and vegetables",
                "dinner": "Stir-fried vegetables with rice and tofu or chicken",
                "snack": "Fresh fruit",
            },
        })
    }
}

pub(super) fn task_suggestions(text: &str) -> Value {
    let (context, suggestions): (&str, &[&str]) = if matches_any(text, TASK_WORK_KEYWORDS) {
        (
            "work",
            &[
                "List the three most important outcomes for today.",
                "Block focused time for the hardest task first.",
                "Prepare an agenda for your next meeting.",
                "Review upcoming deadlines for the week.",
            ],
        )
    } else if matches_any(text, TASK_HOME_KEYWORDS) {
        (
            "home",
            &[
                "Write a grocery list for the week.",
                "Tidy one room for 15 minutes.",
                "Start a load of laundry.",
                "Plan tomorrow's meals.",
            ],
        )
    } else {
        (
            "general",
            &[
                "Write down everything on your mind.",
                "Pick one small task and finish it.",
                "Take a short break and stretch.",
            ],
        )
    };

    json!({
        "context": context,
        "suggestions": suggestions,
    })
}
