//! Test fixtures for collector integration tests

#![allow(dead_code)]

use serde_json::{Value, json};
use shared::{Role, SignUpForm, UserProfile};

pub fn worker_profile() -> UserProfile {
    UserProfile {
        id: 3,
        username: "achieng".to_string(),
        email: "achieng@farm.test".to_string(),
        role: Role::Worker,
    }
}

pub fn owner_profile() -> UserProfile {
    UserProfile {
        id: 1,
        username: "joe".to_string(),
        email: "joe@farm.test".to_string(),
        role: Role::Owner,
    }
}

pub fn profile_json(profile: &UserProfile) -> Value {
    serde_json::to_value(profile).unwrap()
}

pub fn auth_body(token: &str, profile: &UserProfile) -> Value {
    json!({"token": token, "user": profile_json(profile)})
}

pub fn sign_up_form(role: Role) -> SignUpForm {
    SignUpForm {
        username: "wanjiru".to_string(),
        email: "wanjiru@farm.test".to_string(),
        password: "layers-2024".to_string(),
        confirm_password: "layers-2024".to_string(),
        role: Some(role),
    }
}

pub fn pending_users_body() -> Value {
    json!([
        {"id": 11, "username": "otieno", "email": "otieno@farm.test", "role": "worker", "is_approved": false},
        {"id": 12, "username": "", "email": "new@farm.test", "role": "worker", "is_approved": false}
    ])
}

/// Collection table for 2024-06-01 as the backend returns it
pub fn collection_table_body() -> Value {
    json!({
        "date": "2024-06-01",
        "grand_total": 65,
        "shade_total": 5,
        "cage_total": 60,
        "laying_percentage": "23.44",
        "performance_comment": "Fair",
        "cages": [
            {
                "cage_id": 1,
                "cage_total": 20,
                "front_partition": [
                    {"box": 1, "eggs": 4}, {"box": 2, "eggs": 3}, {"box": 3, "eggs": 0}, {"box": 4, "eggs": 2},
                    {"box": 5, "eggs": 1}, {"box": 6, "eggs": 0}, {"box": 7, "eggs": 0}, {"box": 8, "eggs": 0},
                    {"box": 9, "eggs": 4}, {"box": 10, "eggs": 4}, {"box": 11, "eggs": 2}
                ]
            },
            {
                "cage_id": 2,
                "cage_total": 40,
                "front_partition": [{"box": 1, "eggs": 4}, {"box": 2, "eggs": 4}],
                "middle1_partition": [{"box": 1, "eggs": 2}],
                "back_partition": [{"box": 1, "eggs": 3}]
            }
        ]
    })
}

pub fn dashboard_body() -> Value {
    json!({
        "total_chickens": 250,
        "eggs_today": 181,
        "trays_in_store": "12.5",
        "egg_production": {
            "laying_percentage": 72.4,
            "today_breakdown": {
                "shade_eggs": 6,
                "cages": {"1": {"total": 100, "front": 100, "back": 0}, "2": {"total": 75, "front": 40, "back": 35}}
            }
        },
        "feed_requirements": {"daily_kg": "30.0"},
        "expenses_today": {"total": "1500.00"},
        "sales_today": {"trays": 4}
    })
}
