use axum::Json;
use serde_json::{Value, json};

/// `GET /`: greeting and endpoint map.
pub async fn welcome() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the Grace Pharmacy Users API",
        "endpoints": {
            "users": "/users",
            "userById": "/users/:id",
            "profiles": "/profiles",
            "profileById": "/profiles/:id",
            "login": "/github",
        },
    }))
}
