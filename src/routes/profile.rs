use axum::{Json, http::Method};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Demo profile served to the dashboard before a real profile store is wired up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub points: u32,
    pub level: String,
}

impl UserProfile {
    pub fn demo() -> Self {
        Self {
            id: "12345".to_string(),
            name: "John Doe".to_string(),
            email: "johndoe@example.com".to_string(),
            points: 1200,
            level: "Gold".to_string(),
        }
    }
}

pub async fn user_profile_handler(method: Method) -> Result<Json<UserProfile>, AppError> {
    if method != Method::GET {
        return Err(AppError::MethodNotAllowed("Method Not Allowed"));
    }
    Ok(Json(UserProfile::demo()))
}
