use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "employee_id": 523118401,
        "username": "jdoe",
        "first_name": "John",
        "last_name": "Doe",
        "phone": "+201012345678",
        "is_active": true,
        "created_at": "2025-01-06T09:02:11"
    })
)]
pub struct Employee {
    /// Opaque chat-platform user id, the primary key everywhere.
    #[schema(example = 523118401i64)]
    pub employee_id: i64,

    #[schema(example = "jdoe", nullable = true)]
    pub username: Option<String>,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe", nullable = true)]
    pub last_name: Option<String>,

    #[schema(example = "+201012345678", nullable = true)]
    pub phone: Option<String>,

    /// Soft-delete flag; employees are never hard-deleted.
    pub is_active: bool,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

impl Employee {
    /// "First Last", falling back to the username or the numeric id.
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None if !self.first_name.is_empty() => self.first_name.clone(),
            None => self
                .username
                .clone()
                .unwrap_or_else(|| self.employee_id.to_string()),
        }
    }
}

/// Registration payload, collected from a shared contact.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewEmployee {
    pub employee_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}
