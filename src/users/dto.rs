use serde::Deserialize;

use crate::auth::repo_types::Role;

/// Admin-side account creation; unlike registration any role may be set.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub role: Option<Role>,
}
