use serde::Deserialize;

/// Partial profile update; absent fields are left untouched. Email and
/// password changes ride along and are audited separately.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub timezone: Option<String>,
    pub digest_opt_in: Option<bool>,
    pub email: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}
