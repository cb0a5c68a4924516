use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformInfo {
    /// Page opened before and after each workflow; cookies are scoped to it.
    pub home_url: String,
    pub upload_url: String,
    pub studio_url: String,
    /// Host whose cookie file in the cookie store marks a saved login.
    pub cookie_host: String,
}
