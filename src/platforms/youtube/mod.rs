pub mod datetime;
pub mod locators;
pub mod metadata;
pub mod schedule;
pub mod upload;

use super::traits::PlatformInfo;

pub const YOUTUBE_URL: &str = "https://www.youtube.com";
pub const YOUTUBE_STUDIO_URL: &str = "https://studio.youtube.com";
pub const YOUTUBE_UPLOAD_URL: &str = "https://www.youtube.com/upload";

pub fn info() -> PlatformInfo {
    PlatformInfo {
        home_url: YOUTUBE_URL.into(),
        upload_url: YOUTUBE_UPLOAD_URL.into(),
        studio_url: YOUTUBE_STUDIO_URL.into(),
        cookie_host: "www.youtube.com".into(),
    }
}
