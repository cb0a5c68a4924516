pub mod traits;
pub mod youtube;

pub use traits::PlatformInfo;
