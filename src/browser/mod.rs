pub mod automation;
pub mod chrome;
pub mod cookies;
pub mod driver;
pub mod session;
pub mod wait;
