pub mod browser;
pub mod commands;
pub mod config;
pub mod database;
pub mod platforms;

#[cfg(test)]
mod testing;

/// Initialize `env_logger` at `info` unless `RUST_LOG` says otherwise.
/// Logs go to stderr so stdout carries only JSON results.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
}
