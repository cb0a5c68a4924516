use super::open_session;
use crate::config::AppConfig;
use crate::platforms::youtube::schedule::{get_schedule, ScheduleReport};
use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use log::info;

/// `None` or an empty value means timestamps are reported without a zone.
pub fn parse_timezone(value: Option<&str>) -> Result<Option<Tz>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => name
            .parse::<Tz>()
            .map(Some)
            .map_err(|e| anyhow!("Unknown time zone '{}': {}", name, e)),
    }
}

pub async fn run(config: &AppConfig, timezone: Option<&str>) -> Result<ScheduleReport> {
    let tz = parse_timezone(timezone)?;
    info!(
        "[schedule] listing uploads (zone: {})",
        tz.map(|z| z.name().to_string()).unwrap_or_else(|| "none".into())
    );
    let mut session = open_session(config).await?;
    get_schedule(&mut session, tz).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timezone_names_are_resolved() {
        assert_eq!(parse_timezone(None).unwrap(), None);
        assert_eq!(parse_timezone(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_timezone(Some("Europe/Berlin")).unwrap(),
            Some(chrono_tz::Europe::Berlin)
        );
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let err = parse_timezone(Some("Mars/Olympus")).unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));
    }
}
