use super::driver::{DriverError, DriverResult, StudioDriver};
use crate::config::Pacing;
use std::time::{Duration, Instant};

/// Poll until at least one element matches `xpath` or `element_timeout`
/// elapses. A zero timeout makes exactly one attempt.
pub async fn wait_for<D>(driver: &mut D, xpath: &str, pacing: &Pacing) -> DriverResult<()>
where
    D: StudioDriver + ?Sized,
{
    wait_for_within(driver, xpath, pacing.element_timeout, pacing.poll_interval).await
}

pub async fn wait_for_within<D>(
    driver: &mut D,
    xpath: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> DriverResult<()>
where
    D: StudioDriver + ?Sized,
{
    let start = Instant::now();
    loop {
        if driver.count(xpath).await? > 0 {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            if timeout.is_zero() {
                return Err(DriverError::ElementNotFound(xpath.to_string()));
            }
            return Err(DriverError::Timeout {
                what: xpath.to_string(),
                after: timeout,
            });
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// Whether an element shows up within the element timeout.
pub async fn is_present<D>(driver: &mut D, xpath: &str, pacing: &Pacing) -> DriverResult<bool>
where
    D: StudioDriver + ?Sized,
{
    match wait_for(driver, xpath, pacing).await {
        Ok(()) => Ok(true),
        Err(DriverError::ElementNotFound(_)) | Err(DriverError::Timeout { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeStudio;

    #[tokio::test]
    async fn present_element_is_found_immediately() {
        let mut studio = FakeStudio::new().with_element("//button", "");
        wait_for(&mut studio, "//button", &Pacing::immediate())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_element_with_zero_timeout_is_not_found() {
        let mut studio = FakeStudio::new();
        let err = wait_for(&mut studio, "//button", &Pacing::immediate())
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::ElementNotFound(_)));
    }

    #[tokio::test]
    async fn missing_element_times_out() {
        let mut studio = FakeStudio::new();
        let err = wait_for_within(
            &mut studio,
            "//button",
            Duration::from_millis(20),
            Duration::from_millis(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DriverError::Timeout { .. }));
        assert!(!is_present(&mut studio, "//button", &Pacing::immediate()).await.unwrap());
    }
}
