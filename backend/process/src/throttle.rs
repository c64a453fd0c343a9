use std::time::Duration;

use tokio::time::sleep;

/// Pacing between repositories: at most `requests` per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    requests: u32,
    window: Duration,
}

impl Throttle {
    pub fn per_window(requests: u32, window: Duration) -> Self {
        Self {
            requests: requests.max(1),
            window,
        }
    }

    pub fn none() -> Self {
        Self::per_window(1, Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.window / self.requests
    }

    pub async fn wait(&self) {
        let delay = self.delay();

        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::per_window(1, Duration::from_secs(3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay() {
        assert_eq!(Throttle::default().delay(), Duration::from_secs(3));
        assert_eq!(
            Throttle::per_window(4, Duration::from_secs(2)).delay(),
            Duration::from_millis(500)
        );
        assert_eq!(Throttle::none().delay(), Duration::ZERO);
    }

    #[test]
    fn test_zero_requests_clamped() {
        assert_eq!(
            Throttle::per_window(0, Duration::from_secs(1)).delay(),
            Duration::from_secs(1)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_advances_clock() {
        let start = tokio::time::Instant::now();

        Throttle::per_window(2, Duration::from_secs(10)).wait().await;

        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
