//! Exponential backoff with jitter.

use std::time::Duration;
use rand::Rng;

use crate::config::RetryConfig;

/// Delay to wait after failed attempt number `attempt` (1-based).
///
/// Doubles from `base_delay_ms`, capped at `max_delay_ms`, plus up to 10%
/// jitter so several sources do not hammer a restarting balancer in step.
pub fn calculate_backoff(attempt: u32, config: &RetryConfig) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let factor = 2u64.saturating_pow(attempt - 1);
    let capped = config
        .base_delay_ms
        .saturating_mul(factor)
        .min(config.max_delay_ms);

    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retries(base: u64, max: u64) -> RetryConfig {
        RetryConfig {
            base_delay_ms: base,
            max_delay_ms: max,
        }
    }

    #[test]
    fn doubles_until_capped() {
        let config = retries(100, 1000);
        assert_eq!(calculate_backoff(0, &config), Duration::ZERO);

        let first = calculate_backoff(1, &config).as_millis();
        assert!((100..110).contains(&first));

        let third = calculate_backoff(3, &config).as_millis();
        assert!((400..440).contains(&third));

        let late = calculate_backoff(20, &config).as_millis();
        assert!((1000..1100).contains(&late));
    }
}
