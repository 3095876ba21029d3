//! Time source for exp/nbf/iat checks. Sampled on every validation call.

/// Current time as whole Unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock (UTC).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

impl<F> Clock for F
where
    F: Fn() -> i64 + Send + Sync,
{
    fn now(&self) -> i64 {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_tracks_wall_time() {
        let before = chrono::Utc::now().timestamp();
        let now = SystemClock.now();
        assert!(now >= before && now - before <= 1);
    }

    #[test]
    fn closures_are_clocks() {
        let fixed = || 1_700_000_000_i64;
        assert_eq!(fixed.now(), 1_700_000_000);
    }
}
