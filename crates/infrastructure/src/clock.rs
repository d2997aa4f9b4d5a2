use chrono::Utc;
use fleet_domain::{Clock, Timestamp};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;

/// 系统墙钟时间
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let now = Utc::now();
        Timestamp::new(now.timestamp(), now.timestamp_subsec_nanos())
    }
}

/// 仿真时间
///
/// 从零开始，只在被推进时前进；`drive` 按真实流逝的时间持续推进。
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Arc<RwLock<Timestamp>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Timestamp) {
        let mut current = self.now.write().unwrap_or_else(|e| e.into_inner());
        *current = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut current = self.now.write().unwrap_or_else(|e| e.into_inner());
        let nanos = u64::from(current.nanos) + u64::from(by.subsec_nanos());
        current.secs += by.as_secs() as i64 + (nanos / 1_000_000_000) as i64;
        current.nanos = (nanos % 1_000_000_000) as u32;
    }

    /// 启动后台任务，每个 tick 推进一次
    pub fn drive(&self, tick: Duration) -> JoinHandle<()> {
        let clock = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            let mut last = tokio::time::Instant::now();
            loop {
                interval.tick().await;
                let now = tokio::time::Instant::now();
                clock.advance(now - last);
                last = now;
            }
        })
    }
}

impl Clock for SimClock {
    fn now(&self) -> Timestamp {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_wall_time() {
        let before = Utc::now().timestamp();
        let now = SystemClock.now();
        assert!(now.secs >= before);
        assert!(now.nanos < 1_000_000_000);
    }

    #[test]
    fn test_sim_clock_starts_at_zero() {
        let clock = SimClock::new();
        assert_eq!(clock.now(), Timestamp::new(0, 0));

        clock.advance(Duration::from_millis(1500));
        assert_eq!(clock.now(), Timestamp::new(1, 500_000_000));
        assert_eq!(clock.now().offset_millis(10), 11_500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sim_clock_driven_by_elapsed_time() {
        let clock = SimClock::new();
        let handle = clock.drive(Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(1050)).await;
        handle.abort();

        assert_eq!(clock.now().secs, 1);
    }
}
