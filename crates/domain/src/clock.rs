use serde::{Deserialize, Serialize};

/// 秒 + 纳秒形式的时间点
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp {
    pub secs: i64,
    pub nanos: u32,
}

impl Timestamp {
    pub fn new(secs: i64, nanos: u32) -> Self {
        Self { secs, nanos }
    }

    /// 先在整秒上加偏移，再换算成毫秒；亚秒部分四舍五入到毫秒
    pub fn offset_millis(&self, offset_secs: i64) -> i64 {
        let secs = self.secs + offset_secs;
        secs * 1000 + i64::from((self.nanos + 500_000) / 1_000_000)
    }

    pub fn as_millis(&self) -> i64 {
        self.offset_millis(0)
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_applied_before_millis_conversion() {
        let ts = Timestamp::new(1_700_000_000, 123_456_789);
        assert_eq!(ts.offset_millis(0), 1_700_000_000_123);
        assert_eq!(ts.offset_millis(30), 1_700_000_030_123);
    }

    #[test]
    fn test_sub_millisecond_rounding() {
        assert_eq!(Timestamp::new(10, 499_999).as_millis(), 10_000);
        assert_eq!(Timestamp::new(10, 500_000).as_millis(), 10_001);
        assert_eq!(Timestamp::new(10, 999_999_999).as_millis(), 11_000);
    }
}
