//! Test helper utilities and common testing patterns

use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

/// Test environment setup utilities
pub struct TestEnv;

impl TestEnv {
    /// 在超时前轮询等待条件成立
    pub async fn wait_for<F, Fut>(mut condition: F, timeout: Duration) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let start = tokio::time::Instant::now();

        while start.elapsed() < timeout {
            if condition().await {
                return true;
            }
            sleep(Duration::from_millis(10)).await;
        }

        false
    }
}

/// 任务负载的断言辅助
pub struct PayloadAssertions;

impl PayloadAssertions {
    /// 按顺序取出 sequence 阶段中的活动
    pub fn activities(payload: &Value) -> Vec<Value> {
        payload["request"]["description"]["phases"][0]["activity"]["description"]["activities"]
            .as_array()
            .cloned()
            .unwrap_or_default()
    }

    /// 活动类别序列，如 `["zone", "perform_action"]`
    pub fn categories(payload: &Value) -> Vec<String> {
        Self::activities(payload)
            .iter()
            .filter_map(|a| a["category"].as_str().map(str::to_string))
            .collect()
    }

    pub fn assert_categories(payload: &Value, expected: &[&str]) {
        let actual = Self::categories(payload);
        assert_eq!(
            actual, expected,
            "Activity categories differ. Payload: {payload:#}"
        );
    }
}
