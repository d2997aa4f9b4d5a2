#[cfg(test)]
pub mod mocks {
    // 复用 testing-utils 中的共享 mock
    pub use fleet_testing_utils::{
        ArmTaskBuilder, ManualClock, MockVerificationClient, RecordingTaskChannel, ReplyMode,
    };

    use std::sync::Arc;

    use fleet_config::{DispatchSettings, TransportConfig};

    use crate::coordinator::DispatchCoordinator;

    pub fn coordinator(
        verifier: Arc<MockVerificationClient>,
        channel: Arc<RecordingTaskChannel>,
        transport: TransportConfig,
    ) -> DispatchCoordinator {
        DispatchCoordinator::new(
            verifier,
            channel,
            Arc::new(ManualClock::new(1_700_000_000, 0)),
            transport,
            DispatchSettings::default(),
        )
    }
}
