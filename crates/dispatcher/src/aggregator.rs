use fleet_domain::SlotIndex;

/// 单个槽位的区域属性
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ZoneAttribute {
    #[default]
    NotRequired,
    Confirmed(String),
}

impl ZoneAttribute {
    pub fn zone(&self) -> Option<&str> {
        match self {
            ZoneAttribute::NotRequired => None,
            ZoneAttribute::Confirmed(zone) => Some(zone),
        }
    }
}

/// 一次派发尝试内各槽位已确认的区域
///
/// 只由门控在校验成功时写入，门控发出就绪信号之前不会被读取。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultAggregator {
    zones: [ZoneAttribute; 2],
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_zone(&mut self, slot: SlotIndex, zone: impl Into<String>) {
        self.zones[slot.position()] = ZoneAttribute::Confirmed(zone.into());
    }

    pub fn attribute(&self, slot: SlotIndex) -> &ZoneAttribute {
        &self.zones[slot.position()]
    }

    pub fn zone(&self, slot: SlotIndex) -> Option<&str> {
        self.attribute(slot).zone()
    }

    /// 取消后丢弃已收集的结果
    pub fn discard(&mut self) {
        self.zones = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_not_required() {
        let aggregator = ResultAggregator::new();
        assert_eq!(aggregator.attribute(SlotIndex::First), &ZoneAttribute::NotRequired);
        assert_eq!(aggregator.zone(SlotIndex::Second), None);
    }

    #[test]
    fn test_record_and_discard() {
        let mut aggregator = ResultAggregator::new();
        aggregator.record_zone(SlotIndex::Second, "Z9");
        assert_eq!(aggregator.zone(SlotIndex::Second), Some("Z9"));
        assert_eq!(aggregator.zone(SlotIndex::First), None);

        aggregator.discard();
        assert_eq!(aggregator, ResultAggregator::new());
    }
}
