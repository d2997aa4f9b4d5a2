use fleet_config::{DispatchSettings, TransportConfig};
use fleet_domain::{ArmTaskRequest, DispatchError, DispatchResult, SlotKind, VerificationRequest};

/// 一个待发出的校验请求及其目标服务
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedVerification {
    pub service: String,
    pub request: VerificationRequest,
}

/// 一次派发需要的全部前置校验
///
/// 在发出任何请求之前完成配置校验，配置有误时一个请求都不会发出。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationPlan {
    pub verifications: Vec<PlannedVerification>,
}

impl VerificationPlan {
    pub fn for_arm_task(
        task: &ArmTaskRequest,
        settings: &DispatchSettings,
        transport: &TransportConfig,
    ) -> DispatchResult<Self> {
        Self::validate(task)?;

        let Some(first) = task.first.as_ref() else {
            return Err(DispatchError::malformed("no action configured"));
        };

        if settings.is_unconditioned(&first.action) {
            return Ok(Self::default());
        }

        let mut verifications = Vec::new();

        // 先区域校验，再执行器校验；完成顺序不受此影响
        for (slot, action) in task.configured_slots() {
            if let Some(object_name) = action.object_name.as_deref().filter(|_| action.requires_zone()) {
                verifications.push(PlannedVerification {
                    service: transport.zone_service.clone(),
                    request: VerificationRequest::zone(slot, object_name),
                });
            }
        }

        let effector_service = transport.effector_service(&task.fleet);
        let robot = task.robot.clone().unwrap_or_default();
        for (slot, action) in task.configured_slots() {
            verifications.push(PlannedVerification {
                service: effector_service.clone(),
                request: VerificationRequest::effector(slot, &action.action, robot.clone()),
            });
        }

        Ok(Self { verifications })
    }

    fn validate(task: &ArmTaskRequest) -> DispatchResult<()> {
        match (&task.first, &task.second) {
            (None, Some(_)) => {
                return Err(DispatchError::malformed(
                    "second action configured without a first action",
                ))
            }
            (None, None) => return Err(DispatchError::malformed("no action configured")),
            _ => {}
        }

        for (slot, action) in task.configured_slots() {
            if action.action.trim().is_empty() {
                return Err(DispatchError::malformed(format!(
                    "{} name cannot be empty",
                    slot.action_label()
                )));
            }
        }

        if task.fleet.trim().is_empty() {
            return Err(DispatchError::malformed("fleet name cannot be empty"));
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.verifications.is_empty()
    }

    pub fn count(&self, kind: SlotKind) -> u32 {
        self.verifications
            .iter()
            .filter(|v| v.request.token.kind == kind)
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_domain::{ActionSlot, SlotIndex, SlotToken};

    fn task(first: Option<ActionSlot>, second: Option<ActionSlot>) -> ArmTaskRequest {
        ArmTaskRequest {
            fleet: "mm".to_string(),
            robot: Some("mm_1".to_string()),
            places: vec!["wp1".to_string()],
            first,
            second,
            ..ArmTaskRequest::default()
        }
    }

    fn plan(task: &ArmTaskRequest) -> DispatchResult<VerificationPlan> {
        VerificationPlan::for_arm_task(task, &DispatchSettings::default(), &TransportConfig::default())
    }

    #[test]
    fn test_single_action_without_object() {
        let plan = plan(&task(Some(ActionSlot::new("scan")), None)).unwrap();
        assert_eq!(plan.count(SlotKind::Zone), 0);
        assert_eq!(plan.count(SlotKind::Effector), 1);

        let effector = &plan.verifications[0];
        assert_eq!(effector.service, "mm_effector_query");
        assert_eq!(effector.request.target, "scan");
        assert_eq!(effector.request.requester, "mm_1");
    }

    #[test]
    fn test_two_actions_with_objects() {
        let plan = plan(&task(
            Some(ActionSlot::new("pick").with_object("bin7")),
            Some(ActionSlot::new("place").with_object("shelf2")),
        ))
        .unwrap();

        assert_eq!(plan.count(SlotKind::Zone), 2);
        assert_eq!(plan.count(SlotKind::Effector), 2);

        let tokens: Vec<SlotToken> = plan.verifications.iter().map(|v| v.request.token).collect();
        assert_eq!(
            tokens,
            vec![
                SlotToken::zone(SlotIndex::First),
                SlotToken::zone(SlotIndex::Second),
                SlotToken::effector(SlotIndex::First),
                SlotToken::effector(SlotIndex::Second),
            ]
        );
        assert_eq!(plan.verifications[1].service, "mm_zone_query");
        assert_eq!(plan.verifications[1].request.target, "shelf2");
    }

    #[test]
    fn test_second_object_only() {
        let plan = plan(&task(
            Some(ActionSlot::new("pick")),
            Some(ActionSlot::new("place").with_object("shelf2")),
        ))
        .unwrap();
        assert_eq!(plan.count(SlotKind::Zone), 1);
        assert_eq!(plan.verifications[0].request.token, SlotToken::zone(SlotIndex::Second));
    }

    #[test]
    fn test_unconditioned_action_needs_no_verification() {
        let plan = plan(&task(
            Some(ActionSlot::new("arm_action").with_object("bin7")),
            None,
        ))
        .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_second_without_first_is_malformed() {
        let err = plan(&task(None, Some(ActionSlot::new("place")))).unwrap_err();
        assert!(matches!(err, DispatchError::MalformedConfiguration(_)));
    }

    #[test]
    fn test_empty_action_or_fleet_is_malformed() {
        assert!(plan(&task(None, None)).is_err());
        assert!(plan(&task(Some(ActionSlot::new(" ")), None)).is_err());

        let mut no_fleet = task(Some(ActionSlot::new("scan")), None);
        no_fleet.fleet = String::new();
        assert!(matches!(
            plan(&no_fleet),
            Err(DispatchError::MalformedConfiguration(_))
        ));
    }
}
