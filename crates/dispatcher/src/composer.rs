//! 任务描述组装
//!
//! 纯函数：相同的输入（动作配置、已确认区域、时间参数、当前时间）
//! 总是得到结构相同的输出。

use fleet_config::DispatchSettings;
use fleet_domain::{
    Activity, ActionSlot, ArmTaskRequest, Candidates, ComposeDescription, CoupleDescription,
    CoupleKind, CoupleTaskRequest, DecoupleDescription, DispatchError, DispatchResult,
    PerformAction, Priority, SlotIndex, TaskDescription, TaskPayload, Timestamp, ZoneActivity,
    COMPOSE_CATEGORY,
};
use serde_json::Value;
use tracing::debug;

use crate::aggregator::ResultAggregator;

pub const COUPLE_DESCRIPTION_CATEGORY: &str = "testing_couple_decouple_action";

pub struct PayloadComposer<'a> {
    settings: &'a DispatchSettings,
}

impl<'a> PayloadComposer<'a> {
    pub fn new(settings: &'a DispatchSettings) -> Self {
        Self { settings }
    }

    /// 组装带前置校验的动作任务
    ///
    /// 每个槽位依次产出 `[zone?, perform_action]`，第二个槽位的活动
    /// 追加在第一个之后，拼成一个扁平的 sequence。
    pub fn compose_arm_task(
        &self,
        task: &ArmTaskRequest,
        zones: &ResultAggregator,
        now: Timestamp,
    ) -> DispatchResult<TaskPayload> {
        let first = task
            .first
            .as_ref()
            .ok_or_else(|| DispatchError::malformed("no action configured"))?;

        // 免校验动作没有已确认的区域，带目标物体的槽位不产出任何活动
        let verified = !self.settings.is_unconditioned(&first.action);

        let mut activities = Vec::new();
        for (slot, action) in task.configured_slots() {
            let zones = verified.then_some(zones);
            self.push_action_activities(&mut activities, slot, action, zones, &task.places)?;
        }

        let request = TaskDescription {
            category: COMPOSE_CATEGORY.to_string(),
            description: ComposeDescription::single_sequence(&first.action, activities),
            unix_millis_request_time: None,
            unix_millis_earliest_start_time: now.offset_millis(task.start_offset_secs),
            requester: None,
            fleet_name: None,
            priority: priority(task.priority),
        };

        Ok(TaskPayload::targeted(
            Some(task.fleet.as_str()),
            task.robot.as_deref(),
            request,
        ))
    }

    fn push_action_activities(
        &self,
        activities: &mut Vec<Activity>,
        slot: SlotIndex,
        action: &ActionSlot,
        zones: Option<&ResultAggregator>,
        places: &[String],
    ) -> DispatchResult<()> {
        let mut description = action.description.clone();

        if action.requires_zone() {
            let Some(zones) = zones else {
                debug!(%slot, action = %action.action, "槽位未校验区域，跳过");
                return Ok(());
            };
            let zone = zones.zone(slot).ok_or_else(|| {
                DispatchError::Internal(format!(
                    "{} requires a confirmed zone but none was recorded",
                    slot.action_label()
                ))
            })?;
            description.insert("zone_name".to_string(), Value::String(zone.to_string()));
            activities.push(Activity::Zone(ZoneActivity {
                zone: zone.to_string(),
                places: places.to_vec(),
            }));
        }

        activities.push(Activity::PerformAction(PerformAction {
            unix_millis_action_duration_estimate: self.settings.action_duration_estimate_ms,
            category: action.action.clone(),
            description: Value::Object(description),
        }));

        Ok(())
    }

    /// 组装多机耦合/解耦任务
    pub fn compose_couple_task(
        &self,
        task: &CoupleTaskRequest,
        now: Timestamp,
    ) -> DispatchResult<TaskPayload> {
        let kind: CoupleKind = task.action.parse().map_err(DispatchError::malformed)?;
        let estimated_duration = self.settings.couple_estimated_duration_secs;

        let activity = match kind {
            CoupleKind::Couple => Activity::CoupleAction(CoupleDescription {
                action: kind.to_string(),
                number_of_robots: task.number_of_robots.max(self.settings.min_coupled_robots),
                candidates: candidates(task),
                expected_zone: task.zone_name.clone(),
                estimated_duration,
            }),
            CoupleKind::Decouple => {
                Activity::DecoupleAction(DecoupleDescription { estimated_duration })
            }
        };

        let start_time = now.offset_millis(task.start_offset_secs);
        let request = TaskDescription {
            category: COMPOSE_CATEGORY.to_string(),
            description: ComposeDescription::single_sequence(
                COUPLE_DESCRIPTION_CATEGORY,
                vec![activity],
            ),
            unix_millis_request_time: Some(start_time),
            unix_millis_earliest_start_time: start_time,
            requester: Some(
                task.requester
                    .clone()
                    .unwrap_or_else(|| self.settings.requester.clone()),
            ),
            fleet_name: task.fleet.clone().filter(|fleet| !fleet.is_empty()),
            priority: priority(task.priority),
        };

        Ok(TaskPayload::targeted(
            task.fleet.as_deref(),
            task.robot.as_deref(),
            request,
        ))
    }
}

fn priority(value: i64) -> Option<Priority> {
    (value != 0).then(|| Priority::binary(value))
}

fn candidates(task: &CoupleTaskRequest) -> Option<Candidates> {
    if task.candidates_robots.is_empty() {
        return None;
    }
    Some(Candidates {
        fleet: task.candidates_fleet.clone().unwrap_or_default(),
        robots: task.candidates_robots.clone(),
    })
}
