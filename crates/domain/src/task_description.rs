//! 派发到车队后端的任务描述结构
//!
//! 序列化后的形状与车队任务 API 的 `compose` 请求一致：
//! 一个 `sequence` 阶段，内部是扁平的活动列表。

use serde::{Deserialize, Serialize};

pub const COMPOSE_CATEGORY: &str = "compose";
pub const SEQUENCE_CATEGORY: &str = "sequence";

/// 发布到任务通道的完整负载
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskPayload {
    RobotTaskRequest {
        robot: String,
        fleet: String,
        request: TaskDescription,
    },
    DispatchTaskRequest {
        request: TaskDescription,
    },
}

impl TaskPayload {
    /// 同时指定车队和机器人时定向派发，否则交给调度器分配
    pub fn targeted(fleet: Option<&str>, robot: Option<&str>, request: TaskDescription) -> Self {
        match (fleet, robot) {
            (Some(fleet), Some(robot)) if !fleet.is_empty() && !robot.is_empty() => {
                TaskPayload::RobotTaskRequest {
                    robot: robot.to_string(),
                    fleet: fleet.to_string(),
                    request,
                }
            }
            _ => TaskPayload::DispatchTaskRequest { request },
        }
    }

    pub fn request(&self) -> &TaskDescription {
        match self {
            TaskPayload::RobotTaskRequest { request, .. } => request,
            TaskPayload::DispatchTaskRequest { request } => request,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            TaskPayload::RobotTaskRequest { .. } => "robot_task_request",
            TaskPayload::DispatchTaskRequest { .. } => "dispatch_task_request",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskDescription {
    pub category: String,
    pub description: ComposeDescription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unix_millis_request_time: Option<i64>,
    pub unix_millis_earliest_start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fleet_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl TaskDescription {
    /// 按阶段顺序展开的全部活动
    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.description
            .phases
            .iter()
            .flat_map(|phase| phase.activity.description.activities.iter())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComposeDescription {
    pub category: String,
    pub phases: Vec<Phase>,
}

impl ComposeDescription {
    pub fn single_sequence(category: impl Into<String>, activities: Vec<Activity>) -> Self {
        Self {
            category: category.into(),
            phases: vec![Phase {
                activity: SequenceActivity::new(activities),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Phase {
    pub activity: SequenceActivity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequenceActivity {
    pub category: String,
    pub description: SequenceDescription,
}

impl SequenceActivity {
    pub fn new(activities: Vec<Activity>) -> Self {
        Self {
            category: SEQUENCE_CATEGORY.to_string(),
            description: SequenceDescription { activities },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequenceDescription {
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "category", content = "description", rename_all = "snake_case")]
pub enum Activity {
    Zone(ZoneActivity),
    PerformAction(PerformAction),
    CoupleAction(CoupleDescription),
    DecoupleAction(DecoupleDescription),
}

impl Activity {
    pub fn category(&self) -> &'static str {
        match self {
            Activity::Zone(_) => "zone",
            Activity::PerformAction(_) => "perform_action",
            Activity::CoupleAction(_) => "couple_action",
            Activity::DecoupleAction(_) => "decouple_action",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneActivity {
    pub zone: String,
    pub places: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformAction {
    pub unix_millis_action_duration_estimate: u64,
    /// 动作名
    pub category: String,
    pub description: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoupleDescription {
    pub action: String,
    pub number_of_robots: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Candidates>,
    pub expected_zone: String,
    pub estimated_duration: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidates {
    pub fleet: String,
    pub robots: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecoupleDescription {
    pub estimated_duration: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Priority {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: i64,
}

impl Priority {
    pub fn binary(value: i64) -> Self {
        Self {
            kind: "binary".to_string(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> TaskDescription {
        TaskDescription {
            category: COMPOSE_CATEGORY.to_string(),
            description: ComposeDescription::single_sequence(
                "scan",
                vec![
                    Activity::Zone(ZoneActivity {
                        zone: "Z3".to_string(),
                        places: vec!["wp1".to_string()],
                    }),
                    Activity::PerformAction(PerformAction {
                        unix_millis_action_duration_estimate: 60000,
                        category: "scan".to_string(),
                        description: json!({"zone_name": "Z3"}),
                    }),
                ],
            ),
            unix_millis_request_time: None,
            unix_millis_earliest_start_time: 1_000,
            requester: None,
            fleet_name: None,
            priority: None,
        }
    }

    #[test]
    fn test_activity_wire_shape() {
        let value = serde_json::to_value(&sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "category": "compose",
                "description": {
                    "category": "scan",
                    "phases": [{
                        "activity": {
                            "category": "sequence",
                            "description": {"activities": [
                                {"category": "zone", "description": {"zone": "Z3", "places": ["wp1"]}},
                                {"category": "perform_action", "description": {
                                    "unix_millis_action_duration_estimate": 60000,
                                    "category": "scan",
                                    "description": {"zone_name": "Z3"}
                                }}
                            ]}
                        }
                    }]
                },
                "unix_millis_earliest_start_time": 1000
            })
        );
    }

    #[test]
    fn test_payload_type_tag() {
        let robot = TaskPayload::targeted(Some("mm"), Some("mm_1"), sample());
        let value = serde_json::to_value(&robot).unwrap();
        assert_eq!(value["type"], "robot_task_request");
        assert_eq!(value["fleet"], "mm");
        assert_eq!(value["robot"], "mm_1");

        let fleet_only = TaskPayload::targeted(Some("mm"), None, sample());
        assert_eq!(fleet_only.type_name(), "dispatch_task_request");
        let value = serde_json::to_value(&fleet_only).unwrap();
        assert!(value.get("fleet").is_none());

        let empty_robot = TaskPayload::targeted(Some("mm"), Some(""), sample());
        assert_eq!(empty_robot.type_name(), "dispatch_task_request");
    }

    #[test]
    fn test_couple_candidates_omitted_when_absent() {
        let activity = Activity::CoupleAction(CoupleDescription {
            action: "couple".to_string(),
            number_of_robots: 2,
            candidates: None,
            expected_zone: "dock".to_string(),
            estimated_duration: 60,
        });
        let value = serde_json::to_value(&activity).unwrap();
        assert_eq!(value["category"], "couple_action");
        assert!(value["description"].get("candidates").is_none());
        assert_eq!(activity.category(), "couple_action");
    }
}
