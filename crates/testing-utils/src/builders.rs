//! 测试用任务请求构建器

use fleet_domain::{ActionSlot, ArmTaskRequest, CoupleTaskRequest};
use serde_json::{Map, Value};

/// Builder for creating test ArmTaskRequest values
pub struct ArmTaskBuilder {
    task: ArmTaskRequest,
}

impl ArmTaskBuilder {
    pub fn new(fleet: &str) -> Self {
        Self {
            task: ArmTaskRequest {
                fleet: fleet.to_string(),
                ..ArmTaskRequest::default()
            },
        }
    }

    pub fn with_robot(mut self, robot: &str) -> Self {
        self.task.robot = Some(robot.to_string());
        self
    }

    pub fn with_places(mut self, places: &[&str]) -> Self {
        self.task.places = places.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_action(mut self, action: &str) -> Self {
        self.task.first = Some(ActionSlot::new(action));
        self
    }

    pub fn with_action_on(mut self, action: &str, object_name: &str) -> Self {
        self.task.first = Some(ActionSlot::new(action).with_object(object_name));
        self
    }

    pub fn with_second_action(mut self, action: &str) -> Self {
        self.task.second = Some(ActionSlot::new(action));
        self
    }

    pub fn with_second_action_on(mut self, action: &str, object_name: &str) -> Self {
        self.task.second = Some(ActionSlot::new(action).with_object(object_name));
        self
    }

    /// 合并到第一个动作的描述；必须先设置动作
    pub fn with_description(mut self, description: Value) -> Self {
        if let (Some(first), Value::Object(map)) = (self.task.first.take(), description) {
            self.task.first = Some(first.with_description(map));
        }
        self
    }

    pub fn with_second_description(mut self, description: Map<String, Value>) -> Self {
        self.task.second = self.task.second.take().map(|s| s.with_description(description));
        self
    }

    pub fn with_start_offset(mut self, secs: i64) -> Self {
        self.task.start_offset_secs = secs;
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.task.priority = priority;
        self
    }

    pub fn build(self) -> ArmTaskRequest {
        self.task
    }
}

/// Builder for creating test CoupleTaskRequest values
pub struct CoupleTaskBuilder {
    task: CoupleTaskRequest,
}

impl CoupleTaskBuilder {
    pub fn new(action: &str, zone_name: &str) -> Self {
        Self {
            task: CoupleTaskRequest {
                action: action.to_string(),
                zone_name: zone_name.to_string(),
                number_of_robots: 2,
                ..CoupleTaskRequest::default()
            },
        }
    }

    pub fn with_fleet(mut self, fleet: &str) -> Self {
        self.task.fleet = Some(fleet.to_string());
        self
    }

    pub fn with_robot(mut self, robot: &str) -> Self {
        self.task.robot = Some(robot.to_string());
        self
    }

    pub fn with_candidates(mut self, fleet: &str, robots: &[&str]) -> Self {
        self.task.candidates_fleet = Some(fleet.to_string());
        self.task.candidates_robots = robots.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn with_number_of_robots(mut self, n: u32) -> Self {
        self.task.number_of_robots = n;
        self
    }

    pub fn with_start_offset(mut self, secs: i64) -> Self {
        self.task.start_offset_secs = secs;
        self
    }

    pub fn build(self) -> CoupleTaskRequest {
        self.task
    }
}
