use crate::*;

#[test]
fn test_dispatch_error_display() {
    let unavailable = DispatchError::unavailable("mm_zone_query", "等待5000ms后仍未发现服务");
    assert_eq!(
        unavailable.to_string(),
        "服务不可用: mm_zone_query - 等待5000ms后仍未发现服务"
    );

    let rejected = DispatchError::rejected("bin7", "object not in any zone");
    assert_eq!(
        rejected.to_string(),
        "前置条件校验未通过: bin7 - object not in any zone"
    );

    let timeout = DispatchError::ResponseTimeout {
        request_id: "dispatch_arm_task_1".to_string(),
        waited_ms: 5000,
    };
    assert_eq!(
        timeout.to_string(),
        "等待任务响应超时: dispatch_arm_task_1 (5000ms)"
    );

    let malformed = DispatchError::malformed("Action should be 'couple' or 'decouple'");
    assert_eq!(
        malformed.to_string(),
        "无效的派发配置: Action should be 'couple' or 'decouple'"
    );
}

#[test]
fn test_prerequisite_failures_collapse() {
    assert!(DispatchError::unavailable("fleet_effector_query", "down").is_prerequisite_failure());
    assert!(DispatchError::rejected("scan", "not ready").is_prerequisite_failure());

    let timeout = DispatchError::ResponseTimeout {
        request_id: "x".to_string(),
        waited_ms: 1,
    };
    assert!(!timeout.is_prerequisite_failure());
    assert!(!DispatchError::malformed("bad").is_prerequisite_failure());
}

#[test]
fn test_user_messages_are_distinct_per_kind() {
    let messages = [
        DispatchError::unavailable("a", "b").user_message().to_string(),
        DispatchError::rejected("a", "b").user_message().to_string(),
        DispatchError::ResponseTimeout {
            request_id: "a".to_string(),
            waited_ms: 1,
        }
        .user_message()
        .to_string(),
        DispatchError::malformed("a").user_message().to_string(),
        DispatchError::Serialization("a".to_string()).user_message().to_string(),
        DispatchError::Internal("a".to_string()).user_message().to_string(),
    ];
    for (i, a) in messages.iter().enumerate() {
        for b in messages.iter().skip(i + 1) {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_serde_error_conversion() {
    let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err: DispatchError = parse_err.into();
    assert!(matches!(err, DispatchError::Serialization(_)));
}
