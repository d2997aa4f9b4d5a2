use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use fleet_config::{LogLevel, OutputFormat};
use fleet_domain::{ActionSlot, ArmTaskRequest, CoupleTaskRequest, DispatchError, DispatchResult};
use serde_json::{Map, Value};

/// 与具体子命令无关的运行选项
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalOptions {
    pub config: Option<String>,
    pub log_level: Option<LogLevel>,
    pub log_format: Option<OutputFormat>,
    pub embedded: bool,
    pub use_sim_time: bool,
}

/// 解析后的派发请求
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchCommand {
    Arm(ArmTaskRequest),
    Couple(CoupleTaskRequest),
}

impl DispatchCommand {
    pub fn fleet(&self) -> Option<&str> {
        match self {
            DispatchCommand::Arm(task) => Some(task.fleet.as_str()),
            DispatchCommand::Couple(task) => task.fleet.as_deref(),
        }
    }
}

pub fn build_cli() -> Command {
    Command::new("dispatch-task")
        .version(env!("CARGO_PKG_VERSION"))
        .about("前置条件校验后的车队任务派发工具")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .global(true),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式")
                .value_parser(["json", "text", "pretty"])
                .global(true),
        )
        .arg(
            Arg::new("embedded")
                .long("embedded")
                .help("在进程内启动模拟的车队后端")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("use-sim-time")
                .long("use-sim-time")
                .alias("use_sim_time")
                .help("使用仿真时间")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(arm_command())
        .subcommand(couple_command())
}

fn arm_command() -> Command {
    Command::new("arm")
        .about("校验区域和执行器后派发动作任务")
        .arg(
            Arg::new("fleet")
                .short('F')
                .long("fleet")
                .help("车队名")
                .required(true),
        )
        .arg(Arg::new("robot").short('R').long("robot").help("机器人名"))
        .arg(
            Arg::new("places")
                .short('p')
                .long("places")
                .help("区域活动的途经点")
                .num_args(1..),
        )
        .arg(
            Arg::new("action")
                .short('a')
                .long("action")
                .help("第一个动作")
                .required(true),
        )
        .arg(
            Arg::new("action-desc")
                .long("action-desc")
                .alias("action_desc")
                .help("第一个动作的 JSON 描述")
                .default_value("{}"),
        )
        .arg(
            Arg::new("object-name")
                .short('o')
                .long("object-name")
                .alias("object_name")
                .help("第一个动作的目标对象，需要区域校验"),
        )
        .arg(Arg::new("action2").long("action2").help("第二个动作"))
        .arg(
            Arg::new("action-desc2")
                .long("action-desc2")
                .alias("action_desc2")
                .help("第二个动作的 JSON 描述")
                .default_value("{}"),
        )
        .arg(
            Arg::new("object-name2")
                .long("object-name2")
                .alias("object_name2")
                .help("第二个动作的目标对象"),
        )
        .args(schedule_args())
}

fn couple_command() -> Command {
    Command::new("couple")
        .about("派发多机耦合或解耦任务")
        .arg(
            Arg::new("action")
                .short('a')
                .long("action")
                .help("couple 或 decouple")
                .required(true),
        )
        .arg(
            Arg::new("zone-name")
                .short('z')
                .long("zone-name")
                .alias("zone_name")
                .help("目标区域")
                .required(true),
        )
        .arg(Arg::new("fleet").short('F').long("fleet").help("车队名，需与机器人同时给出"))
        .arg(Arg::new("robot").short('R').long("robot").help("机器人名，需与车队同时给出"))
        .arg(
            Arg::new("candidates-fleet")
                .long("candidates-fleet")
                .alias("candidates_fleet")
                .help("参与耦合的车队"),
        )
        .arg(
            Arg::new("candidates-robot")
                .long("candidates-robot")
                .alias("candidates_robot")
                .help("参与耦合的机器人")
                .num_args(1..),
        )
        .arg(
            Arg::new("number-of-robots")
                .short('n')
                .long("number-of-robots")
                .alias("number_of_robots")
                .value_parser(clap::value_parser!(u32))
                .default_value("2"),
        )
        .arg(Arg::new("requester").long("requester").help("任务请求方"))
        .args(schedule_args())
}

fn schedule_args() -> [Arg; 2] {
    [
        Arg::new("start-time")
            .long("start-time")
            .alias("start_time")
            .help("相对当前时间的开始偏移（秒）")
            .value_parser(clap::value_parser!(i64))
            .allow_negative_numbers(true)
            .default_value("0"),
        Arg::new("priority")
            .long("priority")
            .help("任务优先级，0 表示不设置")
            .value_parser(clap::value_parser!(i64))
            .default_value("0"),
    ]
}

pub fn parse_global(matches: &ArgMatches) -> Result<GlobalOptions> {
    let log_level = matches
        .get_one::<String>("log-level")
        .map(|s| s.parse::<LogLevel>().map_err(|e| anyhow!(e)))
        .transpose()?;
    let log_format = matches
        .get_one::<String>("log-format")
        .map(|s| s.parse::<OutputFormat>().map_err(|e| anyhow!(e)))
        .transpose()?;

    Ok(GlobalOptions {
        config: matches.get_one::<String>("config").cloned(),
        log_level,
        log_format,
        embedded: matches.get_flag("embedded"),
        use_sim_time: matches.get_flag("use-sim-time"),
    })
}

pub fn parse_command(matches: &ArgMatches) -> DispatchResult<DispatchCommand> {
    match matches.subcommand() {
        Some(("arm", sub)) => parse_arm(sub).map(DispatchCommand::Arm),
        Some(("couple", sub)) => parse_couple(sub).map(DispatchCommand::Couple),
        Some((other, _)) => Err(DispatchError::malformed(format!("未知子命令: {other}"))),
        None => Err(DispatchError::malformed("缺少子命令")),
    }
}

fn parse_arm(matches: &ArgMatches) -> DispatchResult<ArmTaskRequest> {
    let first = ActionSlot {
        action: required(matches, "action")?,
        object_name: optional(matches, "object-name"),
        description: description(matches, "action-desc")?,
    };

    let second = match optional(matches, "action2") {
        Some(action) => Some(ActionSlot {
            action,
            object_name: optional(matches, "object-name2"),
            description: description(matches, "action-desc2")?,
        }),
        None if optional(matches, "object-name2").is_some() => {
            return Err(DispatchError::malformed(
                "object-name2 given without action2",
            ))
        }
        None => None,
    };

    Ok(ArmTaskRequest {
        fleet: required(matches, "fleet")?,
        robot: optional(matches, "robot"),
        places: many(matches, "places"),
        first: Some(first),
        second,
        start_offset_secs: number(matches, "start-time"),
        priority: number(matches, "priority"),
    })
}

fn parse_couple(matches: &ArgMatches) -> DispatchResult<CoupleTaskRequest> {
    Ok(CoupleTaskRequest {
        action: required(matches, "action")?,
        zone_name: required(matches, "zone-name")?,
        fleet: optional(matches, "fleet"),
        robot: optional(matches, "robot"),
        candidates_fleet: optional(matches, "candidates-fleet"),
        candidates_robots: many(matches, "candidates-robot"),
        number_of_robots: matches
            .get_one::<u32>("number-of-robots")
            .copied()
            .unwrap_or(2),
        start_offset_secs: number(matches, "start-time"),
        priority: number(matches, "priority"),
        requester: optional(matches, "requester"),
    })
}

fn required(matches: &ArgMatches, id: &str) -> DispatchResult<String> {
    optional(matches, id).ok_or_else(|| DispatchError::malformed(format!("{id} is required")))
}

/// 空字符串视为未给出
fn optional(matches: &ArgMatches, id: &str) -> Option<String> {
    matches
        .get_one::<String>(id)
        .filter(|value| !value.trim().is_empty())
        .cloned()
}

fn many(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn number(matches: &ArgMatches, id: &str) -> i64 {
    matches.get_one::<i64>(id).copied().unwrap_or(0)
}

fn description(matches: &ArgMatches, id: &str) -> DispatchResult<Map<String, Value>> {
    let raw = matches.get_one::<String>(id).map(String::as_str).unwrap_or("{}");
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DispatchError::malformed(format!("{id} must be a JSON object"))),
        Err(e) => Err(DispatchError::malformed(format!("{id} is not valid JSON: {e}"))),
    }
}
