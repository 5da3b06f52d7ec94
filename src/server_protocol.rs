use serde_json::Value;

/// Playback commands posted by the dashboard.
#[derive(Debug, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Pause,
    Reset,
    /// Switches the session to a saved classroom, or to the demo when `None`.
    Load {
        classroom_id: Option<String>,
        seed: Option<i64>,
    },
}

impl ControlCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Reset => "reset",
            Self::Load { .. } => "load",
        }
    }
}

pub fn parse_control_command(raw: &str) -> Option<ControlCommand> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let command_type = object.get("type")?.as_str()?;

    match command_type {
        "start" => Some(ControlCommand::Start),
        "pause" => Some(ControlCommand::Pause),
        "reset" => Some(ControlCommand::Reset),
        "load" => {
            let classroom_id = match object.get("classroomId") {
                None | Some(Value::Null) => None,
                Some(value) => {
                    let id = value.as_str()?.trim();
                    if id.is_empty() {
                        None
                    } else {
                        Some(id.to_string())
                    }
                }
            };
            let seed = parse_optional_i64(object.get("seed"))?;
            Some(ControlCommand::Load { classroom_id, seed })
        }
        _ => None,
    }
}

fn parse_optional_i64(value: Option<&Value>) -> Option<Option<i64>> {
    const MAX_SAFE_INTEGER_F64: f64 = 9_007_199_254_740_991.0;

    let Some(value) = value else {
        return Some(None);
    };
    if value.is_null() {
        return Some(None);
    }
    if let Some(number) = value.as_i64() {
        return Some(Some(number));
    }
    if let Some(number) = value.as_u64() {
        return i64::try_from(number).ok().map(Some);
    }
    if let Some(number) = value.as_f64() {
        if number.is_finite() {
            let floored = number.floor();
            if floored.abs() > MAX_SAFE_INTEGER_F64 {
                return None;
            }
            return Some(Some(floored as i64));
        }
    }
    None
}
