//! 命令语法。
//!
//! 命令是写入 `{node}/{module}/command` 的单个字符串：
//!
//! | 命令 | 模块 |
//! |---|---|
//! | `open_barricade` / `close_barricade` | controller |
//! | `set_hover_cms:<int>` / `set_car_cms:<int>` | controller |
//! | `clear` | alpr |
//! | `set_idle` | state |
//! | `set_process:<license_number>` | entrance state |
//! | `set_get:<tid>,<license_number>` | exit state |

use domain::Module;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 道闸动作。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarricadeAction {
    Open,
    Close,
}

impl FromStr for BarricadeAction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(BarricadeAction::Open),
            "close" => Ok(BarricadeAction::Close),
            other => Err(format!("unknown barricade action: {other}")),
        }
    }
}

/// Kiosk 命令。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KioskCommand {
    Barricade(BarricadeAction),
    SetHoverCms(u32),
    SetCarCms(u32),
    Clear,
    SetIdle,
    SetProcess { license_number: String },
    SetGet { tid: String, license_number: String },
}

impl KioskCommand {
    /// 命令写入的目标模块。
    pub fn module(&self) -> Module {
        match self {
            KioskCommand::Barricade(_) | KioskCommand::SetHoverCms(_) | KioskCommand::SetCarCms(_) => {
                Module::Controller
            }
            KioskCommand::Clear => Module::Alpr,
            KioskCommand::SetIdle | KioskCommand::SetProcess { .. } | KioskCommand::SetGet { .. } => {
                Module::State
            }
        }
    }

    /// 命令名（不含参数），用于日志。
    pub fn name(&self) -> &'static str {
        match self {
            KioskCommand::Barricade(BarricadeAction::Open) => "open_barricade",
            KioskCommand::Barricade(BarricadeAction::Close) => "close_barricade",
            KioskCommand::SetHoverCms(_) => "set_hover_cms",
            KioskCommand::SetCarCms(_) => "set_car_cms",
            KioskCommand::Clear => "clear",
            KioskCommand::SetIdle => "set_idle",
            KioskCommand::SetProcess { .. } => "set_process",
            KioskCommand::SetGet { .. } => "set_get",
        }
    }
}

impl fmt::Display for KioskCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KioskCommand::SetHoverCms(value) | KioskCommand::SetCarCms(value) => {
                write!(f, "{}:{}", self.name(), value)
            }
            KioskCommand::SetProcess { license_number } => {
                write!(f, "set_process:{license_number}")
            }
            KioskCommand::SetGet {
                tid,
                license_number,
            } => write!(f, "set_get:{tid},{license_number}"),
            _ => f.write_str(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_exact_strings() {
        let cases = [
            (KioskCommand::Barricade(BarricadeAction::Open), "open_barricade"),
            (KioskCommand::Barricade(BarricadeAction::Close), "close_barricade"),
            (KioskCommand::SetHoverCms(30), "set_hover_cms:30"),
            (KioskCommand::SetCarCms(120), "set_car_cms:120"),
            (KioskCommand::Clear, "clear"),
            (KioskCommand::SetIdle, "set_idle"),
            (
                KioskCommand::SetProcess {
                    license_number: "ABC123".to_string(),
                },
                "set_process:ABC123",
            ),
            (
                KioskCommand::SetGet {
                    tid: "T1".to_string(),
                    license_number: "ABC123".to_string(),
                },
                "set_get:T1,ABC123",
            ),
        ];
        for (command, expected) in cases {
            assert_eq!(command.to_string(), expected);
        }
    }

    #[test]
    fn routes_to_modules() {
        assert_eq!(KioskCommand::Clear.module(), Module::Alpr);
        assert_eq!(KioskCommand::SetCarCms(1).module(), Module::Controller);
        assert_eq!(KioskCommand::SetIdle.module(), Module::State);
    }

    #[test]
    fn parses_barricade_action() {
        assert_eq!("OPEN".parse::<BarricadeAction>(), Ok(BarricadeAction::Open));
        assert!("half".parse::<BarricadeAction>().is_err());
    }
}
