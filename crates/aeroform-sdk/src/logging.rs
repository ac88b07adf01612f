//! Cloud Logging level enumeration
//!
//! Mirrors the generated `LogLevel.Level` enum of the logging API, including
//! its zero value. Wire names come from the serde attributes and
//! must agree with the `(name, value)` table.

use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum LogLevel {
    #[default]
    #[serde(rename = "LEVEL_UNSPECIFIED")]
    Unspecified = 0,
    Trace = 1,
    Debug = 2,
    Info = 3,
    Warn = 4,
    Error = 5,
    Fatal = 6,
}

impl LogLevel {
    /// Every named value of the enumeration
    pub const VALUES: &'static [(&'static str, i32)] = &[
        ("LEVEL_UNSPECIFIED", 0),
        ("TRACE", 1),
        ("DEBUG", 2),
        ("INFO", 3),
        ("WARN", 4),
        ("ERROR", 5),
        ("FATAL", 6),
    ];

    pub fn as_str_name(&self) -> &'static str {
        match self {
            LogLevel::Unspecified => "LEVEL_UNSPECIFIED",
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    pub fn from_str_name(value: &str) -> Option<Self> {
        let (_, number) = Self::VALUES.iter().find(|(name, _)| *name == value)?;
        Self::from_i32(*number)
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(LogLevel::Unspecified),
            1 => Some(LogLevel::Trace),
            2 => Some(LogLevel::Debug),
            3 => Some(LogLevel::Info),
            4 => Some(LogLevel::Warn),
            5 => Some(LogLevel::Error),
            6 => Some(LogLevel::Fatal),
            _ => None,
        }
    }
}
