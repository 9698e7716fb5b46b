//! Notification topics and their payloads.
//!
//! | Channel                   | Payload               | Sender                  |
//! |---------------------------|-----------------------|-------------------------|
//! | `new_timetable_run`       | run id, decimal text  | insert trigger, per row |
//! | `manual-ptm-misc-trigger` | the literal `LATEST`  | operator action         |
//!
//! Delivery is at-most-once and only for sessions listening at commit time.

use std::fmt;
use std::str::FromStr;

use crate::notify::NotifyError;

/// A named notification topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Published by the `timetable_runs` insert trigger
    NewTimetableRun,
    /// Published by hand to re-process the latest run
    ManualTrigger,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::NewTimetableRun, Channel::ManualTrigger];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::NewTimetableRun => "new_timetable_run",
            Channel::ManualTrigger => "manual-ptm-misc-trigger",
        }
    }

    /// `LISTEN` statement for this channel.
    ///
    /// The name is quoted: `manual-ptm-misc-trigger` is not a bare identifier.
    pub fn listen_sql(&self) -> String {
        format!("LISTEN \"{}\"", self.as_str())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|channel| channel.as_str() == s)
            .ok_or_else(|| NotifyError::UnknownChannel {
                channel: s.to_string(),
            })
    }
}

/// Commands accepted on the manual channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualCommand {
    /// Process the newest processable run
    Latest,
}

impl ManualCommand {
    pub const LATEST: &'static str = "LATEST";

    pub fn as_str(&self) -> &'static str {
        match self {
            ManualCommand::Latest => Self::LATEST,
        }
    }
}

/// A decoded notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunNotification {
    NewRun { run_id: i32 },
    ManualTrigger(ManualCommand),
}

impl RunNotification {
    /// Decodes a raw `(channel, payload)` pair.
    ///
    /// Surrounding whitespace in the payload is ignored.
    pub fn parse(channel: &str, payload: &str) -> Result<Self, NotifyError> {
        let invalid = |reason: &str| NotifyError::InvalidPayload {
            channel: channel.to_string(),
            payload: payload.to_string(),
            reason: reason.to_string(),
        };

        match channel.parse::<Channel>()? {
            Channel::NewTimetableRun => {
                let run_id = payload
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| invalid("expected a decimal run id"))?;
                if run_id <= 0 {
                    return Err(invalid("run ids are positive"));
                }
                Ok(RunNotification::NewRun { run_id })
            }
            Channel::ManualTrigger => match payload.trim() {
                ManualCommand::LATEST => Ok(RunNotification::ManualTrigger(ManualCommand::Latest)),
                _ => Err(invalid("expected LATEST")),
            },
        }
    }

    pub fn channel(&self) -> Channel {
        match self {
            RunNotification::NewRun { .. } => Channel::NewTimetableRun,
            RunNotification::ManualTrigger(_) => Channel::ManualTrigger,
        }
    }

    /// Payload text as it travels over `pg_notify`.
    pub fn payload(&self) -> String {
        match self {
            RunNotification::NewRun { run_id } => run_id.to_string(),
            RunNotification::ManualTrigger(command) => command.as_str().to_string(),
        }
    }
}
