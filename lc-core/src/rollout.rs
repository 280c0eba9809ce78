use std::fmt;
use std::time::Duration;

use crate::prelude::*;
use crate::util::Poller;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RolloutStatus {
    Progressing,
    Completed,
    ProgressDeadlineExceeded,
}

impl fmt::Display for RolloutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RolloutStatus::Progressing => "Progressing",
            RolloutStatus::Completed => "Completed",
            RolloutStatus::ProgressDeadlineExceeded => "ProgressDeadlineExceeded",
        };
        write!(f, "{s}")
    }
}

pub fn completed_message(name: &str) -> String {
    format!("{name} rollout complete")
}

pub fn progressing_message(name: &str, updated: i32, total: i32, detail: &str) -> String {
    format!("{name} rollout in progress, {updated}/{total} replicas updated: {detail}")
}

pub fn deadline_exceeded_message(name: &str, detail: &str) -> String {
    format!("{name} rollout failed: {detail}")
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RolloutOptions {
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
}

impl Default for RolloutOptions {
    fn default() -> RolloutOptions {
        RolloutOptions {
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl RolloutOptions {
    pub(crate) fn poller(&self) -> Poller {
        Poller::new(self.poll_interval, self.poll_timeout)
    }
}

// Last observed state of a rollout; `status` stays `None` until the first poll has run
#[derive(Clone, Debug, Default)]
pub(crate) struct RolloutState {
    pub status: Option<RolloutStatus>,
    pub message: String,
}

impl RolloutState {
    pub fn set(&mut self, status: RolloutStatus, message: String) {
        self.status = Some(status);
        self.message = message;
    }

    pub fn complete(&self) -> bool {
        self.status == Some(RolloutStatus::Completed)
    }
}
