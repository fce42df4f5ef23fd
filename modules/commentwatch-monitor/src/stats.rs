use std::fmt;

/// Why a run left the Running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The duration budget ran out.
    DeadlineReached,
    /// The shared cancel flag was raised (Ctrl-C or another task).
    Cancelled,
    /// `Monitor::stop` was called on this monitor.
    Stopped,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadlineReached => write!(f, "deadline_reached"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Stats from a monitor run.
#[derive(Debug, Default, Clone)]
pub struct MonitorStats {
    pub ticks: u64,
    pub comments_fetched: u64,
    pub source_failures: u64,
    pub rejected_too_old: u64,
    pub rejected_too_popular: u64,
    pub rejected_duplicate: u64,
    pub accepted: u64,
    pub reported: u64,
    pub report_failures: u64,
    pub evicted: u64,
    pub stop_reason: Option<StopReason>,
}

impl MonitorStats {
    pub fn rejected(&self) -> u64 {
        self.rejected_too_old + self.rejected_too_popular + self.rejected_duplicate
    }
}

impl fmt::Display for MonitorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ticks={} fetched={} accepted={} reported={} rejected(too_old={} too_popular={} duplicate={}) source_failures={} report_failures={} evicted={} stop={}",
            self.ticks,
            self.comments_fetched,
            self.accepted,
            self.reported,
            self.rejected_too_old,
            self.rejected_too_popular,
            self.rejected_duplicate,
            self.source_failures,
            self.report_failures,
            self.evicted,
            self.stop_reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "running".to_string()),
        )
    }
}
