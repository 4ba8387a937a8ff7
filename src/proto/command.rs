use std::{fmt, net::Ipv4Addr};

use crate::test::test_config::Direction;

/// One invocation of the external helper program, keyed by its `--mode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperCommand {
    // ---- Module lifecycle ----
    Init {
        rate: u32,
        buffer_sz: u32,
        dscp: u8,
        net_dev: String,
    },
    Final,
    Clear,

    // ---- Test setup ----
    Create {
        sip: Ipv4Addr,
        dip: Ipv4Addr,
        sport: u16,
        dport: u16,
    },

    // ---- Test control ----
    Start {
        kind: TrafficType,
    },
    Stop,
    Stats {
        kind: TrafficType,
    },
}

/// The helper's `--type`: which side of the link it measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficType {
    Tx,
    Rx,
}

impl From<Direction> for TrafficType {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::Upstream => TrafficType::Tx,
            Direction::Downstream => TrafficType::Rx,
        }
    }
}

impl TrafficType {
    pub fn as_str(self) -> &'static str {
        match self {
            TrafficType::Tx => "tx",
            TrafficType::Rx => "rx",
        }
    }
}

impl HelperCommand {
    pub fn mode(&self) -> &'static str {
        match self {
            HelperCommand::Init { .. } => "init",
            HelperCommand::Final => "final",
            HelperCommand::Clear => "clear",
            HelperCommand::Create { .. } => "create",
            HelperCommand::Start { .. } => "start",
            HelperCommand::Stop => "stop",
            HelperCommand::Stats { .. } => "stats",
        }
    }

    /// Render the argument vector passed to the helper (program name excluded).
    pub fn to_args(&self) -> Vec<String> {
        use HelperCommand::*;
        let mut out = vec!["--mode".to_string(), self.mode().to_string()];

        macro_rules! push_pair {
            ($k:literal, $v:expr) => {{
                out.push($k.to_string());
                out.push($v.to_string());
            }};
        }

        match self {
            Init {
                rate,
                buffer_sz,
                dscp,
                net_dev,
            } => {
                push_pair!("--rate", rate);
                push_pair!("--buffer_sz", buffer_sz);
                push_pair!("--dscp", dscp);
                push_pair!("--net_dev", net_dev);
            }
            Create {
                sip,
                dip,
                sport,
                dport,
            } => {
                push_pair!("--sip", sip);
                push_pair!("--dip", dip);
                push_pair!("--sport", sport);
                push_pair!("--dport", dport);
                push_pair!("--version", 4);
            }
            Start { kind } | Stats { kind } => {
                push_pair!("--type", kind.as_str());
            }
            Final | Clear | Stop => {}
        }

        out
    }
}

impl fmt::Display for HelperCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_args().join(" "))
    }
}
