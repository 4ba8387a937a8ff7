//! JSON documents written to stdout. Field names are part of the CLI contract.

use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;

use crate::test::test_config::{TestConfig, TestRun, TestStatus};

pub const UNIT: &str = "bps";

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Report {
    Status(StatusReport),
    Final(ResultReport),
    Error(ErrorReport),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub status: TestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throughput: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
}

impl StatusReport {
    pub fn idle() -> Self {
        Self {
            status: TestStatus::Idle,
            throughput: None,
            unit: None,
        }
    }

    pub fn from_run(run: &TestRun) -> Self {
        let throughput = run.throughput();
        Self {
            status: run.status(),
            throughput,
            unit: throughput.map(|_| UNIT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultReport {
    /// Absent only when the session record was lost.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_config: Option<TestConfig>,
    pub results: Throughput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Throughput {
    pub throughput: u64,
    pub unit: &'static str,
}

impl ResultReport {
    pub fn new(test_config: Option<TestConfig>, bps: u64) -> Self {
        Self {
            test_config,
            results: Throughput {
                throughput: bps,
                unit: UNIT,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub error: String,
}

impl ErrorReport {
    pub fn new(msg: impl ToString) -> Self {
        Self {
            error: msg.to_string(),
        }
    }
}

/// Pretty-print `doc` to stdout followed by a newline.
pub fn emit(doc: &Report) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, doc)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test::test_config::{Direction, Protocol};

    #[test]
    fn idle_status_has_no_throughput() {
        let v = serde_json::to_value(Report::Status(StatusReport::idle())).unwrap();
        assert_eq!(v, json!({ "status": "idle" }));
    }

    #[test]
    fn running_status_carries_bps() {
        let mut run = TestRun::new();
        run.transition(TestStatus::Running).unwrap();
        run.record_throughput(250_000_000);
        let v = serde_json::to_value(Report::Status(StatusReport::from_run(&run))).unwrap();
        assert_eq!(
            v,
            json!({ "status": "running", "throughput": 250_000_000u64, "unit": "bps" })
        );
    }

    #[test]
    fn final_result_layout() {
        let conf = TestConfig {
            src_ip: "192.168.1.100".parse().unwrap(),
            dst_ip: "192.168.1.200".parse().unwrap(),
            src_port: 5201,
            dst_port: 5201,
            protocol: Protocol::Udp,
            direction: Direction::Upstream,
        };
        let v = serde_json::to_value(Report::Final(ResultReport::new(Some(conf), 7))).unwrap();
        assert_eq!(
            v,
            json!({
                "test_config": {
                    "src_ip": "192.168.1.100",
                    "dst_ip": "192.168.1.200",
                    "src_port": 5201,
                    "dst_port": 5201,
                    "protocol": "udp",
                    "direction": "upstream"
                },
                "results": { "throughput": 7, "unit": "bps" }
            })
        );
    }

    #[test]
    fn error_layout() {
        let v = serde_json::to_value(Report::Error(ErrorReport::new("No test running"))).unwrap();
        assert_eq!(v, json!({ "error": "No test running" }));
    }
}
