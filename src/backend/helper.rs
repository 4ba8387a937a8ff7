use std::{fs, path::PathBuf};

use super::{ModuleProbe, TeardownStep, TestBackend, run_command};
use crate::{
    error::BackendError,
    proto::command::{HelperCommand, TrafficType},
    test::test_config::{Direction, TestConfig},
};

/// Module init parameters passed with `--mode init`.
#[derive(Debug, Clone)]
pub struct InitParams {
    pub rate: u32,
    pub buffer_sz: u32,
    pub dscp: u8,
    pub net_dev: String,
}

/// Drives the module through the `nss-udp-st` helper executable.
#[derive(Debug, Clone)]
pub struct HelperBackend {
    program: PathBuf,
    stats_dir: PathBuf,
    init: InitParams,
    probe: ModuleProbe,
}

impl HelperBackend {
    pub fn new(
        program: impl Into<PathBuf>,
        stats_dir: impl Into<PathBuf>,
        init: InitParams,
        probe: ModuleProbe,
    ) -> Self {
        Self {
            program: program.into(),
            stats_dir: stats_dir.into(),
            init,
            probe,
        }
    }

    fn exec(&self, cmd: &HelperCommand) -> Result<(), BackendError> {
        run_command(&self.program, &cmd.to_args()).map(drop)
    }

    /// The helper dumps stats to `<stats_dir>/<tx|rx>_stats`.
    pub fn stats_file(&self, kind: TrafficType) -> PathBuf {
        self.stats_dir.join(format!("{}_stats", kind.as_str()))
    }
}

impl TestBackend for HelperBackend {
    fn name(&self) -> &'static str {
        "helper"
    }

    fn is_active(&self) -> bool {
        self.probe.is_loaded()
    }

    fn activate(&self) -> Result<(), BackendError> {
        self.exec(&HelperCommand::Init {
            rate: self.init.rate,
            buffer_sz: self.init.buffer_sz,
            dscp: self.init.dscp,
            net_dev: self.init.net_dev.clone(),
        })
    }

    // The helper has no protocol switch; the module generates UDP regardless.
    fn configure(&self, conf: &TestConfig) -> Result<(), BackendError> {
        self.exec(&HelperCommand::Create {
            sip: conf.src_ip,
            dip: conf.dst_ip,
            sport: conf.src_port,
            dport: conf.dst_port,
        })
    }

    fn start(&self, dir: Direction) -> Result<(), BackendError> {
        self.exec(&HelperCommand::Start { kind: dir.into() })
    }

    fn stop(&self) -> Result<(), BackendError> {
        self.exec(&HelperCommand::Stop)
    }

    fn fetch_stats(&self, dir: Direction) -> Result<String, BackendError> {
        let kind = TrafficType::from(dir);
        self.exec(&HelperCommand::Stats { kind })?;
        let path = self.stats_file(kind);
        fs::read_to_string(&path).map_err(|source| BackendError::Io { path, source })
    }

    fn teardown_steps(&self) -> &'static [TeardownStep] {
        &[TeardownStep::Stop, TeardownStep::Finalize, TeardownStep::Clear]
    }

    fn run_teardown_step(&self, step: TeardownStep) -> Result<(), BackendError> {
        match step {
            TeardownStep::Stop => self.exec(&HelperCommand::Stop),
            TeardownStep::Finalize => self.exec(&HelperCommand::Final),
            TeardownStep::Clear | TeardownStep::Unload => self.exec(&HelperCommand::Clear),
        }
    }
}
