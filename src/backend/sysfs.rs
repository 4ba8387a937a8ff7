use std::{fs, path::PathBuf};

use tracing::debug;

use super::{ModuleProbe, TeardownStep, TestBackend, run_command};
use crate::{
    error::BackendError,
    test::test_config::{Direction, TestConfig},
};

/// Drives the module through its control directory (`config`, `direction`,
/// `start`, `stats`), loading and unloading it with modprobe.
#[derive(Debug, Clone)]
pub struct SysfsBackend {
    root: PathBuf,
    modprobe: PathBuf,
    module_name: String,
    probe: ModuleProbe,
}

impl SysfsBackend {
    pub fn new(
        root: impl Into<PathBuf>,
        modprobe: impl Into<PathBuf>,
        module_name: impl Into<String>,
        probe: ModuleProbe,
    ) -> Self {
        Self {
            root: root.into(),
            modprobe: modprobe.into(),
            module_name: module_name.into(),
            probe,
        }
    }

    fn write(&self, file: &str, value: &str) -> Result<(), BackendError> {
        let path = self.root.join(file);
        debug!(path = %path.display(), value = value.trim_end(), "write");
        fs::write(&path, value).map_err(|source| BackendError::Io { path, source })
    }
}

impl TestBackend for SysfsBackend {
    fn name(&self) -> &'static str {
        "sysfs"
    }

    fn is_active(&self) -> bool {
        self.probe.is_loaded()
    }

    fn activate(&self) -> Result<(), BackendError> {
        run_command(&self.modprobe, &[self.module_name.clone()]).map(drop)
    }

    fn configure(&self, conf: &TestConfig) -> Result<(), BackendError> {
        self.write(
            "config",
            &format!(
                "{} {} {} {} {}\n",
                conf.src_ip, conf.dst_ip, conf.src_port, conf.dst_port, conf.protocol
            ),
        )?;
        self.write("direction", &format!("{}\n", conf.direction))
    }

    fn start(&self, _dir: Direction) -> Result<(), BackendError> {
        self.write("start", "1\n")
    }

    fn stop(&self) -> Result<(), BackendError> {
        self.write("start", "0\n")
    }

    // A single stats file covers whichever direction was configured.
    fn fetch_stats(&self, _dir: Direction) -> Result<String, BackendError> {
        let path = self.root.join("stats");
        fs::read_to_string(&path).map_err(|source| BackendError::Io { path, source })
    }

    fn teardown_steps(&self) -> &'static [TeardownStep] {
        &[TeardownStep::Stop, TeardownStep::Unload]
    }

    fn run_teardown_step(&self, step: TeardownStep) -> Result<(), BackendError> {
        match step {
            TeardownStep::Stop => self.stop(),
            TeardownStep::Finalize | TeardownStep::Clear | TeardownStep::Unload => run_command(
                &self.modprobe,
                &["-r".to_string(), self.module_name.clone()],
            )
            .map(drop),
        }
    }
}
