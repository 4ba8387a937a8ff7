//! Control surfaces of the external test module.
//!
//! The module itself is a black box: it is driven either through a helper
//! executable ([`helper::HelperBackend`]) or through a pseudo-filesystem
//! directory ([`sysfs::SysfsBackend`]). Both report "a test is active" through
//! the presence of the loaded module's directory.

use std::{
    fmt,
    path::{Path, PathBuf},
    process::Command,
};

use tracing::{debug, error};

use crate::{
    error::BackendError,
    test::test_config::{Direction, TestConfig},
};

pub mod helper;
pub mod sysfs;

pub trait TestBackend {
    fn name(&self) -> &'static str;
    /// Presence check only; never changes external state.
    fn is_active(&self) -> bool;
    fn activate(&self) -> Result<(), BackendError>;
    fn configure(&self, conf: &TestConfig) -> Result<(), BackendError>;
    fn start(&self, dir: Direction) -> Result<(), BackendError>;
    fn stop(&self) -> Result<(), BackendError>;
    /// Raw stats text for the given direction.
    fn fetch_stats(&self, dir: Direction) -> Result<String, BackendError>;
    /// Steps that return the module to idle, in execution order.
    fn teardown_steps(&self) -> &'static [TeardownStep];
    fn run_teardown_step(&self, step: TeardownStep) -> Result<(), BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    Stop,
    Finalize,
    Clear,
    Unload,
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TeardownStep::Stop => "stop",
            TeardownStep::Finalize => "final",
            TeardownStep::Clear => "clear",
            TeardownStep::Unload => "unload",
        })
    }
}

/// Presence indicator: the module's directory under `/sys/module`.
#[derive(Debug, Clone)]
pub struct ModuleProbe {
    path: PathBuf,
}

impl ModuleProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn is_loaded(&self) -> bool {
        self.path.exists()
    }
}

/// Run `program args..` to completion, returning captured stdout.
///
/// Output is captured so nothing leaks onto our stdout, which carries JSON.
pub(crate) fn run_command(program: &Path, args: &[String]) -> Result<String, BackendError> {
    let rendered = render(program, args);
    debug!(command = %rendered, "exec");

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| BackendError::Spawn {
            program: program.display().to_string(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stdout.trim().is_empty() {
        debug!(command = %rendered, stdout = %stdout.trim(), "exec stdout");
    }
    if !stderr.is_empty() {
        debug!(command = %rendered, %stderr, "exec stderr");
    }

    if !output.status.success() {
        error!(command = %rendered, status = %output.status, "command failed");
        return Err(BackendError::CommandFailed {
            command: rendered,
            status: output.status.to_string(),
            stderr,
        });
    }
    Ok(stdout)
}

fn render(program: &Path, args: &[String]) -> String {
    let mut s = program.display().to_string();
    for a in args {
        s.push(' ');
        s.push_str(a);
    }
    s
}

#[cfg(test)]
pub(crate) mod fake {
    //! Recording in-memory backend for controller and teardown tests.

    use std::cell::{Cell, RefCell};
    use std::io;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Activate,
        Configure(TestConfig),
        Start(Direction),
        Stop,
        FetchStats(Direction),
        Teardown(TeardownStep),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FailAt {
        Activate,
        Configure,
        Start,
        Stop,
        FetchStats,
        Teardown(TeardownStep),
    }

    pub struct FakeBackend {
        pub active: Cell<bool>,
        pub calls: RefCell<Vec<Call>>,
        pub fail: RefCell<Vec<FailAt>>,
        pub stats: RefCell<String>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self {
                active: Cell::new(false),
                calls: RefCell::new(Vec::new()),
                fail: RefCell::new(Vec::new()),
                stats: RefCell::new("Throughput: 1000\n".into()),
            }
        }

        pub fn running() -> Self {
            let b = Self::new();
            b.active.set(true);
            b
        }

        pub fn failing(self, at: FailAt) -> Self {
            self.fail.borrow_mut().push(at);
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: Call, at: FailAt) -> Result<(), BackendError> {
            self.calls.borrow_mut().push(call);
            if self.fail.borrow().contains(&at) {
                return Err(BackendError::Io {
                    path: "/fake".into(),
                    source: io::Error::other(format!("{at:?} failed")),
                });
            }
            Ok(())
        }
    }

    impl TestBackend for FakeBackend {
        fn name(&self) -> &'static str {
            "fake"
        }
        fn is_active(&self) -> bool {
            self.active.get()
        }
        fn activate(&self) -> Result<(), BackendError> {
            self.record(Call::Activate, FailAt::Activate)?;
            self.active.set(true);
            Ok(())
        }
        fn configure(&self, conf: &TestConfig) -> Result<(), BackendError> {
            self.record(Call::Configure(conf.clone()), FailAt::Configure)
        }
        fn start(&self, dir: Direction) -> Result<(), BackendError> {
            self.record(Call::Start(dir), FailAt::Start)
        }
        fn stop(&self) -> Result<(), BackendError> {
            self.record(Call::Stop, FailAt::Stop)
        }
        fn fetch_stats(&self, dir: Direction) -> Result<String, BackendError> {
            self.record(Call::FetchStats(dir), FailAt::FetchStats)?;
            Ok(self.stats.borrow().clone())
        }
        fn teardown_steps(&self) -> &'static [TeardownStep] {
            &[TeardownStep::Stop, TeardownStep::Finalize, TeardownStep::Clear]
        }
        fn run_teardown_step(&self, step: TeardownStep) -> Result<(), BackendError> {
            self.record(Call::Teardown(step), FailAt::Teardown(step))?;
            if step == TeardownStep::Clear {
                self.active.set(false);
            }
            Ok(())
        }
    }
}
