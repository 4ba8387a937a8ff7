//! Control-surface configuration.
//!
//! Resolved from CLI flags with `UDP_ST_*` environment fallbacks; clap
//! applies the precedence (CLI, then environment, then default), this module
//! checks the result and builds the backend.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Result, bail};

use crate::{
    backend::{
        ModuleProbe, TestBackend,
        helper::{HelperBackend, InitParams},
        sysfs::SysfsBackend,
    },
    cli::{BackendKind, ControlOpts},
};

const MAX_DSCP: u8 = 63;

#[derive(Debug, Clone)]
pub struct ControlConfig {
    pub backend: BackendKind,
    pub helper: PathBuf,
    pub stats_dir: PathBuf,
    pub module_path: PathBuf,
    pub sysfs_dir: PathBuf,
    pub modprobe: PathBuf,
    pub module_name: String,
    pub init: InitParams,
    pub state_dir: PathBuf,
}

impl ControlConfig {
    pub fn from_opts(opts: &ControlOpts) -> Result<Self> {
        let config = Self {
            backend: opts.backend,
            helper: opts.helper.clone().into(),
            stats_dir: opts.stats_dir.clone().into(),
            module_path: opts.module_path.clone().into(),
            sysfs_dir: opts.sysfs_dir.clone().into(),
            modprobe: opts.modprobe.clone().into(),
            module_name: opts.module_name.clone(),
            init: InitParams {
                rate: opts.rate,
                buffer_sz: opts.buffer_sz,
                dscp: opts.dscp,
                net_dev: opts.net_dev.clone(),
            },
            state_dir: opts.state_dir.clone().into(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.helper.as_os_str().is_empty() {
            bail!("helper path must not be empty");
        }
        if self.module_name.is_empty() {
            bail!("module name must not be empty");
        }
        if self.init.net_dev.is_empty() {
            bail!("net device must not be empty");
        }
        if self.init.rate == 0 {
            bail!("rate must be greater than 0");
        }
        if self.init.buffer_sz == 0 {
            bail!("buffer size must be greater than 0");
        }
        if self.init.dscp > MAX_DSCP {
            bail!("dscp must be 0-{MAX_DSCP}, got {}", self.init.dscp);
        }
        Ok(())
    }

    pub fn build_backend(&self) -> Arc<dyn TestBackend + Send + Sync> {
        let probe = ModuleProbe::new(&self.module_path);
        match self.backend {
            BackendKind::Helper => Arc::new(HelperBackend::new(
                &self.helper,
                &self.stats_dir,
                self.init.clone(),
                probe,
            )),
            BackendKind::Sysfs => Arc::new(SysfsBackend::new(
                &self.sysfs_dir,
                &self.modprobe,
                self.module_name.clone(),
                probe,
            )),
        }
    }
}
