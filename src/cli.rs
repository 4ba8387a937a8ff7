use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum, error::ErrorKind};

const EXAMPLE: &str = "\
Example:
  linksys-udp-st start --src-ip 192.168.1.100 --dst-ip 192.168.1.200 \\
                       --src-port 5201 --dst-port 5201 \\
                       --protocol udp --direction upstream";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "linksys-udp-st",
    about = "Command-line controller for the NSS UDP speed test module",
    after_help = EXAMPLE
)]
pub struct Cli {
    #[command(flatten)]
    pub control: ControlOpts,
    #[command(subcommand)]
    pub cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// Load the module, configure the test and start it
    Start(StartOpts),
    /// Report idle, or running with the current throughput
    Status,
    /// Stop the test, report final results and unload the module
    Stop,
}

/// Raw `start` parameters. Values stay strings here; validation reports
/// which field is wrong.
#[derive(Args, Debug, Clone)]
pub struct StartOpts {
    /// Source IPv4 address
    #[arg(long, value_name = "IPV4")]
    pub src_ip: String,
    /// Destination IPv4 address
    #[arg(long, value_name = "IPV4")]
    pub dst_ip: String,
    /// Source port (1-65535)
    #[arg(long, value_name = "PORT", allow_hyphen_values = true)]
    pub src_port: String,
    /// Destination port (1-65535)
    #[arg(long, value_name = "PORT", allow_hyphen_values = true)]
    pub dst_port: String,
    /// tcp or udp
    #[arg(long, value_name = "PROTO")]
    pub protocol: String,
    /// upstream or downstream
    #[arg(long, value_name = "DIR")]
    pub direction: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// nss-udp-st helper executable
    Helper,
    /// Pseudo-filesystem control directory
    Sysfs,
}

/// Where and how to reach the test module. Every option falls back to a
/// `UDP_ST_*` environment variable, then to its default.
#[derive(Args, Debug, Clone)]
pub struct ControlOpts {
    /// Control surface to drive
    #[arg(long, value_enum, default_value_t = BackendKind::Helper, env = "UDP_ST_BACKEND", global = true)]
    pub backend: BackendKind,
    /// Helper executable
    #[arg(long, value_name = "PATH", default_value = "nss-udp-st", env = "UDP_ST_HELPER", global = true)]
    pub helper: String,
    /// Directory the helper writes <tx|rx>_stats into
    #[arg(long, value_name = "DIR", default_value = "/tmp/nss-udp-st", env = "UDP_ST_STATS_DIR", global = true)]
    pub stats_dir: String,
    /// Directory whose presence means the module is loaded
    #[arg(long, value_name = "DIR", default_value = "/sys/module/nss_udp_st", env = "UDP_ST_MODULE_PATH", global = true)]
    pub module_path: String,
    /// Control directory for the sysfs backend
    #[arg(long, value_name = "DIR", default_value = "/sys/kernel/nss_udp_st", env = "UDP_ST_SYSFS_DIR", global = true)]
    pub sysfs_dir: String,
    /// modprobe executable used by the sysfs backend
    #[arg(long, value_name = "PATH", default_value = "modprobe", env = "UDP_ST_MODPROBE", global = true)]
    pub modprobe: String,
    /// Kernel module name
    #[arg(long, value_name = "NAME", default_value = "nss_udp_st", env = "UDP_ST_MODULE_NAME", global = true)]
    pub module_name: String,
    /// Network device the module transmits on
    #[arg(long, value_name = "IFNAME", default_value = "eth4", env = "UDP_ST_NET_DEV", global = true)]
    pub net_dev: String,
    /// Module rate in Mbps
    #[arg(long, value_name = "MBPS", default_value_t = 1000, env = "UDP_ST_RATE", global = true)]
    pub rate: u32,
    /// Module buffer size in bytes
    #[arg(long, value_name = "BYTES", default_value_t = 1500, env = "UDP_ST_BUFFER_SZ", global = true)]
    pub buffer_sz: u32,
    /// DSCP marking (0-63)
    #[arg(long, value_name = "DSCP", default_value_t = 0, env = "UDP_ST_DSCP", global = true)]
    pub dscp: u8,
    /// Directory holding the session record between invocations
    #[arg(long, value_name = "DIR", default_value = "/tmp/linksys-udp-st", env = "UDP_ST_STATE_DIR", global = true)]
    pub state_dir: String,
    /// Log level on stderr: error, warn, info, debug, trace
    #[arg(long, value_name = "LEVEL", default_value = "info", env = "UDP_ST_LOG_LEVEL", global = true)]
    pub log_level: String,
}

pub fn print_usage() {
    println!("{}", Cli::command().render_help());
}

/// What to do after a failed parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailure {
    /// --help / --version: clap prints and exits 0.
    Informational,
    /// Unknown command: usage only.
    UnknownCommand,
    /// Missing or malformed arguments: error report plus usage.
    BadArguments,
}

pub fn classify(err: &clap::Error) -> ParseFailure {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ParseFailure::Informational,
        ErrorKind::InvalidSubcommand => ParseFailure::UnknownCommand,
        _ => ParseFailure::BadArguments,
    }
}
