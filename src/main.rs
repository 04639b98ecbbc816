mod app;
mod commands;
mod presenter;

use std::path::PathBuf;
use toast_center_config::ToastConfig;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

const USAGE: &str = "\
usage: toast-center [--config <path>]

Reads commands from stdin and writes the visible toasts to stdout as JSON
lines. Type `help` once running for the command list.";

fn main() -> anyhow::Result<()> {
    color_backtrace::install();
    init_logging();

    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        println!("{USAGE}");
        return Ok(());
    }
    let config_path: Option<PathBuf> = args.opt_value_from_os_str("--config", |s| {
        Ok::<_, std::convert::Infallible>(PathBuf::from(s))
    })?;
    let unused = args.finish();
    if !unused.is_empty() {
        tracing::warn!("ignoring unexpected arguments: {unused:?}");
    }

    let config = ToastConfig::load(config_path.as_deref())?;
    tracing::debug!("loaded config {config:?}");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(app::run(config))
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false));

    #[cfg(feature = "systemd")]
    let registry = registry.with(tracing_journald::layer().ok());

    registry.init();
}
