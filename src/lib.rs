use std::env;
use std::path::PathBuf;
use crate::config::types::TransportKind;
use crate::gui::application::run_application;
use crate::error::AppRunError;

pub mod auth;
pub mod config;
pub mod device;
pub mod error;
pub mod gui;
pub mod panel;

pub fn init_logging() {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stderr());

    if let Ok(log_file) = env::var("LOG_FILE") {
        dispatch = dispatch.chain(
            fern::log_file(log_file).expect("Failed to open LOG_FILE")
        );
    }

    dispatch.apply().expect("Failed to initialize logger");
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Use this config file instead of the portable / per-user one.
    pub config_path: Option<PathBuf>,
    /// Overrides the transport selected in the config file.
    pub transport: Option<TransportKind>,
}

pub fn run(options: RunOptions) -> Result<(), AppRunError> {
    run_application(options)?;
    Ok(())
}
