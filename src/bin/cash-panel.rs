use std::path::PathBuf;
use clap::Parser;
use log::info;
use msgbox::IconType;
use cash_panel::config::types::TransportKind;
use cash_panel::{init_logging, run, RunOptions};
use cash_panel::error::{error_msgbox, AppRunError, ConfigError};

/// Control panel for the CASH heating pad and temperature sensor.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Config file to use instead of the portable or per-user one
    #[arg(long)]
    config: Option<PathBuf>,

    /// How to reach the device, overriding the config file
    #[arg(long, value_enum)]
    transport: Option<TransportKind>,
}

fn main() -> Result<(), AppRunError> {
    let args = Args::parse();

    init_logging();
    info!(concat!("CASH Panel ", env!("CARGO_PKG_VERSION")));

    let options = RunOptions {
        config_path: args.config,
        transport: args.transport,
    };

    match run(options) {
        Err(AppRunError::ConfigError { source: ConfigError::CanNotLock { .. } }) => {
            if let Err(err) = msgbox::create(
                concat!("CASH Panel ", env!("CARGO_PKG_VERSION")),
                "This application has already been started",
                IconType::Error,
            ) {
                eprintln!("Failed to create msgbox: {:?}", err);
            }
            Ok(())
        },
        Err(err) => {
            error_msgbox("Unexpected error", &err);
            Err(err)
        }
        Ok(_) => Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let args = Args::try_parse_from(["cash-panel", "--config", "panel.json", "--transport", "direct-http"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("panel.json")));
        assert_eq!(args.transport, Some(TransportKind::DirectHttp));

        assert!(Args::try_parse_from(["cash-panel", "--transport", "carrier-pigeon"]).is_err());
    }
}
