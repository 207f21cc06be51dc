use doflex_cloud::PollConfig;
use doflex_cloud_digitalocean::{ClientConfig, DigitalOceanClient, DigitalOceanPlugin};
use doflex_config::{DriverSettings, discover_token};
use doflex_core::{Command, DriverStatus, Manager, StatusReporter, SystemMounter};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let mut reporter = StatusReporter::stdout();

    let result = run(&args).await;
    let written = match &result {
        Ok(status) => reporter.write_status(status),
        Err(e) => {
            tracing::error!("{}", e);
            reporter.write_error(e);
            Ok(())
        }
    };

    if result.is_err() || written.is_err() {
        std::process::exit(1);
    }
}

async fn run(args: &[String]) -> anyhow::Result<DriverStatus> {
    let settings = DriverSettings::from_env()?;
    init_logging(&settings);

    let command = Command::parse(args)?;
    tracing::info!("Running {} {:?}", command.verb(), &args[2..]);

    // init, get-volume-name and the host-side verbs never reach the API
    let token = if command.verb().needs_provider() {
        Some(discover_token()?)
    } else {
        None
    };
    let client = DigitalOceanClient::new(ClientConfig::from_settings(token, &settings))?;
    let plugin = DigitalOceanPlugin::new(
        Arc::new(client),
        Arc::new(SystemMounter::new()),
        PollConfig::new(settings.poll_interval, settings.action_timeout),
    );

    let status = Manager::new(plugin).execute(&command).await?;
    tracing::debug!("{} finished with {:?}", command.verb(), status.status);
    Ok(status)
}

/// Log to a file; stdout carries the status record and the orchestrator
/// reads stderr along with it
fn init_logging(settings: &DriverSettings) {
    use std::fs::OpenOptions;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_file)
        .ok();

    if let Some(file) = log_file {
        let filter = tracing_subscriber::EnvFilter::try_new(&settings.log_filter)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_env_filter(filter)
            .with_ansi(false)
            .init();
    }
}
