use std::env;

use muster::commands::schema;
use muster::config::Config;
use muster::platform::rest::RestClient;

enum OpMode {
    RegisterCommands,
    CheckConfig,
    Usage,
}

fn parse_op_mode() -> Result<OpMode, String> {
    let mut args = env::args().skip(1);
    let mode = match args.next().as_deref() {
        None | Some("--help") => OpMode::Usage,
        Some("--register-commands") => OpMode::RegisterCommands,
        Some("--check-config") => OpMode::CheckConfig,
        Some(other) => return Err(format!("Unknown argument: {}", other)),
    };
    if let Some(extra) = args.next() {
        return Err(format!("Unexpected argument: {}", extra));
    }
    Ok(mode)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();

    let mode = match parse_op_mode() {
        Ok(mode) => mode,
        Err(err) => {
            eprintln!("Error: {}", err);
            println!("Usage: muster [--register-commands | --check-config]");
            return Ok(());
        }
    };

    match mode {
        OpMode::Usage => {
            println!("Usage: muster [--register-commands | --check-config]");
            println!("  --register-commands  Push the slash-command schema to the guild");
            println!("  --check-config       Validate the config file and timezone table");
        }
        OpMode::CheckConfig => {
            let config = Config::load_or_create()?;
            let table = config.timezone_table()?;
            println!("Config: {}", Config::config_path().display());
            for (zone, members) in table.groups() {
                println!("  {}: {} member(s)", zone, members.len());
            }
            if config.platform.token.is_empty() {
                println!("Warning: platform token is empty");
            }
            println!("Config OK");
        }
        OpMode::RegisterCommands => {
            let config = Config::load_or_create()?;
            let client = RestClient::new(
                config.platform.token.clone(),
                config.platform.guild_id.clone(),
            );
            client
                .register_commands(&config.platform.application_id, &schema::command_schema())
                .await?;
            println!(
                "Registered command schema for guild {}",
                config.platform.guild_id
            );
        }
    }

    Ok(())
}

fn setup_logging() {
    let log_dir = dirs::config_dir()
        .map(|d| d.join("muster"))
        .unwrap_or_else(|| std::path::PathBuf::from("."));

    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "muster.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .init();

    std::mem::forget(_guard);

    tracing::info!("muster started");
}
