use anyhow::Context;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Bookshelf command line
#[derive(Debug, Parser)]
#[command(name = "bookshelf-cli", version, about = "Run and inspect the Bookshelf API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Override `server.host`
        #[arg(long)]
        host: Option<String>,
        /// Override `server.port`
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the resolved settings as JSON
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().context("failed to load Bookshelf settings")?;

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }

            bookshelf_telemetry::init(&settings.telemetry)?;
            tracing::info!(
                env = ?settings.environment,
                address = %settings.bind_address(),
                "bookshelf-cli serving"
            );

            tokio::runtime::Runtime::new()
                .context("failed to build tokio runtime")?
                .block_on(bookshelf_app::run(settings))
        }
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_accepts_overrides() {
        let cli = Cli::try_parse_from(["bookshelf-cli", "serve", "--port", "9100"]).unwrap();
        match cli.command {
            Command::Serve { host, port } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9100));
            }
            other => panic!("expected serve, got {other:?}"),
        }
    }
}
