use clap::{Parser, Subcommand};

pub mod config;
pub mod init_config;
pub mod logging;
pub mod serve;
pub mod sign;
pub mod version;

#[derive(Parser)]
#[command(name = "govdash")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Governance proposal and voting API server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Path to config file (default: ~/.local/share/govdash/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Listen address, overrides [server] bind (e.g., 0.0.0.0:8080)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Sign a message with personal_sign for use in API requests
    Sign {
        /// Hex-encoded secp256k1 private key
        #[arg(long)]
        key: String,

        /// Sign arbitrary text
        #[arg(long)]
        message: Option<String>,

        /// Sign the create-proposal message for this title
        #[arg(long)]
        create: Option<String>,

        /// Sign the vote message for this proposal id
        #[arg(long)]
        vote: Option<u64>,

        /// With --vote: sign a vote against (default is for)
        #[arg(long)]
        against: bool,
    },

    /// Write a default configuration file
    InitConfig {
        /// Output path (default: ~/.local/share/govdash/config.toml)
        #[arg(long)]
        path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Serve { config, bind } => serve::execute(config, bind).await,
        Commands::Sign {
            key,
            message,
            create,
            vote,
            against,
        } => sign::execute(key, sign::Payload::from_args(message, create, vote, against)?),
        Commands::InitConfig { path, force } => init_config::execute(path, force),
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_serve_defaults() {
        let cli = Cli::parse_from(["govdash", "serve"]);

        match cli.command {
            Commands::Serve { config, bind } => {
                assert_eq!(config, None);
                assert_eq!(bind, None);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_parse_serve_with_options() {
        let cli = Cli::parse_from([
            "govdash",
            "serve",
            "--config",
            "/etc/govdash/config.toml",
            "--bind",
            "0.0.0.0:9000",
        ]);

        match cli.command {
            Commands::Serve { config, bind } => {
                assert_eq!(config, Some("/etc/govdash/config.toml".to_string()));
                assert_eq!(bind, Some("0.0.0.0:9000".to_string()));
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_parse_sign_vote() {
        let cli = Cli::parse_from([
            "govdash", "sign", "--key", "0xabc", "--vote", "7", "--against",
        ]);

        match cli.command {
            Commands::Sign {
                key,
                message,
                create,
                vote,
                against,
            } => {
                assert_eq!(key, "0xabc");
                assert_eq!(message, None);
                assert_eq!(create, None);
                assert_eq!(vote, Some(7));
                assert!(against);
            }
            _ => panic!("Expected Sign command"),
        }
    }

    #[test]
    fn test_cli_parse_sign_requires_key() {
        assert!(Cli::try_parse_from(["govdash", "sign", "--message", "hi"]).is_err());
    }

    #[test]
    fn test_cli_parse_init_config() {
        let cli = Cli::parse_from(["govdash", "init-config", "--path", "/tmp/c.toml", "--force"]);

        match cli.command {
            Commands::InitConfig { path, force } => {
                assert_eq!(path, Some("/tmp/c.toml".to_string()));
                assert!(force);
            }
            _ => panic!("Expected InitConfig command"),
        }
    }

    #[test]
    fn test_cli_parse_version() {
        let cli = Cli::parse_from(["govdash", "version"]);
        assert!(matches!(cli.command, Commands::Version));
    }
}
