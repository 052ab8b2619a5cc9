use clap::Parser;
use std::path::PathBuf;

mod commands;
mod context;
mod execute;
mod output;

use commands::Commands;
use context::Context;

#[derive(Parser)]
#[command(name = "forcebridge")]
#[command(about = "Run Salesforce CLI source and test commands with conflict tracking", long_about = None)]
#[command(version)]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,

    /// Username or alias of the target org
    #[arg(long, global = true)]
    org: Option<String>,

    /// CLI program to invoke instead of `sfdx`
    #[arg(long, global = true, value_name = "PROGRAM")]
    cli: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    forcebridge_utils::tracing::init()
        .map_err(|e| eyre::eyre!("failed to initialize logging: {e}"))?;

    let cli = Cli::parse();
    let context = Context::load(cli.project, cli.org, cli.cli)?;
    cli.command.execute(&context).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "forcebridge",
            "pull",
            "--force",
            "--org",
            "dev@example.com",
            "--project",
            "/work/project",
        ])
        .unwrap();
        assert_eq!(cli.org.as_deref(), Some("dev@example.com"));
        assert_eq!(cli.project, Some(PathBuf::from("/work/project")));
        assert!(matches!(cli.command, Commands::Pull { force: true }));
    }

    #[test]
    fn deploy_requires_a_path() {
        assert!(Cli::try_parse_from(["forcebridge", "deploy"]).is_err());
        let cli = Cli::try_parse_from(["forcebridge", "deploy", "a", "b"]).unwrap();
        match cli.command {
            Commands::Deploy { paths } => assert_eq!(paths, vec!["a", "b"]),
            _ => panic!("expected deploy"),
        }
    }

    #[test]
    fn test_class_and_method_conflict() {
        assert!(Cli::try_parse_from([
            "forcebridge",
            "test",
            "--class",
            "FooTest",
            "--method",
            "FooTest.bar"
        ])
        .is_err());
    }
}
