use clap::Subcommand;
use std::path::PathBuf;

pub mod cache;
pub mod source;
pub mod test_run;

use self::cache::CacheCommands;

#[derive(Subcommand)]
pub enum Commands {
    /// Pull source from the default scratch org
    Pull {
        /// Overwrite local changes that conflict with the org
        #[arg(short, long)]
        force: bool,
    },

    /// Push local source to the default scratch org
    Push {
        /// Overwrite org changes that conflict with local source
        #[arg(short, long)]
        force: bool,
    },

    /// Deploy source paths to the org
    Deploy {
        /// Files or directories to deploy
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Run Apex tests; reruns the last class or method when none is given
    Test {
        /// Test class to run
        #[arg(long, conflicts_with = "method")]
        class: Option<String>,

        /// Single test method to run, as `Class.method`
        #[arg(long)]
        method: Option<String>,

        /// Collect code coverage
        #[arg(long)]
        code_coverage: bool,

        /// Directory for test results (defaults to `.sfdx/tools/testresults/apex`)
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Set the project's default org
    ConfigSet {
        /// Username or alias; only the first comma-separated entry is used
        username_or_alias: String,
    },

    /// Inspect the conflict cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}
