use crate::commands::source::run_operation;
use crate::commands::{test_run, Commands};
use crate::context::Context;
use forcebridge_task::{ConfigSet, SourceDeploy, SourcePull, SourcePush};

impl Commands {
    pub async fn execute(self, context: &Context) -> eyre::Result<()> {
        match self {
            Commands::Pull { force } => run_operation(context, &SourcePull::new(force), false).await,
            Commands::Push { force } => run_operation(context, &SourcePush::new(force), false).await,
            Commands::Deploy { paths } => {
                run_operation(context, &SourceDeploy::new(paths), false).await
            }
            Commands::Test {
                class,
                method,
                code_coverage,
                output_dir,
            } => test_run::execute(context, class, method, code_coverage, output_dir).await,
            Commands::ConfigSet { username_or_alias } => {
                run_operation(context, &ConfigSet::new(&username_or_alias), true).await
            }
            Commands::Cache { command } => command.execute(context),
        }
    }
}
