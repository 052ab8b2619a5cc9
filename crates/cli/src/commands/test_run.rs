use crate::commands::source::run_operation;
use crate::context::Context;
use forcebridge_cache::TestParamKind;
use forcebridge_task::ApexTestRun;
use std::path::PathBuf;

/// Results directory used when none is given, relative to the project root
const DEFAULT_OUTPUT_DIR: &str = ".sfdx/tools/testresults/apex";

pub async fn execute(
    context: &Context,
    class: Option<String>,
    method: Option<String>,
    code_coverage: bool,
    output_dir: Option<PathBuf>,
) -> eyre::Result<()> {
    let params = context.test_params();
    let tests = match (class, method) {
        (_, Some(method)) => params.resolve(TestParamKind::Method, Some(&method))?,
        (Some(class), None) => params.resolve(TestParamKind::Class, Some(&class))?,
        (None, None) => match params.last(TestParamKind::Method)? {
            Some(method) => Some(method),
            None => params.last(TestParamKind::Class)?,
        },
    };
    let Some(tests) = tests else {
        eyre::bail!("no test class or method given and none was run before");
    };

    let output_dir =
        output_dir.unwrap_or_else(|| context.config.project_root.join(DEFAULT_OUTPUT_DIR));
    let operation = ApexTestRun::new(tests, output_dir).with_code_coverage(code_coverage);
    run_operation(context, &operation, true).await
}
