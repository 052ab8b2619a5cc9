//! Running orchestrated operations from the command line

use crate::context::Context;
use crate::output;
use forcebridge_task::Operation;
use std::io::Write;
use tokio_util::sync::CancellationToken;

/// Run `operation`, cancelling it on Ctrl-C. With `echo`, the tool's stdout
/// is copied to ours as it arrives.
pub async fn run_operation(
    context: &Context,
    operation: &dyn Operation,
    echo: bool,
) -> eyre::Result<()> {
    let token = CancellationToken::new();
    let interrupt = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, cancelling");
                token.cancel();
            }
        })
    };

    let report = context
        .orchestrator
        .run_observed(operation, token, |chunk| {
            if echo {
                let mut stdout = std::io::stdout().lock();
                let _ = stdout.write_all(chunk.as_bytes());
                let _ = stdout.flush();
            }
        })
        .await;
    interrupt.abort();

    let report = report?;
    output::print_report(&report);
    match report.error() {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}
