use horizon_signup::campaign_delivery::CampaignDispatchWorker;
use horizon_signup::configuration::Settings;
use horizon_signup::startup::{build_store, Application};
use horizon_signup::telemetry::config_tracing;
use std::fmt::{Debug, Display};
use tokio::task::JoinError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::get_configuration()?;

    config_tracing(&settings.application);

    let store = build_store(&settings.database).await?;
    let application = Application::build(settings.clone(), store.clone()).await?;
    let worker =
        CampaignDispatchWorker::builder(settings.campaigns.clone(), store, application.mailer());

    let application_task = tokio::spawn(application.run_until_terminated());
    let worker_task = tokio::spawn(worker.run_until_terminated());

    tokio::select! {
        outcome = application_task => report_exit("API", outcome),
        outcome = worker_task => report_exit("Campaign dispatch worker", outcome),
    }

    Ok(())
}

fn report_exit(task_name: &str, outcome: Result<Result<(), impl Debug + Display>, JoinError>) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{} has exited", task_name)
        }
        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} failed",
                task_name
            )
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} task failed to complete",
                task_name
            )
        }
    }
}
