use crate::configuration::CampaignSettings;
use crate::domain::{Campaign, CampaignStatus, Subscriber};
use crate::mailer::Mailer;
use crate::storage::Store;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub campaign_id: Uuid,
    /// Confirmed subscribers at the start of the run.
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Already tracked by an earlier, interrupted run.
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    NoCampaignDue,
    Completed(DispatchReport),
}

/// Sends the earliest due scheduled campaign to every confirmed subscriber.
///
/// The claim (`scheduled` -> `sending`) is committed before the first send. Any storage
/// failure afterwards puts the campaign back to `scheduled` and is returned to the caller.
#[tracing::instrument(
    name = "Dispatch a due campaign",
    skip_all,
    fields(campaign_id = tracing::field::Empty)
)]
pub async fn dispatch_due_campaign(
    store: &dyn Store,
    mailer: &Mailer,
    settings: &CampaignSettings,
    now: DateTime<Utc>,
) -> Result<DispatchOutcome, anyhow::Error> {
    let campaign = match claim_due_campaign(store, now).await? {
        Some(campaign) => campaign,
        None => return Ok(DispatchOutcome::NoCampaignDue),
    };
    tracing::Span::current().record("campaign_id", &tracing::field::display(campaign.id));

    match send_to_confirmed_subscribers(store, mailer, settings, &campaign).await {
        Ok(report) => {
            tracing::info!(
                total = report.total,
                succeeded = report.succeeded,
                failed = report.failed,
                skipped = report.skipped,
                "Campaign completed"
            );
            Ok(DispatchOutcome::Completed(report))
        }
        Err(e) => {
            if let Err(rollback_error) = reschedule(store, campaign.id).await {
                tracing::error!(
                    error.cause_chain = ?rollback_error,
                    "Failed to put the campaign back to scheduled"
                );
            }
            Err(e)
        }
    }
}

async fn claim_due_campaign(
    store: &dyn Store,
    now: DateTime<Utc>,
) -> Result<Option<Campaign>, anyhow::Error> {
    let mut uow = store.begin().await.context("Failed to begin the claim")?;
    let campaign = match uow.next_due_campaign(now).await? {
        Some(campaign) => campaign,
        None => return Ok(None),
    };
    uow.mark_campaign_sending(campaign.id, now).await?;
    uow.commit()
        .await
        .context("Failed to commit the campaign claim")?;
    Ok(Some(Campaign {
        status: CampaignStatus::Sending,
        sent_date: Some(now),
        ..campaign
    }))
}

async fn send_to_confirmed_subscribers(
    store: &dyn Store,
    mailer: &Mailer,
    settings: &CampaignSettings,
    campaign: &Campaign,
) -> Result<DispatchReport, anyhow::Error> {
    let (recipients, already_tracked) = {
        let mut uow = store.begin().await?;
        let recipients = uow
            .confirmed_subscribers()
            .await
            .context("Failed to load confirmed subscribers")?;
        let tracked = uow.tracked_subscribers(campaign.id).await?;
        (recipients, tracked)
    };

    let mut report = DispatchReport {
        campaign_id: campaign.id,
        total: recipients.len(),
        succeeded: 0,
        failed: 0,
        skipped: 0,
    };

    for subscriber in &recipients {
        if already_tracked.contains(&subscriber.id) {
            report.skipped += 1;
            continue;
        }

        if deliver(mailer, settings, campaign, subscriber).await {
            report.succeeded += 1;
        } else {
            report.failed += 1;
        }

        let sent_at = Utc::now();
        let mut uow = store.begin().await?;
        uow.insert_tracking(campaign.id, subscriber.id, sent_at)
            .await
            .context("Failed to record a campaign send")?;
        uow.set_last_email_sent(subscriber.id, sent_at).await?;
        uow.commit().await?;

        if settings.delivery_enabled {
            tokio::time::sleep(settings.send_delay()).await;
        }
    }

    let mut uow = store.begin().await?;
    uow.set_campaign_status(campaign.id, CampaignStatus::Completed)
        .await?;
    uow.commit()
        .await
        .context("Failed to mark the campaign as completed")?;
    Ok(report)
}

/// `true` when the email was handed to the transport, or would have been in a dry run.
async fn deliver(
    mailer: &Mailer,
    settings: &CampaignSettings,
    campaign: &Campaign,
    subscriber: &Subscriber,
) -> bool {
    if !settings.delivery_enabled {
        tracing::info!(
            subscriber_id = %subscriber.id,
            subject = %campaign.subject,
            "Delivery disabled, would send campaign email"
        );
        return true;
    }
    match mailer.send_campaign(campaign, subscriber).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                subscriber_id = %subscriber.id,
                "Failed to send campaign email"
            );
            false
        }
    }
}

async fn reschedule(store: &dyn Store, campaign_id: Uuid) -> Result<(), anyhow::Error> {
    let mut uow = store.begin().await?;
    uow.set_campaign_status(campaign_id, CampaignStatus::Scheduled)
        .await?;
    uow.commit().await?;
    Ok(())
}

/// Runs [`dispatch_due_campaign`] until the process stops: immediately again after a
/// completed campaign, after `poll_interval` when nothing is due, after one second on errors.
pub struct CampaignDispatchWorker {
    settings: CampaignSettings,
    store: Arc<dyn Store>,
    mailer: Arc<Mailer>,
}

impl CampaignDispatchWorker {
    pub fn builder(settings: CampaignSettings, store: Arc<dyn Store>, mailer: Arc<Mailer>) -> Self {
        Self {
            settings,
            store,
            mailer,
        }
    }

    pub async fn run_until_terminated(self) -> Result<(), std::io::Error> {
        worker_loop(self.store, self.mailer, self.settings).await;
        Ok(())
    }
}

async fn worker_loop(store: Arc<dyn Store>, mailer: Arc<Mailer>, settings: CampaignSettings) {
    loop {
        match dispatch_due_campaign(store.as_ref(), &mailer, &settings, Utc::now()).await {
            Ok(DispatchOutcome::NoCampaignDue) => {
                tokio::time::sleep(settings.poll_interval()).await
            }
            Ok(DispatchOutcome::Completed(_)) => {}
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Campaign dispatch failed"
                );
                tokio::time::sleep(Duration::from_secs(1)).await
            }
        }
    }
}
