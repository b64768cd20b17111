use crate::authentication::AdminUser;
use crate::domain::{Campaign, NewCampaign};
use crate::storage::Store;
use crate::utils::{e500, see_other};
use actix_web::{web, HttpResponse};
use actix_web_flash_messages::FlashMessage;
use chrono::Utc;
use uuid::Uuid;

#[derive(serde::Deserialize)]
pub struct CampaignForm {
    #[serde(default)]
    campaign_name: String,
    #[serde(default)]
    campaign_subject: String,
    #[serde(default)]
    campaign_content: String,
    scheduled_date: Option<String>,
    scheduled_time: Option<String>,
}

#[tracing::instrument(
    name = "Create an email campaign",
    skip(form, store, admin),
    fields(username = %*admin, campaign_name = %form.campaign_name)
)]
pub async fn create_campaign(
    web::Form(form): web::Form<CampaignForm>,
    store: web::Data<dyn Store>,
    admin: web::ReqData<AdminUser>,
) -> Result<HttpResponse, actix_web::Error> {
    let new_campaign = match NewCampaign::parse(
        form.campaign_name,
        form.campaign_subject,
        form.campaign_content,
        form.scheduled_date,
        form.scheduled_time,
    ) {
        Ok(campaign) => campaign,
        Err(e) => {
            FlashMessage::error(e).send();
            return Ok(see_other("/admin/campaigns"));
        }
    };

    let campaign = Campaign {
        id: Uuid::new_v4(),
        status: new_campaign.initial_status(),
        name: new_campaign.name,
        subject: new_campaign.subject,
        content: new_campaign.content,
        created_at: Utc::now(),
        scheduled_for: new_campaign.scheduled_for,
        sent_date: None,
    };

    let mut uow = store.begin().await.map_err(e500)?;
    uow.insert_campaign(&campaign).await.map_err(e500)?;
    uow.commit().await.map_err(e500)?;
    tracing::info!(campaign_id = %campaign.id, status = campaign.status.as_ref(), "Campaign saved");

    FlashMessage::info("Campaign created successfully!").send();
    Ok(see_other("/admin/campaigns"))
}
