use crate::routes::api::{AdminBearer, ApiError};
use crate::storage::Store;
use crate::subscriptions::registry;
use actix_web::{web, HttpResponse};
use anyhow::Context;

#[tracing::instrument(name = "List subscribers", skip_all)]
pub async fn list_subscribers(
    _: AdminBearer,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, ApiError> {
    let mut uow = store.begin().await.context("Failed to open a unit of work")?;
    let subscribers = registry::list(uow.as_mut())
        .await
        .context("Failed to list subscribers")?;
    Ok(HttpResponse::Ok().json(subscribers))
}
