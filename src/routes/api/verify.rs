use crate::routes::api::AdminBearer;
use actix_web::HttpResponse;

pub async fn verify_token(_: AdminBearer) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "success": true }))
}
