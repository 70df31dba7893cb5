// HTTP surface
use actix_multipart::Multipart;
use actix_web::{get, web, Error, HttpResponse};
use serde_json::json;

use crate::app_state::AppState;
use crate::service::{layout_service, upload_service};

async fn upload(payload: Multipart, app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    upload_service(payload, app_state).await
}

async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().body("Method Not Allowed")
}

#[get("/api/layout")]
pub async fn layout(app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    layout_service(app_state).await
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Register every route of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/upload")
            .route(web::post().to(upload))
            .default_service(web::to(method_not_allowed)),
    )
    .service(layout)
    .service(health);
}
