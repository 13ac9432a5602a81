use actix_web::http::header::ContentType;
use actix_web::{post, web, HttpResponse};

use ludwigia::service::skye_v1::Skye;

/// The whole wire surface: one opaque request blob in, one opaque response blob out, one
/// request per connection. Everything else (framing, keep-alive, concurrency) belongs to
/// actix; all state access is serialized inside [Skye].
#[post("/message")]
pub async fn message(app: web::Data<Skye>, body: web::Bytes) -> HttpResponse {
    let blob = app.process(&body).await;
    HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(blob)
}
