use actix_web::HttpResponse;

/// `GET /health_check`
///
/// Used by the hosting platform; never touches the content store.
pub async fn health_check() -> HttpResponse { HttpResponse::Ok().finish() }
