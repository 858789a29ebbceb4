#[utoipa::path(
    get,
    path = "/api/healthz",
    responses((status = 200, description = "Service is up", body = String)),
    tag = "health"
)]
pub async fn healthz() -> &'static str {
    "OK"
}
