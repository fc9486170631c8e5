use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::health::root_handler,
        crate::api::health::health_handler,
        crate::api::health::ready_handler,
    ),
    components(schemas(crate::api::health::ServiceInfo)),
    tags((name = "system", description = "Service info and probes"))
)]
struct SystemApiDoc;

/// Domain documentation plus the system endpoints
pub fn api_doc() -> utoipa::openapi::OpenApi {
    let mut doc = domain_events::ApiDoc::openapi();
    doc.merge(SystemApiDoc::openapi());
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc
}
