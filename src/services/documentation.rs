use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the venue queue service.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::view::get_view,
        crate::routes::view::stats,
        crate::routes::admin::get_mode,
        crate::routes::admin::set_mode,
        crate::routes::queue::get_queue,
        crate::routes::queue::refresh_queue,
        crate::routes::queue::dismiss_alert,
        crate::routes::queue::add_player,
        crate::routes::queue::add_placeholder,
        crate::routes::queue::rename_player,
        crate::routes::queue::remove_player,
        crate::routes::matches::get_match,
        crate::routes::matches::start_match,
        crate::routes::matches::end_match,
        crate::routes::matches::submit_result,
        crate::routes::matches::close_match,
        crate::routes::matches::set_match_type,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::MatchTickEvent,
            crate::dto::sse::AlertEvent,
            crate::dao::models::MatchType,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "view", description = "Front-desk page configuration"),
        (name = "admin", description = "Admin mode toggle"),
        (name = "queue", description = "Waiting queue of the venue"),
        (name = "match", description = "Match in progress and result submission"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/sse/public",
            "/view",
            "/stats",
            "/admin/mode",
            "/queue",
            "/queue/refresh",
            "/queue/alert",
            "/queue/players",
            "/queue/placeholder",
            "/queue/players/{id}",
            "/match",
            "/match/start",
            "/match/end",
            "/match/result",
            "/match/close",
            "/match/type",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
