use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Caption Clash Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::round::get_round,
        crate::routes::round::submit_caption,
        crate::routes::round::vote_caption,
        crate::routes::round::next_round,
        crate::routes::leaderboard::get_leaderboard,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::phase::VisiblePhase,
            crate::dto::round::CaptionView,
            crate::dto::round::RoundView,
            crate::dto::round::RoundResponse,
            crate::dto::round::RoundAction,
            crate::dto::round::RoundActionResponse,
            crate::dto::round::CaptionRequest,
            crate::dto::round::VoteRequest,
            crate::dto::leaderboard::LeaderboardEntryView,
            crate::dto::leaderboard::LeaderboardResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "round", description = "Round lifecycle: captions, votes and phase changes"),
        (name = "leaderboard", description = "Cumulative wins per player"),
    )
)]
pub struct ApiDoc;
