use actix_web::{web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use crate::error::MatchError;
use crate::models::{
    FindMatchesRequest, HealthResponse, LikeResponse, ListMatchesResponse, MatchActionRequest,
    PassResponse, UserQuery,
};
use crate::routes::AppState;

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/find", web::post().to(find_matches))
        .route("/matches", web::get().to(list_matches))
        .route("/matches/{match_id}/like", web::post().to(like_match))
        .route("/matches/{match_id}/pass", web::post().to(pass_match));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let healthy = match state.store.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Storage health check failed: {}", e);
            false
        }
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Find matches endpoint
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "limit": 10
/// }
/// ```
async fn find_matches(
    state: web::Data<AppState>,
    req: web::Json<FindMatchesRequest>,
) -> Result<HttpResponse, MatchError> {
    req.validate()?;

    tracing::info!("Finding matches for user: {}, limit: {:?}", req.user_id, req.limit);

    let response = state
        .matches
        .find_matches(&req.user_id, req.limit.map(usize::from))
        .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Active matches for a user
///
/// GET /api/v1/matches?userId={userId}
async fn list_matches(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, MatchError> {
    query.validate()?;

    let matches = state.matches.list_active(&query.user_id).await?;
    Ok(HttpResponse::Ok().json(ListMatchesResponse { matches }))
}

/// POST /api/v1/matches/{matchId}/like
async fn like_match(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<MatchActionRequest>,
) -> Result<HttpResponse, MatchError> {
    req.validate()?;

    let outcome = state.matches.like(path.into_inner(), &req.user_id).await?;
    Ok(HttpResponse::Ok().json(LikeResponse {
        mutual: outcome.became_mutual,
        record: outcome.record,
    }))
}

/// POST /api/v1/matches/{matchId}/pass
async fn pass_match(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<MatchActionRequest>,
) -> Result<HttpResponse, MatchError> {
    req.validate()?;

    let record = state.matches.pass(path.into_inner(), &req.user_id).await?;
    Ok(HttpResponse::Ok().json(PassResponse {
        success: true,
        record,
    }))
}
