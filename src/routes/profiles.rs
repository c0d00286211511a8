use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::MatchError;
use crate::models::{ProfileResponse, SetActiveRequest, SubmitProfileRequest, UserQuery};
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/profile", web::post().to(submit_profile))
        .route("/profile", web::get().to(get_profile))
        .route("/profile/active", web::post().to(set_active));
}

/// Create or replace a profile, running AI analysis and embedding
///
/// POST /api/v1/profile
async fn submit_profile(
    state: web::Data<AppState>,
    req: web::Json<SubmitProfileRequest>,
) -> Result<HttpResponse, MatchError> {
    req.validate()?;

    let SubmitProfileRequest { user_id, profile } = req.into_inner();
    let saved = state.profiles.submit(&user_id, profile).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse::from(&saved)))
}

/// GET /api/v1/profile?userId={userId}
async fn get_profile(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, MatchError> {
    query.validate()?;

    let profile = state.profiles.get(&query.user_id).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(&profile)))
}

/// POST /api/v1/profile/active
async fn set_active(
    state: web::Data<AppState>,
    req: web::Json<SetActiveRequest>,
) -> Result<HttpResponse, MatchError> {
    req.validate()?;

    let profile = state.profiles.set_active(&req.user_id, req.active).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(&profile)))
}
