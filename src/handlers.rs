use crate::errors::AppError;
use crate::models::{
    EnableRequest, GlobalAggregate, MarkResponse, PromptResponse, RecordResponse, ResetResponse,
    SettingsUpdate, SiteConfig, StatusResponse, SyncPullResponse, SyncPushResponse, UserSettings,
};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use std::collections::BTreeMap;

pub async fn mark_streak(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<MarkResponse>, AppError> {
    let domain = normalize_domain(&domain)?;
    let response = state.engine.mark(&domain).await?;
    Ok(Json(response))
}

pub async fn get_record(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<RecordResponse>, AppError> {
    let domain = normalize_domain(&domain)?;
    Ok(Json(state.engine.record(&domain).await))
}

pub async fn get_status(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    let domain = normalize_domain(&domain)?;
    Ok(Json(state.engine.status(&domain).await))
}

pub async fn get_prompt(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<PromptResponse>, AppError> {
    let domain = normalize_domain(&domain)?;
    let should_prompt = state.engine.prompt(&domain).await;
    Ok(Json(PromptResponse { should_prompt }))
}

pub async fn set_site_enabled(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Json(request): Json<EnableRequest>,
) -> Result<Json<SiteConfig>, AppError> {
    let domain = normalize_domain(&domain)?;
    let config = state.engine.set_enabled(&domain, request.enabled).await?;
    Ok(Json(config))
}

pub async fn list_sites(State(state): State<AppState>) -> Json<BTreeMap<String, SiteConfig>> {
    Json(state.engine.list_configs().await)
}

pub async fn get_aggregate(State(state): State<AppState>) -> Json<GlobalAggregate> {
    Json(state.engine.aggregate().await)
}

pub async fn get_settings(State(state): State<AppState>) -> Json<UserSettings> {
    Json(state.engine.settings().await)
}

pub async fn put_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<UserSettings>, AppError> {
    let settings = state.engine.update_settings(update).await?;
    Ok(Json(settings))
}

pub async fn push_sync(State(state): State<AppState>) -> Json<SyncPushResponse> {
    let queued = state.engine.push_remote();
    Json(SyncPushResponse { queued })
}

pub async fn pull_sync(State(state): State<AppState>) -> Result<Json<SyncPullResponse>, AppError> {
    let pulled = state.engine.pull_remote().await?;
    Ok(Json(SyncPullResponse { pulled }))
}

pub async fn reset_all(State(state): State<AppState>) -> Result<Json<ResetResponse>, AppError> {
    state.engine.reset_all().await?;
    Ok(Json(ResetResponse { reset: true }))
}

fn normalize_domain(raw: &str) -> Result<String, AppError> {
    let domain = raw.trim().to_ascii_lowercase();
    let domain = domain.strip_prefix("www.").unwrap_or(&domain);
    if domain.is_empty()
        || domain
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | ':' | '@'))
    {
        return Err(AppError::bad_request(format!("invalid domain: {raw:?}")));
    }
    Ok(domain.to_string())
}

#[cfg(test)]
mod tests {
    use super::normalize_domain;

    #[test]
    fn domains_are_normalized() {
        assert_eq!(
            normalize_domain(" WWW.Example.COM ").unwrap(),
            "example.com"
        );
        assert_eq!(
            normalize_domain("news.ycombinator.com").unwrap(),
            "news.ycombinator.com"
        );
    }

    #[test]
    fn malformed_domains_are_rejected() {
        for raw in ["", "   ", "www.", "a b.com", "http://a.com", "a.com/path", "me@a.com"] {
            assert!(normalize_domain(raw).is_err(), "{raw:?} should be rejected");
        }
    }
}
