use axum::{extract::Extension, response::Json};
use bazaar_catalog::{
    AdListing, AdRequest, AdView, BrowseStep, BrowsedAd, Catalog, InteractionRequest, OfferRequest,
    OfferStatusRequest,
};
use bazaar_core::{Ad, Collection, Offer, UserActivity};
use serde::Deserialize;
use std::sync::Arc;

use crate::response::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse};

/// Shared by every handler through an `Extension` layer.
#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<dyn Catalog>,
}

type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "bazaar-api"
    }))
}

pub async fn list_collections(Extension(state): Extension<ApiState>) -> ApiResult<Vec<Collection>> {
    let collections = state.catalog.list_collections().await?;
    Ok(ApiResponse::ok(collections))
}

pub async fn list_ads_by_owner(
    Extension(state): Extension<ApiState>,
    ApiPath(owner_id): ApiPath<i64>,
) -> ApiResult<Vec<AdListing>> {
    let ads = state.catalog.list_ads_by_owner(owner_id).await?;
    Ok(ApiResponse::ok(ads))
}

pub async fn list_ads_by_collection(
    Extension(state): Extension<ApiState>,
    ApiPath(collection_id): ApiPath<i64>,
) -> ApiResult<Vec<AdListing>> {
    let ads = state.catalog.list_ads_by_collection(collection_id).await?;
    Ok(ApiResponse::ok(ads))
}

pub async fn get_ad_detail(
    Extension(state): Extension<ApiState>,
    ApiPath((ad_id, current_user_id)): ApiPath<(i64, i64)>,
) -> ApiResult<AdView> {
    let view = state.catalog.ad_detail(ad_id, current_user_id).await?;
    Ok(ApiResponse::ok(view))
}

/// Optional viewer for the `is_like` flag while browsing.
#[derive(Debug, Default, Deserialize)]
pub struct ViewerQuery {
    pub user_id: Option<i64>,
}

pub async fn first_ad(
    Extension(state): Extension<ApiState>,
    ApiPath(collection_id): ApiPath<i64>,
    ApiQuery(viewer): ApiQuery<ViewerQuery>,
) -> ApiResult<BrowsedAd> {
    browse(&state, collection_id, BrowseStep::First, viewer).await
}

pub async fn next_ad(
    Extension(state): Extension<ApiState>,
    ApiPath((collection_id, position)): ApiPath<(i64, i64)>,
    ApiQuery(viewer): ApiQuery<ViewerQuery>,
) -> ApiResult<BrowsedAd> {
    browse(&state, collection_id, BrowseStep::Next(position), viewer).await
}

pub async fn previous_ad(
    Extension(state): Extension<ApiState>,
    ApiPath((collection_id, position)): ApiPath<(i64, i64)>,
    ApiQuery(viewer): ApiQuery<ViewerQuery>,
) -> ApiResult<BrowsedAd> {
    browse(&state, collection_id, BrowseStep::Previous(position), viewer).await
}

async fn browse(state: &ApiState, collection_id: i64, step: BrowseStep, viewer: ViewerQuery) -> ApiResult<BrowsedAd> {
    let ad = state.catalog.browse(collection_id, step, viewer.user_id).await?;
    Ok(ApiResponse::ok(ad))
}

pub async fn create_ad(Extension(state): Extension<ApiState>, ApiJson(body): ApiJson<AdRequest>) -> ApiResult<Ad> {
    let fields = body.validate()?;
    let ad = state.catalog.create_ad(fields).await?;
    Ok(ApiResponse::created(ad))
}

pub async fn update_ad(
    Extension(state): Extension<ApiState>,
    ApiPath(ads_id): ApiPath<i64>,
    ApiJson(body): ApiJson<AdRequest>,
) -> ApiResult<Ad> {
    let fields = body.validate()?;
    let ad = state.catalog.update_ad(ads_id, fields).await?;
    Ok(ApiResponse::ok(ad))
}

pub async fn record_user_interaction(
    Extension(state): Extension<ApiState>,
    ApiJson(body): ApiJson<InteractionRequest>,
) -> ApiResult<UserActivity> {
    let activity = body.validate()?;
    let activity = state.catalog.record_interaction(activity).await?;
    Ok(ApiResponse::created(activity))
}

pub async fn create_offer(
    Extension(state): Extension<ApiState>,
    ApiJson(body): ApiJson<OfferRequest>,
) -> ApiResult<Offer> {
    let offer = body.validate()?;
    let offer = state.catalog.create_offer(offer).await?;
    Ok(ApiResponse::created(offer))
}

pub async fn create_cash_offer(
    Extension(state): Extension<ApiState>,
    ApiJson(body): ApiJson<OfferRequest>,
) -> ApiResult<Offer> {
    let offer = body.validate_cash()?;
    let offer = state.catalog.create_offer(offer).await?;
    Ok(ApiResponse::created(offer))
}

pub async fn create_goods_offer(
    Extension(state): Extension<ApiState>,
    ApiJson(body): ApiJson<OfferRequest>,
) -> ApiResult<Offer> {
    let offer = body.validate_goods()?;
    let offer = state.catalog.create_offer(offer).await?;
    Ok(ApiResponse::created(offer))
}

pub async fn update_offer_status(
    Extension(state): Extension<ApiState>,
    ApiJson(body): ApiJson<OfferStatusRequest>,
) -> ApiResult<Offer> {
    let (offer_id, status) = body.validate()?;
    let offer = state.catalog.update_offer_status(offer_id, status).await?;
    Ok(ApiResponse::ok(offer))
}

pub async fn route_not_found() -> ApiError {
    ApiError::new(axum::http::StatusCode::NOT_FOUND, "Route not found")
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::new(axum::http::StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}
