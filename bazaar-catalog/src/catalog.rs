use async_trait::async_trait;
use bazaar_core::db::get_connection;
use bazaar_core::{
    Ad, AdFields, Collection, DbConnection, DbPool, MarketResult, NewOffer, NewUserActivity, Offer, UserActivity,
};
use std::sync::Arc;
use tracing;

use crate::ad_view::{self, AdListing, AdView};
use crate::listing::{self, ListingScope};
use crate::mutation;
use crate::navigation::{self, BrowseStep, BrowsedAd};

/// Every read and write the HTTP surface performs. Each call runs exactly
/// one statement against the store.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    /// All collections, newest first.
    async fn list_collections(&self) -> MarketResult<Vec<Collection>>;

    async fn list_ads_by_owner(&self, seller_id: i64) -> MarketResult<Vec<AdListing>>;

    async fn list_ads_by_collection(&self, collection_id: i64) -> MarketResult<Vec<AdListing>>;

    /// One ad with its offers, and whether `viewer_id` liked it.
    async fn ad_detail(&self, ad_id: i64, viewer_id: i64) -> MarketResult<AdView>;

    async fn browse(&self, collection_id: i64, step: BrowseStep, viewer_id: Option<i64>) -> MarketResult<BrowsedAd>;

    async fn create_ad(&self, fields: AdFields) -> MarketResult<Ad>;

    async fn update_ad(&self, ad_id: i64, fields: AdFields) -> MarketResult<Ad>;

    async fn create_offer(&self, offer: NewOffer) -> MarketResult<Offer>;

    async fn update_offer_status(&self, offer_id: i64, status: String) -> MarketResult<Offer>;

    async fn record_interaction(&self, activity: NewUserActivity) -> MarketResult<UserActivity>;
}

/// [`Catalog`] backed by the Postgres pool.
#[derive(Clone)]
pub struct PgCatalog {
    pool: Arc<DbPool>,
}

impl PgCatalog {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> MarketResult<DbConnection> {
        get_connection(&self.pool).await
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn list_collections(&self) -> MarketResult<Vec<Collection>> {
        let mut conn = self.conn().await?;
        listing::list_collections(&mut conn).await
    }

    async fn list_ads_by_owner(&self, seller_id: i64) -> MarketResult<Vec<AdListing>> {
        let mut conn = self.conn().await?;
        listing::list_active_ads(&mut conn, ListingScope::Seller(seller_id)).await
    }

    async fn list_ads_by_collection(&self, collection_id: i64) -> MarketResult<Vec<AdListing>> {
        let mut conn = self.conn().await?;
        listing::list_active_ads(&mut conn, ListingScope::Collection(collection_id)).await
    }

    async fn ad_detail(&self, ad_id: i64, viewer_id: i64) -> MarketResult<AdView> {
        let mut conn = self.conn().await?;
        ad_view::ad_detail(&mut conn, ad_id, viewer_id).await
    }

    async fn browse(&self, collection_id: i64, step: BrowseStep, viewer_id: Option<i64>) -> MarketResult<BrowsedAd> {
        tracing::debug!("Browsing collection {} ({:?})", collection_id, step);
        let mut conn = self.conn().await?;
        navigation::browse(&mut conn, collection_id, step, viewer_id).await
    }

    async fn create_ad(&self, fields: AdFields) -> MarketResult<Ad> {
        let mut conn = self.conn().await?;
        let ad = mutation::insert_ad(&mut conn, &fields).await?;
        tracing::info!("Created ad {} in collection {}", ad.id, ad.collection_id);
        Ok(ad)
    }

    async fn update_ad(&self, ad_id: i64, fields: AdFields) -> MarketResult<Ad> {
        let mut conn = self.conn().await?;
        let ad = mutation::update_ad(&mut conn, ad_id, &fields).await?;
        tracing::info!("Updated ad {}", ad.id);
        Ok(ad)
    }

    async fn create_offer(&self, offer: NewOffer) -> MarketResult<Offer> {
        let mut conn = self.conn().await?;
        let offer = mutation::insert_offer(&mut conn, &offer).await?;
        tracing::info!(
            "Created {} offer {} on ad {}",
            offer.offer_type,
            offer.id,
            offer.target_ads_id
        );
        Ok(offer)
    }

    async fn update_offer_status(&self, offer_id: i64, status: String) -> MarketResult<Offer> {
        let mut conn = self.conn().await?;
        let offer = mutation::update_offer_status(&mut conn, offer_id, &status).await?;
        tracing::info!("Offer {} is now {}", offer.id, offer.status);
        Ok(offer)
    }

    async fn record_interaction(&self, activity: NewUserActivity) -> MarketResult<UserActivity> {
        let mut conn = self.conn().await?;
        let activity = mutation::insert_user_activity(&mut conn, &activity).await?;
        tracing::debug!(
            "Recorded {} by user {} on ad {}",
            activity.action_type,
            activity.user_id,
            activity.ads_id
        );
        Ok(activity)
    }
}
