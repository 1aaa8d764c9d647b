//! The ad projection shared by the detail and navigation queries.
//!
//! Both code paths select `AD_VIEW_COLUMNS` from `AD_VIEW_SOURCE` and map the
//! row through [`AdViewRow`], so the response shape cannot drift between them.
//! Bind parameter `$1` is always the viewing user (nullable).

use anyhow::anyhow;
use bazaar_core::types::ACTION_LIKE;
use bazaar_core::{Ad, DbConnection, ImageUrls, MarketError, MarketResult, OfferKind};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool, Json, Nullable, Text};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};

/// Ad as shown in listings: the stored row plus seller and collection names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdListing {
    #[serde(flatten)]
    pub ad: Ad,
    pub seller_name: String,
    pub collection_name: String,
}

/// One entry of the nested `offers` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferSummary {
    pub id: i64,
    #[serde(rename = "type")]
    pub offer_type: OfferKind,
    pub price: Option<i64>,
    /// Source ad of a goods offer; null for cash offers.
    pub ads_id: Option<i64>,
    pub ads_name: Option<String>,
    pub image_url: Option<ImageUrls>,
    pub owner_name: Option<String>,
    pub created_date: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdView {
    #[serde(flatten)]
    pub listing: AdListing,
    /// True only when the viewer has a `like` activity on this ad; other
    /// action types (views, shares) do not count.
    pub is_like: bool,
    pub total_offer: i64,
    pub offers: Vec<OfferSummary>,
}

#[derive(Debug, QueryableByName)]
pub(crate) struct AdViewRow {
    #[diesel(embed)]
    ad: Ad,
    #[diesel(sql_type = Text)]
    seller_name: String,
    #[diesel(sql_type = Text)]
    collection_name: String,
    #[diesel(sql_type = Bool)]
    is_like: bool,
    #[diesel(sql_type = BigInt)]
    total_offer: i64,
    #[diesel(sql_type = Json)]
    offers: serde_json::Value,
}

impl TryFrom<AdViewRow> for AdView {
    type Error = MarketError;

    fn try_from(row: AdViewRow) -> Result<Self, Self::Error> {
        let offers: Vec<OfferSummary> = serde_json::from_value(row.offers)
            .map_err(|e| anyhow!("Malformed offers aggregate for ad {}: {}", row.ad.id, e))?;

        Ok(AdView {
            listing: AdListing {
                ad: row.ad,
                seller_name: row.seller_name,
                collection_name: row.collection_name,
            },
            is_like: row.is_like,
            total_offer: row.total_offer,
            offers,
        })
    }
}

pub(crate) const AD_VIEW_SOURCE: &str = "FROM ads a
    INNER JOIN users u ON u.id = a.seller_id
    INNER JOIN collections c ON c.id = a.collection_id";

/// Column list of the shared projection. Column names match the fields of
/// [`Ad`] and [`AdViewRow`].
pub(crate) fn ad_view_columns() -> String {
    format!(
        "a.id,
        a.name,
        a.type AS ad_type,
        a.short_description,
        a.description,
        a.image_url,
        a.seller_id,
        a.location_distance,
        a.status,
        a.collection_id,
        a.created_date,
        u.name AS seller_name,
        c.name AS collection_name,
        EXISTS (
            SELECT 1 FROM user_activities ua
            WHERE ua.ads_id = a.id AND ua.user_id = $1 AND ua.action_type = '{like}'
        ) AS is_like,
        (SELECT COUNT(*) FROM offers o WHERE o.target_ads_id = a.id) AS total_offer,
        COALESCE((
            SELECT json_agg(
                json_build_object(
                    'id', o.id,
                    'type', o.type,
                    'price', o.price,
                    'ads_id', src.id,
                    'ads_name', src.name,
                    'image_url', src.image_url,
                    'owner_name', ow.name,
                    'created_date', o.created_date,
                    'status', o.status
                )
                ORDER BY o.created_date ASC, o.id ASC
            )
            FROM offers o
            LEFT JOIN ads src ON src.id = o.source_ads_id
            LEFT JOIN users ow ON ow.id = o.owner_id
            WHERE o.target_ads_id = a.id
        ), '[]'::json) AS offers",
        like = ACTION_LIKE
    )
}

pub(crate) fn detail_sql() -> String {
    format!("SELECT {} {} WHERE a.id = $2", ad_view_columns(), AD_VIEW_SOURCE)
}

pub(crate) async fn ad_detail(conn: &mut DbConnection, ad_id: i64, viewer_id: i64) -> MarketResult<AdView> {
    let row: Option<AdViewRow> = diesel::sql_query(detail_sql())
        .bind::<Nullable<BigInt>, _>(Some(viewer_id))
        .bind::<BigInt, _>(ad_id)
        .get_result(conn)
        .await
        .optional()?;

    match row {
        Some(row) => row.try_into(),
        None => Err(MarketError::not_found("Ads not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_query_binds_viewer_then_ad() {
        let sql = detail_sql();
        assert!(sql.contains("ua.user_id = $1"));
        assert!(sql.trim_end().ends_with("WHERE a.id = $2"));
        assert!(sql.contains("ua.action_type = 'like'"));
    }

    #[test]
    fn offers_default_to_empty_array_in_stable_order() {
        let columns = ad_view_columns();
        assert!(columns.contains("'[]'::json) AS offers"));
        assert!(columns.contains("ORDER BY o.created_date ASC, o.id ASC"));
    }

    #[test]
    fn seller_name_comes_from_users() {
        assert!(ad_view_columns().contains("u.name AS seller_name"));
        assert!(AD_VIEW_SOURCE.contains("INNER JOIN users u ON u.id = a.seller_id"));
    }

    #[test]
    fn offer_aggregate_deserializes_postgres_json() {
        let raw = serde_json::json!([
            {
                "id": 11,
                "type": "Goods",
                "price": null,
                "ads_id": 4,
                "ads_name": "Guitar",
                "image_url": "g1.jpg,g2.jpg",
                "owner_name": "Linh",
                "created_date": "2024-06-01T10:15:30.123456+00:00",
                "status": "Pending"
            },
            {
                "id": 12,
                "type": "Cash",
                "price": 300,
                "ads_id": null,
                "ads_name": null,
                "image_url": null,
                "owner_name": "Minh",
                "created_date": "2024-06-02T08:00:00+07:00",
                "status": "Pending"
            }
        ]);
        let offers: Vec<OfferSummary> = serde_json::from_value(raw).unwrap();
        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0].image_url.as_ref().map(|u| u.len()), Some(2));
        assert_eq!(offers[1].offer_type, OfferKind::Cash);
        assert!(offers[1].image_url.is_none());
    }
}
