use bazaar_core::schema::{ads, collections, users};
use bazaar_core::types::AD_STATUS_ACTIVE;
use bazaar_core::{Ad, Collection, DbConnection, MarketResult};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::ad_view::AdListing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListingScope {
    Seller(i64),
    Collection(i64),
}

pub(crate) async fn list_collections(conn: &mut DbConnection) -> MarketResult<Vec<Collection>> {
    let rows = collections::table
        .order((collections::created_date.desc(), collections::id.desc()))
        .select(Collection::as_select())
        .load(conn)
        .await?;

    Ok(rows)
}

/// Active ads of one seller or one collection, newest first.
pub(crate) async fn list_active_ads(conn: &mut DbConnection, scope: ListingScope) -> MarketResult<Vec<AdListing>> {
    let query = ads::table
        .inner_join(users::table)
        .inner_join(collections::table)
        .filter(ads::status.eq(AD_STATUS_ACTIVE))
        .order((ads::created_date.desc(), ads::id.desc()))
        .select((Ad::as_select(), users::name, collections::name))
        .into_boxed();

    let query = match scope {
        ListingScope::Seller(seller_id) => query.filter(ads::seller_id.eq(seller_id)),
        ListingScope::Collection(collection_id) => query.filter(ads::collection_id.eq(collection_id)),
    };

    let rows: Vec<(Ad, String, String)> = query.load(conn).await?;

    Ok(rows
        .into_iter()
        .map(|(ad, seller_name, collection_name)| AdListing {
            ad,
            seller_name,
            collection_name,
        })
        .collect())
}
