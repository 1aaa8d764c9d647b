use bazaar_core::schema::{ads, offers, user_activities};
use bazaar_core::{
    Ad, AdFields, DbConnection, MarketError, MarketResult, NewOffer, NewUserActivity, Offer, UserActivity,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

pub(crate) async fn insert_ad(conn: &mut DbConnection, fields: &AdFields) -> MarketResult<Ad> {
    let ad = diesel::insert_into(ads::table)
        .values((fields, ads::created_date.eq(Utc::now())))
        .returning(Ad::as_returning())
        .get_result(conn)
        .await?;

    Ok(ad)
}

/// Replace every mutable column of an existing ad.
pub(crate) async fn update_ad(conn: &mut DbConnection, ad_id: i64, fields: &AdFields) -> MarketResult<Ad> {
    diesel::update(ads::table.find(ad_id))
        .set(fields)
        .returning(Ad::as_returning())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| MarketError::not_found("Ads not found"))
}

pub(crate) async fn insert_offer(conn: &mut DbConnection, offer: &NewOffer) -> MarketResult<Offer> {
    let offer = diesel::insert_into(offers::table)
        .values((offer, offers::created_date.eq(Utc::now())))
        .returning(Offer::as_returning())
        .get_result(conn)
        .await?;

    Ok(offer)
}

pub(crate) async fn update_offer_status(conn: &mut DbConnection, offer_id: i64, status: &str) -> MarketResult<Offer> {
    diesel::update(offers::table.find(offer_id))
        .set(offers::status.eq(status))
        .returning(Offer::as_returning())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| MarketError::not_found("Offer not found"))
}

pub(crate) async fn insert_user_activity(
    conn: &mut DbConnection,
    activity: &NewUserActivity,
) -> MarketResult<UserActivity> {
    let activity = diesel::insert_into(user_activities::table)
        .values((activity, user_activities::created_date.eq(Utc::now())))
        .returning(UserActivity::as_returning())
        .get_result(conn)
        .await?;

    Ok(activity)
}
