//! Request payloads and their required-field validation.
//!
//! Every field arrives optional; a field that is absent or falsy (blank
//! string, empty image list, zero) is reported back by its JSON name before
//! anything touches the store.

use bazaar_core::{AdFields, ImageUrls, MarketError, MarketResult, NewOffer, NewUserActivity, OfferKind};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ad_type: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<ImageUrls>,
    pub seller_id: Option<i64>,
    pub location_distance: Option<f64>,
    pub status: Option<String>,
    pub collection_id: Option<i64>,
}

impl AdRequest {
    pub fn validate(self) -> MarketResult<AdFields> {
        if self.image_url.as_ref().is_some_and(ImageUrls::contains_separator) {
            return Err(MarketError::validation("image_url entries must not contain ','"));
        }

        let mut check = RequiredFields::default();
        let fields = AdFields {
            name: check.take("name", self.name),
            ad_type: check.take("type", self.ad_type),
            short_description: check.take("short_description", self.short_description),
            description: check.take("description", self.description),
            image_url: check.take("image_url", self.image_url),
            seller_id: check.take("seller_id", self.seller_id),
            location_distance: check.take("location_distance", self.location_distance),
            status: check.take("status", self.status),
            collection_id: check.take("collection_id", self.collection_id),
        };
        check.finish(fields)
    }
}

/// Body shared by the generic, cash and goods offer endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfferRequest {
    #[serde(rename = "type")]
    pub offer_type: Option<OfferKind>,
    pub price: Option<i64>,
    pub source_ads_id: Option<i64>,
    pub target_ads_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub status: Option<String>,
}

impl OfferRequest {
    /// Dispatches on `type`; offers without one are barters of a source ad.
    pub fn validate(self) -> MarketResult<NewOffer> {
        match self.offer_type.unwrap_or(OfferKind::Goods) {
            OfferKind::Cash => self.validate_cash(),
            OfferKind::Goods => self.validate_goods(),
        }
    }

    pub fn validate_cash(self) -> MarketResult<NewOffer> {
        let mut check = RequiredFields::default();
        let offer = NewOffer {
            offer_type: OfferKind::Cash,
            price: Some(check.take("price", self.price)),
            source_ads_id: None,
            target_ads_id: check.take("target_ads_id", self.target_ads_id),
            owner_id: check.take("owner_id", self.owner_id),
            status: check.take("status", self.status),
        };
        check.finish(offer)
    }

    pub fn validate_goods(self) -> MarketResult<NewOffer> {
        let mut check = RequiredFields::default();
        let offer = NewOffer {
            offer_type: OfferKind::Goods,
            price: None,
            source_ads_id: Some(check.take("source_ads_id", self.source_ads_id)),
            target_ads_id: check.take("target_ads_id", self.target_ads_id),
            owner_id: check.take("owner_id", self.owner_id),
            status: check.take("status", self.status),
        };
        check.finish(offer)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfferStatusRequest {
    #[serde(alias = "OfferId")]
    pub offer_id: Option<i64>,
    #[serde(alias = "Status")]
    pub status: Option<String>,
}

impl OfferStatusRequest {
    pub fn validate(self) -> MarketResult<(i64, String)> {
        let mut check = RequiredFields::default();
        let offer_id = check.take("offer_id", self.offer_id);
        let status = check.take("status", self.status);
        check.finish((offer_id, status))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionRequest {
    #[serde(alias = "UserId")]
    pub user_id: Option<i64>,
    #[serde(alias = "AdsId")]
    pub ads_id: Option<i64>,
    #[serde(alias = "ActionType")]
    pub action_type: Option<String>,
}

impl InteractionRequest {
    pub fn validate(self) -> MarketResult<NewUserActivity> {
        let mut check = RequiredFields::default();
        let activity = NewUserActivity {
            user_id: check.take("user_id", self.user_id),
            ads_id: check.take("ads_id", self.ads_id),
            action_type: check.take("action_type", self.action_type),
        };
        check.finish(activity)
    }
}

/// Values that count as "not provided" even when present.
trait Falsy {
    fn is_falsy(&self) -> bool;
}

impl Falsy for String {
    fn is_falsy(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Falsy for i64 {
    fn is_falsy(&self) -> bool {
        *self == 0
    }
}

impl Falsy for f64 {
    fn is_falsy(&self) -> bool {
        *self == 0.0 || self.is_nan()
    }
}

impl Falsy for ImageUrls {
    fn is_falsy(&self) -> bool {
        self.is_empty()
    }
}

#[derive(Default)]
struct RequiredFields {
    missing: Vec<&'static str>,
}

impl RequiredFields {
    fn take<T: Falsy + Default>(&mut self, field: &'static str, value: Option<T>) -> T {
        match value {
            Some(v) if !v.is_falsy() => v,
            _ => {
                self.missing.push(field);
                T::default()
            }
        }
    }

    fn finish<T>(self, value: T) -> MarketResult<T> {
        if self.missing.is_empty() {
            Ok(value)
        } else {
            Err(MarketError::validation(format!(
                "Missing required fields: {}",
                self.missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_ad() -> AdRequest {
        AdRequest {
            name: Some("Vintage camera".into()),
            ad_type: Some("Swap".into()),
            short_description: Some("35mm film".into()),
            description: Some("Works, light leaks fixed".into()),
            image_url: Some(ImageUrls::parse("a.jpg,b.jpg")),
            seller_id: Some(4),
            location_distance: Some(1.5),
            status: Some("Active".into()),
            collection_id: Some(2),
        }
    }

    fn message(err: MarketError) -> String {
        match err {
            MarketError::Validation(message) => message,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn complete_ad_passes() {
        let fields = full_ad().validate().unwrap();
        assert_eq!(fields.name, "Vintage camera");
        assert_eq!(fields.image_url.len(), 2);
        assert_eq!(fields.collection_id, 2);
    }

    #[test]
    fn ad_reports_every_missing_field() {
        let request = AdRequest {
            name: Some("   ".into()),
            seller_id: Some(0),
            image_url: Some(ImageUrls::default()),
            ..full_ad()
        };
        let err = message(request.validate().unwrap_err());
        assert_eq!(err, "Missing required fields: name, image_url, seller_id");
    }

    #[test]
    fn image_url_entries_with_commas_are_rejected() {
        let request = AdRequest {
            image_url: Some(ImageUrls::new(["https://cdn/w_200,h_100/a.jpg", "b.jpg"])),
            ..full_ad()
        };
        assert_eq!(
            message(request.validate().unwrap_err()),
            "image_url entries must not contain ','"
        );
    }

    #[test]
    fn empty_ad_request_lists_all_fields() {
        let err = message(AdRequest::default().validate().unwrap_err());
        assert!(err.contains("type"));
        assert!(err.contains("location_distance"));
        assert!(err.contains("collection_id"));
    }

    #[test]
    fn offer_without_status_is_rejected() {
        let request: OfferRequest = serde_json::from_value(serde_json::json!({
            "source_ads_id": 3,
            "target_ads_id": 9,
            "owner_id": 5
        }))
        .unwrap();
        assert_eq!(message(request.validate().unwrap_err()), "Missing required fields: status");
    }

    #[test]
    fn untyped_offer_is_goods() {
        let request: OfferRequest = serde_json::from_value(serde_json::json!({
            "source_ads_id": 3,
            "target_ads_id": 9,
            "owner_id": 5,
            "status": "Pending"
        }))
        .unwrap();
        let offer = request.validate().unwrap();
        assert_eq!(offer.offer_type, OfferKind::Goods);
        assert_eq!(offer.source_ads_id, Some(3));
        assert_eq!(offer.price, None);
    }

    #[test]
    fn cash_offer_needs_price_not_source() {
        let request = OfferRequest {
            offer_type: Some(OfferKind::Cash),
            source_ads_id: Some(3),
            target_ads_id: Some(9),
            owner_id: Some(5),
            status: Some("Pending".into()),
            ..Default::default()
        };
        assert_eq!(message(request.clone().validate().unwrap_err()), "Missing required fields: price");

        let offer = OfferRequest { price: Some(250), ..request }.validate_cash().unwrap();
        assert_eq!(offer.price, Some(250));
        assert_eq!(offer.source_ads_id, None);
    }

    #[test]
    fn goods_offer_ignores_price() {
        let request = OfferRequest {
            price: Some(100),
            target_ads_id: Some(9),
            owner_id: Some(5),
            status: Some("Pending".into()),
            ..Default::default()
        };
        assert_eq!(
            message(request.validate_goods().unwrap_err()),
            "Missing required fields: source_ads_id"
        );
    }

    #[test]
    fn status_update_accepts_legacy_keys() {
        let request: OfferStatusRequest =
            serde_json::from_value(serde_json::json!({ "OfferId": 12, "Status": "Accepted" })).unwrap();
        assert_eq!(request.validate().unwrap(), (12, "Accepted".to_string()));

        let missing: OfferStatusRequest = serde_json::from_value(serde_json::json!({ "offer_id": 12 })).unwrap();
        assert_eq!(message(missing.validate().unwrap_err()), "Missing required fields: status");
    }

    #[test]
    fn interaction_accepts_both_spellings() {
        let legacy: InteractionRequest = serde_json::from_value(serde_json::json!({
            "UserId": 1, "AdsId": 2, "ActionType": "like"
        }))
        .unwrap();
        let current: InteractionRequest = serde_json::from_value(serde_json::json!({
            "user_id": 1, "ads_id": 2, "action_type": "like"
        }))
        .unwrap();
        assert_eq!(legacy.validate().unwrap(), current.validate().unwrap());
    }
}
