use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::schema::{ads, collections, offers, user_activities, users};

/// Ads with this status are the only ones shown in listings.
pub const AD_STATUS_ACTIVE: &str = "Active";

/// Action type that drives the `is_like` flag.
pub const ACTION_LIKE: &str = "like";

const IMAGE_URL_SEPARATOR: char = ',';

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = collections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Collection {
    pub id: i64,
    pub name: String,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, QueryableByName, Serialize, Deserialize)]
#[diesel(table_name = ads)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Ad {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub ad_type: String,
    pub short_description: String,
    pub description: String,
    pub image_url: ImageUrls,
    pub seller_id: i64,
    pub location_distance: f64,
    pub status: String,
    pub collection_id: i64,
    pub created_date: DateTime<Utc>,
}

/// Every mutable column of an ad. Used both for inserts and full-replace updates.
#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = ads)]
pub struct AdFields {
    pub name: String,
    pub ad_type: String,
    pub short_description: String,
    pub description: String,
    pub image_url: ImageUrls,
    pub seller_id: i64,
    pub location_distance: f64,
    pub status: String,
    pub collection_id: i64,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = offers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Offer {
    pub id: i64,
    #[serde(rename = "type")]
    pub offer_type: OfferKind,
    pub price: Option<i64>,
    pub source_ads_id: Option<i64>,
    pub target_ads_id: i64,
    pub owner_id: i64,
    pub status: String,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = offers)]
pub struct NewOffer {
    pub offer_type: OfferKind,
    pub price: Option<i64>,
    pub source_ads_id: Option<i64>,
    pub target_ads_id: i64,
    pub owner_id: i64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = user_activities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserActivity {
    pub id: i64,
    pub user_id: i64,
    pub ads_id: i64,
    pub action_type: String,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = user_activities)]
pub struct NewUserActivity {
    pub user_id: i64,
    pub ads_id: i64,
    pub action_type: String,
}

/// Whether an offer pays in money or barters another ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum OfferKind {
    #[serde(alias = "cash", alias = "CASH")]
    Cash,
    #[serde(alias = "goods", alias = "GOODS")]
    Goods,
}

impl OfferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferKind::Cash => "Cash",
            OfferKind::Goods => "Goods",
        }
    }
}

impl fmt::Display for OfferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(OfferKind::Cash),
            "goods" => Ok(OfferKind::Goods),
            other => Err(format!("unknown offer type: {}", other)),
        }
    }
}

impl ToSql<Text, Pg> for OfferKind {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for OfferKind {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(raw.parse()?)
    }
}

/// Ordered image references of an ad.
///
/// Stored as one comma separated `TEXT` column, serialized as a JSON array.
/// Deserialization accepts either an array or the joined string form.
/// Entries are trimmed and blank ones dropped. An entry containing a comma
/// would split on the way back from storage, so request validation rejects
/// those (see [`ImageUrls::contains_separator`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, AsExpression, FromSqlRow, Deserialize)]
#[diesel(sql_type = Text)]
#[serde(from = "ImageUrlsRepr")]
pub struct ImageUrls(Vec<String>);

impl ImageUrls {
    /// Blank entries are dropped and the rest trimmed.
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ImageUrls(
            urls.into_iter()
                .map(Into::into)
                .map(|url: String| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect(),
        )
    }

    pub fn parse(joined: &str) -> Self {
        Self::new(joined.split(IMAGE_URL_SEPARATOR))
    }

    pub fn join(&self) -> String {
        self.0.join(&IMAGE_URL_SEPARATOR.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// True when some entry would not survive a round trip through storage.
    pub fn contains_separator(&self) -> bool {
        self.0.iter().any(|url| url.contains(IMAGE_URL_SEPARATOR))
    }
}

impl Serialize for ImageUrls {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImageUrlsRepr {
    List(Vec<String>),
    Joined(String),
}

impl From<ImageUrlsRepr> for ImageUrls {
    fn from(repr: ImageUrlsRepr) -> Self {
        match repr {
            ImageUrlsRepr::List(urls) => ImageUrls::new(urls),
            ImageUrlsRepr::Joined(joined) => ImageUrls::parse(&joined),
        }
    }
}

impl ToSql<Text, Pg> for ImageUrls {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.join().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for ImageUrls {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(ImageUrls::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_urls_split_and_trim() {
        let urls = ImageUrls::parse("https://cdn/a.jpg, https://cdn/b.jpg,,  ");
        assert_eq!(urls.as_slice(), ["https://cdn/a.jpg", "https://cdn/b.jpg"]);
        assert_eq!(urls.join(), "https://cdn/a.jpg,https://cdn/b.jpg");
    }

    #[test]
    fn image_urls_accept_string_or_array() {
        let from_string: ImageUrls = serde_json::from_str(r#""a.png,b.png""#).unwrap();
        let from_array: ImageUrls = serde_json::from_str(r#"["a.png", " b.png "]"#).unwrap();
        assert_eq!(from_string, from_array);
        assert_eq!(serde_json::to_value(&from_string).unwrap(), serde_json::json!(["a.png", "b.png"]));
    }

    #[test]
    fn only_array_entries_can_carry_the_separator() {
        let joined: ImageUrls = serde_json::from_str(r#""w_200,h_100.jpg""#).unwrap();
        assert!(!joined.contains_separator());
        assert_eq!(joined.len(), 2);

        let listed: ImageUrls = serde_json::from_str(r#"["https://cdn/w_200,h_100/a.jpg"]"#).unwrap();
        assert!(listed.contains_separator());
    }

    #[test]
    fn blank_image_urls_are_empty() {
        let urls: ImageUrls = serde_json::from_str(r#"" , ""#).unwrap();
        assert!(urls.is_empty());
    }

    #[test]
    fn offer_kind_parses_case_insensitively() {
        assert_eq!("cash".parse::<OfferKind>().unwrap(), OfferKind::Cash);
        assert_eq!(" Goods ".parse::<OfferKind>().unwrap(), OfferKind::Goods);
        assert!("barter".parse::<OfferKind>().is_err());

        let kind: OfferKind = serde_json::from_str(r#""cash""#).unwrap();
        assert_eq!(kind, OfferKind::Cash);
        assert_eq!(serde_json::to_string(&OfferKind::Goods).unwrap(), r#""Goods""#);
    }

    #[test]
    fn ad_serializes_type_field_name() {
        let ad = Ad {
            id: 7,
            name: "Road bike".into(),
            ad_type: "Sell".into(),
            short_description: "Carbon frame".into(),
            description: "Barely used".into(),
            image_url: ImageUrls::parse("a.jpg,b.jpg"),
            seller_id: 1,
            location_distance: 2.5,
            status: AD_STATUS_ACTIVE.into(),
            collection_id: 3,
            created_date: Utc::now(),
        };
        let value = serde_json::to_value(&ad).unwrap();
        assert_eq!(value["type"], "Sell");
        assert!(value.get("ad_type").is_none());
        assert_eq!(value["image_url"], serde_json::json!(["a.jpg", "b.jpg"]));
    }
}
