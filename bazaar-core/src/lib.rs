pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod schema;
pub mod tls;
pub mod types;

pub use config::Config;
pub use context::MarketContext;
pub use db::{DbConnection, DbPool};
pub use error::{MarketError, MarketResult};
pub use types::{Ad, AdFields, Collection, ImageUrls, NewOffer, NewUserActivity, Offer, OfferKind, User, UserActivity};
