pub mod ad_view;
pub mod catalog;
mod listing;
mod mutation;
pub mod navigation;
pub mod requests;

pub use ad_view::{AdListing, AdView, OfferSummary};
pub use catalog::{Catalog, PgCatalog};
pub use navigation::{BrowseStep, BrowsedAd};
pub use requests::{AdRequest, InteractionRequest, OfferRequest, OfferStatusRequest};

#[cfg(any(test, feature = "testing"))]
pub use catalog::MockCatalog;
