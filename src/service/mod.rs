pub mod classification;
pub mod export;
pub mod extraction;
pub mod intake;
pub mod requests;

pub use classification::{ClassificationInput, CommodityClassifier};
pub use extraction::OfferExtractor;
pub use intake::{IntakeDraft, OfferIntake};
pub use requests::RequestService;
