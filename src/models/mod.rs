pub mod commodity;
pub mod offer;
pub mod request;
pub mod status;

pub use commodity::{CommodityGroup, COMMODITY_GROUPS, MISCELLANEOUS_GROUP_ID};
pub use offer::{ClassificationResult, CoercedField, DraftOrderLine, ExtractedOffer};
pub use request::{
    NewRequest, OrderLine, OrderLineInput, ProcurementRequest, RequestFilter, RequestUpdate,
    SourceDocument,
};
pub use status::{RequestStatus, StatusChange, StatusHistoryEntry};
