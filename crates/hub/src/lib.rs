//! Hub-receiver loop (C6), distributor (C7), delivery bookkeeping
//! (§3.7), and filter-expression evaluation (§4.8).

mod delivery;
mod distributor;
mod error;
mod filter;
mod loop_;

pub use delivery::{DeliveryStatus, EventDelivery, RESPONSE_BODY_CAP};
pub use distributor::{Distributor, DistributorConfig};
pub use error::{DeliveryError, HubError};
pub use filter::{resolve_field, FieldValue};
pub use loop_::{HubLoopConfig, HubReceiverLoop};
