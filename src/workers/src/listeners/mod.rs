//! Scope invalidation listeners
//!
//! Each listener watches domain events from the service that owns a resource
//! kind and drops the affected tenant's cached scope, so the next access check
//! refetches it.

mod hub;
mod seller;

pub use hub::{HubEvent, HubInvalidationListener, HUB_UPDATE_EVENT};
pub use seller::{
    SellerEvent, SellerInvalidationListener, SELLER_CREATE_EVENT, SELLER_INACTIVE_EVENT,
    SELLER_UPDATE_EVENT,
};
