//! Address Book Core - Contacts and Region-Aware Storage
//!
//! This crate holds the contact model and the Contact Router, which decides
//! whether a contact's personal fields live in the region-restricted PII
//! store or in the general store, and reassembles contacts from both on read.

pub mod config;
pub mod contact;
pub mod error;
pub mod listing;
pub mod region;
pub mod router;
pub mod store;
pub mod token;

pub use config::AddressBookConfig;
pub use contact::{Contact, ContactForm, LocationRow, UserRow};
pub use error::{CoreError, Result};
pub use region::{Jurisdiction, is_private_region};
pub use router::{ContactRouter, Created, Deleted, ImportFailure, ImportReport, Placement, Updated};
pub use store::{GeneralStore, PiiStore, QueryExecutor, StoreError};
pub use token::ContactToken;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        AddressBookConfig, Contact, ContactForm, ContactRouter, ContactToken, CoreError,
        GeneralStore, PiiStore, QueryExecutor, Result, StoreError, is_private_region,
    };
}
