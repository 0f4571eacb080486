//! Domain Models
//!
//! Records the marketplace keeps in its record store, plus the per-request
//! webhook envelope. Records use string ids and snake_case field names to
//! match the dashboard's tables.

pub mod webhook;
pub mod affiliate_link;
pub mod product;
pub mod store_owner;
pub mod order;
pub mod sale;

pub use webhook::*;
pub use affiliate_link::*;
pub use product::*;
pub use store_owner::*;
pub use order::*;
pub use sale::*;
