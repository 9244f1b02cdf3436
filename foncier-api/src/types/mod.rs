//! API Request and Response Types
//!
//! Request bodies and query strings for the registry endpoints. Responses
//! are the `foncier_core` entities themselves.

// Parcel types
mod parcel;
pub use parcel::*;

// History types
mod history;
pub use history::*;

// Note types
mod note;
pub use note::*;

// Citizen request types
mod request;
pub use request::*;

// Seed types
mod seed;
pub use seed::*;
