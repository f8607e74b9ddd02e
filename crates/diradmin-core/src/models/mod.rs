//! Data models for directory entities.
//!
//! - `User`, `UserProfile`: admin accounts and the logged-in profile
//! - `Business`, `Page`: directory listings and paginated responses
//! - `Event`: community events and their list filters
//! - `Category`, `Province`: filter choices for the business directory

pub mod business;
pub mod catalog;
pub mod event;
pub mod user;

pub use business::{Business, BusinessQuery, NewBusiness, NewBusinessError, Page};
pub use catalog::{Category, DirectoryFilters, Province};
pub use event::{filter_events, Event, EventWindow, NewEvent};
pub use user::{filter_users, NewUser, User, UserProfile, UserStatusFilter};
