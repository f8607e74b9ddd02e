//! Typed calls for the directory resources under `/afghan/`.

use serde::Serialize;
use tracing::debug;

use crate::models::{
    Business, BusinessQuery, Category, DirectoryFilters, Event, NewBusiness, NewEvent, NewUser,
    Page, Province, User,
};

use super::{ApiClient, ApiError};

const USERS_PATH: &str = "/afghan/user/";
const BUSINESSES_PATH: &str = "/afghan/business/";
const EVENTS_PATH: &str = "/afghan/event/";
const CATEGORIES_PATH: &str = "/afghan/category/";
const PROVINCES_PATH: &str = "/afghan/province/";

#[derive(Serialize)]
struct ActivePatch {
    is_active: bool,
}

impl ApiClient {
    // ===== Users =====

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get(USERS_PATH).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        debug!(username = %user.username, "Creating user");
        self.post(USERS_PATH, user).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("{}{}/", USERS_PATH, id)).await
    }

    /// Enable or disable an account
    pub async fn set_user_active(&self, id: i64, active: bool) -> Result<User, ApiError> {
        self.patch(&format!("{}{}/", USERS_PATH, id), &ActivePatch { is_active: active })
            .await
    }

    // ===== Categories & provinces =====

    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get(CATEGORIES_PATH).await
    }

    pub async fn list_provinces(&self) -> Result<Vec<Province>, ApiError> {
        self.get(PROVINCES_PATH).await
    }

    /// Categories and provinces, fetched concurrently
    pub async fn fetch_directory_filters(&self) -> Result<DirectoryFilters, ApiError> {
        let (categories, provinces) =
            futures::try_join!(self.list_categories(), self.list_provinces())?;
        Ok(DirectoryFilters {
            categories,
            provinces,
        })
    }

    // ===== Businesses =====

    /// First page of businesses matching the filters
    pub async fn list_businesses(&self, query: &BusinessQuery) -> Result<Page<Business>, ApiError> {
        self.get_with_query(BUSINESSES_PATH, query.to_query_pairs())
            .await
    }

    /// Follow a `next`/`previous` link from an earlier page
    pub async fn fetch_business_page(&self, url: &str) -> Result<Page<Business>, ApiError> {
        self.get(url).await
    }

    pub async fn create_business(&self, business: &NewBusiness) -> Result<Business, ApiError> {
        let form = business.to_form().map_err(|e| match e {
            crate::models::NewBusinessError::Image(io) => ApiError::Upload(io),
            other => ApiError::InvalidForm(other.to_string()),
        })?;
        debug!(name = %business.name, "Creating business");
        self.post_form(BUSINESSES_PATH, form).await
    }

    // ===== Events =====

    pub async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        self.get(EVENTS_PATH).await
    }

    pub async fn get_event(&self, id: i64) -> Result<Event, ApiError> {
        self.get(&format!("{}{}/", EVENTS_PATH, id)).await
    }

    pub async fn create_event(&self, event: &NewEvent) -> Result<Event, ApiError> {
        let form = event.to_form()?;
        debug!(name = %event.name, "Creating event");
        self.post_form(EVENTS_PATH, form).await
    }
}
