//! Business directory view state: the current page of results, its filters,
//! pagination links, the selected business and the map view, kept in step.

use tracing::debug;

use crate::api::{ApiClient, ApiError};
use crate::map::{self, MapView, DEFAULT_ZOOM};
use crate::models::{Business, BusinessQuery, Page};

#[derive(Debug, Clone, PartialEq)]
pub struct BusinessDirectory {
    pub query: BusinessQuery,
    pub businesses: Vec<Business>,
    pub count: u64,
    next: Option<String>,
    previous: Option<String>,
    selected: Option<i64>,
    zoom: u8,
    view: MapView,
}

impl Default for BusinessDirectory {
    fn default() -> Self {
        Self::new(BusinessQuery::default())
    }
}

impl BusinessDirectory {
    pub fn new(query: BusinessQuery) -> Self {
        Self {
            query,
            businesses: Vec::new(),
            count: 0,
            next: None,
            previous: None,
            selected: None,
            zoom: DEFAULT_ZOOM,
            view: MapView::default(),
        }
    }

    pub fn view(&self) -> MapView {
        self.view
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn selected(&self) -> Option<&Business> {
        let id = self.selected?;
        self.businesses.iter().find(|b| b.id == id)
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Replace the filters and reload from the first page
    pub async fn set_query(&mut self, api: &ApiClient, query: BusinessQuery) -> Result<(), ApiError> {
        self.query = query;
        self.reload(api).await
    }

    /// Fetch the first page for the current filters
    pub async fn reload(&mut self, api: &ApiClient) -> Result<(), ApiError> {
        let page = api.list_businesses(&self.query).await?;
        self.apply_page(page);
        Ok(())
    }

    /// Follow the `next` link. Returns false when there is no next page.
    pub async fn next_page(&mut self, api: &ApiClient) -> Result<bool, ApiError> {
        let Some(url) = self.next.clone() else {
            return Ok(false);
        };
        let page = api.fetch_business_page(&url).await?;
        self.apply_page(page);
        Ok(true)
    }

    /// New results clear the selection and refit the map
    pub fn apply_page(&mut self, page: Page<Business>) {
        debug!(count = page.count, shown = page.results.len(), "Business page loaded");
        self.businesses = page.results;
        self.count = page.count;
        self.next = page.next;
        self.previous = page.previous;
        self.selected = None;
        self.view = map::fit_markers(&self.businesses, self.zoom);
    }

    /// Select a business and pan to it if it has coordinates.
    /// Returns false if the id is not on the current page.
    pub fn select(&mut self, id: i64) -> bool {
        let Some(business) = self.businesses.iter().find(|b| b.id == id) else {
            return false;
        };
        if let Some(view) = map::focus(business) {
            self.view = view;
            self.zoom = map::FOCUS_ZOOM;
        }
        self.selected = Some(id);
        true
    }

    pub fn change_zoom(&mut self, delta: i32) {
        self.zoom = map::step_zoom(self.zoom, delta);
        if let MapView::Center { ref mut zoom, .. } = self.view {
            *zoom = self.zoom;
        }
    }
}
