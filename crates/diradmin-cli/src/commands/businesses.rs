// Business directory commands

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Subcommand;

use diradmin_core::auth::AdminPage;
use diradmin_core::directory::BusinessDirectory;
use diradmin_core::map::{LatLng, MapView};
use diradmin_core::models::{Business, BusinessQuery, NewBusiness};
use diradmin_core::utils::format_optional;
use diradmin_core::{ApiClient, Route};

use crate::app::App;
use crate::output::{print_field, print_json, print_table_header, print_table_row};

#[derive(Subcommand)]
pub enum BusinessesCommand {
    /// List businesses with optional filters
    List {
        /// Category ID
        #[arg(long)]
        category: Option<String>,

        /// Province ID
        #[arg(long)]
        province: Option<String>,

        /// Free-text search
        #[arg(long, short)]
        search: Option<String>,

        /// Page number, following the server's pagination links
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        /// Show one business from the page and center the map on it
        #[arg(long)]
        select: Option<i64>,

        /// Zoom steps applied to the map view, e.g. 2 or -1
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        zoom: i32,
    },

    /// Create a business
    Create {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,

        #[arg(long, default_value = "")]
        address: String,

        /// Category ID
        #[arg(long, default_value = "")]
        category: String,

        /// Province ID
        #[arg(long, default_value = "")]
        province: String,

        #[arg(long, default_value = "")]
        facebook: String,

        #[arg(long, default_value = "")]
        instagram: String,

        #[arg(long, default_value = "")]
        youtube: String,

        #[arg(long, default_value = "")]
        website: String,

        /// Google Maps link; latitude and longitude are read from it
        #[arg(long, default_value = "")]
        map_url: String,

        #[arg(long)]
        featured: bool,

        /// Image file to upload
        #[arg(long)]
        image: Option<PathBuf>,
    },
}

pub async fn run(command: BusinessesCommand, app: &mut App) -> Result<()> {
    match command {
        BusinessesCommand::List {
            category,
            province,
            search,
            page,
            select,
            zoom,
        } => {
            let query = BusinessQuery {
                category,
                province,
                search,
            };
            list(app, query, page, select, zoom).await
        }
        BusinessesCommand::Create {
            name,
            email,
            phone,
            address,
            category,
            province,
            facebook,
            instagram,
            youtube,
            website,
            map_url,
            featured,
            image,
        } => {
            app.authorize(Route::Admin(AdminPage::CreateBusiness)).await?;
            let business = NewBusiness {
                name,
                contact_email: email,
                contact_phone: phone,
                address,
                category,
                province,
                facebook_link: facebook,
                instagram_link: instagram,
                youtube_link: youtube,
                website_link: website,
                map_location_url: map_url,
                featured,
                image,
            };
            let created = app
                .api()
                .create_business(&business)
                .await
                .context("Failed to create business")?;
            println!("Created business {} (id {})", created.name, created.id);
            Ok(())
        }
    }
}

/// Load the first page for `query`, then follow `next` links to `page`
async fn load_page(api: &ApiClient, query: BusinessQuery, page: u32) -> Result<BusinessDirectory> {
    let mut directory = BusinessDirectory::default();
    directory
        .set_query(api, query)
        .await
        .context("Failed to load businesses")?;
    for _ in 1..page {
        if !directory.next_page(api).await? {
            bail!("Page {} is past the last page", page);
        }
    }
    Ok(directory)
}

async fn list(
    app: &mut App,
    query: BusinessQuery,
    page: u32,
    select: Option<i64>,
    zoom: i32,
) -> Result<()> {
    app.authorize(Route::Admin(AdminPage::Businesses)).await?;

    let mut directory = load_page(app.api(), query, page).await?;

    if let Some(id) = select {
        if !directory.select(id) {
            bail!("Business {} is not on this page", id);
        }
    }
    if zoom != 0 {
        directory.change_zoom(zoom);
    }

    if app.json {
        return print_json(&directory.businesses);
    }

    if let Some(business) = directory.selected() {
        print_business(business);
    } else if directory.businesses.is_empty() {
        println!("No businesses found.");
    } else {
        print_table_header(&[("ID", 6), ("NAME", 30), ("CATEGORY", 18), ("ADDRESS", 32)]);
        for business in &directory.businesses {
            let id = business.id.to_string();
            let featured = if business.featured {
                format!("* {}", business.name)
            } else {
                business.name.clone()
            };
            let category = format_optional(&business.category_name, "-");
            let address = format_optional(&business.address, "-");
            print_table_row(&[(&id, 6), (&featured, 30), (&category, 18), (&address, 32)]);
        }
    }

    println!();
    println!(
        "{} businesses total, page {}{}{}",
        directory.count,
        page,
        if directory.has_previous() { ", has previous" } else { "" },
        if directory.has_next() { ", has next" } else { "" },
    );
    println!("Map: {}", describe_view(directory.view()));
    Ok(())
}

fn print_business(business: &Business) {
    print_field("ID", &business.id.to_string());
    print_field("Name", &business.name);
    print_field("Category", &format_optional(&business.category_name, "-"));
    print_field("Address", &format_optional(&business.address, "-"));
    print_field("Phone", &format_optional(&business.contact_phone, "-"));
    print_field("Email", &format_optional(&business.contact_email, "-"));
    print_field("Featured", if business.featured { "yes" } else { "no" });
    if let Some(point) = business.coordinates() {
        print_field("Location", &describe_point(point));
    }
}

fn describe_point(p: LatLng) -> String {
    format!("{:.5}, {:.5}", p.lat, p.lng)
}

fn describe_view(view: MapView) -> String {
    match view {
        MapView::Fit(bounds) => format!(
            "fit {} to {}",
            describe_point(bounds.south_west),
            describe_point(bounds.north_east)
        ),
        MapView::Center { center, zoom } => {
            format!("centered on {} at zoom {}", describe_point(center), zoom)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use diradmin_core::auth::MemoryTokenStore;
    use diradmin_core::SessionContext;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_two_pages(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/afghan/business/"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 3,
                "next": null,
                "previous": format!("{}/afghan/business/", server.uri()),
                "results": [{"id": 3, "name": "Kandahar Dried Fruit"}]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/afghan/business/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 3,
                "next": format!("{}/afghan/business/?page=2", server.uri()),
                "previous": null,
                "results": [{"id": 1, "name": "Herat Rugs"}, {"id": 2, "name": "Kabul Bakery"}]
            })))
            .mount(server)
            .await;
    }

    fn api(server: &MockServer) -> ApiClient {
        let context = SessionContext::new(Arc::new(MemoryTokenStore::new()));
        ApiClient::new(&server.uri(), context).unwrap()
    }

    #[tokio::test]
    async fn test_load_page_follows_next_links() {
        let server = MockServer::start().await;
        mount_two_pages(&server).await;

        let directory = load_page(&api(&server), BusinessQuery::default(), 2)
            .await
            .unwrap();
        assert_eq!(directory.businesses.len(), 1);
        assert_eq!(directory.businesses[0].id, 3);
        assert!(directory.has_previous());
        assert!(!directory.has_next());
    }

    #[tokio::test]
    async fn test_load_page_past_last_page() {
        let server = MockServer::start().await;
        mount_two_pages(&server).await;

        let err = load_page(&api(&server), BusinessQuery::default(), 3)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Page 3 is past the last page");
    }

    #[test]
    fn test_describe_view() {
        let view = MapView::Center {
            center: LatLng { lat: 34.5, lng: 69.2 },
            zoom: 15,
        };
        assert_eq!(describe_view(view), "centered on 34.50000, 69.20000 at zoom 15");
    }
}
