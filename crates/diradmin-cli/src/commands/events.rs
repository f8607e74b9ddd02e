// Event commands

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Subcommand;

use diradmin_core::auth::AdminPage;
use diradmin_core::models::{filter_events, EventWindow, NewEvent};
use diradmin_core::utils::{format_date, format_optional};
use diradmin_core::Route;

use crate::app::App;
use crate::output::{print_field, print_json, print_table_header, print_table_row};

#[derive(Subcommand)]
pub enum EventsCommand {
    /// List events, soonest first
    List {
        /// Match name or description
        #[arg(long, short, default_value = "")]
        search: String,

        /// all, upcoming or past
        #[arg(long, default_value = "all")]
        window: EventWindow,
    },

    /// Show one event
    Show {
        /// Event ID
        id: i64,
    },

    /// Create an event
    Create {
        #[arg(long)]
        name: String,

        /// Start date or date-time, e.g. 2025-06-10T18:00
        #[arg(long)]
        date: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "")]
        venue: String,

        #[arg(long, default_value = "")]
        website: String,

        #[arg(long, default_value = "")]
        contact_name: String,

        #[arg(long, default_value = "")]
        contact_info: String,

        /// Image file to upload
        #[arg(long)]
        image: Option<PathBuf>,
    },
}

pub async fn run(command: EventsCommand, app: &mut App) -> Result<()> {
    match command {
        EventsCommand::List { search, window } => list(app, &search, window).await,
        EventsCommand::Show { id } => show(app, id).await,
        EventsCommand::Create {
            name,
            date,
            description,
            venue,
            website,
            contact_name,
            contact_info,
            image,
        } => {
            app.authorize(Route::Admin(AdminPage::CreateEvent)).await?;
            let event = NewEvent {
                name,
                description,
                venue,
                date,
                website,
                contact_name,
                contact_info,
                image,
            };
            let created = app
                .api()
                .create_event(&event)
                .await
                .context("Failed to create event")?;
            println!("Created event {} (id {})", created.name, created.id);
            Ok(())
        }
    }
}

async fn list(app: &mut App, search: &str, window: EventWindow) -> Result<()> {
    app.authorize(Route::Admin(AdminPage::Events)).await?;
    let events = app.api().list_events().await.context("Failed to load events")?;
    let shown = filter_events(&events, search, window, Utc::now());

    if app.json {
        return print_json(&shown);
    }
    if shown.is_empty() {
        println!("No events found.");
        return Ok(());
    }

    print_table_header(&[("ID", 6), ("NAME", 30), ("DATE", 14), ("VENUE", 28)]);
    for event in shown {
        let id = event.id.to_string();
        let date = event
            .date
            .as_deref()
            .map(format_date)
            .unwrap_or_else(|| "-".to_string());
        let venue = format_optional(&event.venue, "-");
        print_table_row(&[(&id, 6), (&event.name, 30), (&date, 14), (&venue, 28)]);
    }
    Ok(())
}

async fn show(app: &mut App, id: i64) -> Result<()> {
    app.authorize(Route::Admin(AdminPage::EventDetail(id))).await?;
    let event = app
        .api()
        .get_event(id)
        .await
        .with_context(|| format!("Failed to load event {}", id))?;

    if app.json {
        return print_json(&event);
    }
    print_field("ID", &event.id.to_string());
    print_field("Name", &event.name);
    print_field(
        "Date",
        &event.date.as_deref().map(format_date).unwrap_or_else(|| "-".to_string()),
    );
    print_field("Venue", &format_optional(&event.venue, "-"));
    print_field("Address", &format_optional(&event.address, "-"));
    print_field("Organizer", &format_optional(&event.organizer, "-"));
    print_field("Contact", &format_optional(&event.contact_name, "-"));
    print_field("Contact info", &format_optional(&event.contact_info, "-"));
    print_field("Website", &format_optional(&event.website, "-"));
    print_field("Status", &format_optional(&event.status, "-"));
    if let Some(capacity) = event.capacity {
        print_field("Capacity", &capacity.to_string());
    }
    if let Some(text) = event.long_description.as_ref().or(event.description.as_ref()) {
        println!();
        println!("{}", text);
    }
    Ok(())
}
