// Category and province listings

use anyhow::{Context, Result};

use diradmin_core::auth::AdminPage;
use diradmin_core::Route;

use crate::app::App;
use crate::output::{print_json, print_table_header, print_table_row};

pub async fn categories(app: &mut App) -> Result<()> {
    app.authorize(Route::Admin(AdminPage::Businesses)).await?;
    let categories = app
        .api()
        .list_categories()
        .await
        .context("Failed to load categories")?;

    if app.json {
        return print_json(&categories);
    }
    let rows: Vec<(String, String)> = categories
        .iter()
        .map(|c| (c.id.to_string(), c.display_name()))
        .collect();
    print_rows(&rows);
    Ok(())
}

pub async fn provinces(app: &mut App) -> Result<()> {
    app.authorize(Route::Admin(AdminPage::Businesses)).await?;
    let provinces = app
        .api()
        .list_provinces()
        .await
        .context("Failed to load provinces")?;

    if app.json {
        return print_json(&provinces);
    }
    let rows: Vec<(String, String)> = provinces
        .iter()
        .map(|p| (p.id.to_string(), p.display_name()))
        .collect();
    print_rows(&rows);
    Ok(())
}

fn print_rows(rows: &[(String, String)]) {
    if rows.is_empty() {
        println!("Nothing found.");
        return;
    }
    print_table_header(&[("ID", 6), ("NAME", 40)]);
    for (id, name) in rows {
        print_table_row(&[(id, 6), (name, 40)]);
    }
}
