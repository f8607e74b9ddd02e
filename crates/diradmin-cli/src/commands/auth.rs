// Login, logout and session inspection

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use tracing::info;

use diradmin_core::auth::AdminPage;
use diradmin_core::{GuardDecision, Route};

use crate::app::App;
use crate::output::{print_field, print_json};

/// Environment variable read instead of prompting for the password
const PASSWORD_ENV: &str = "DIRADMIN_PASSWORD";

pub async fn login(app: &mut App, username: Option<String>) -> Result<()> {
    // Already signed in: the login page redirects to the dashboard
    if let GuardDecision::Redirect(target) = app.decide(&Route::Login).await {
        let name = app.session.user().map(|u| u.full_name()).unwrap_or_default();
        println!("Already logged in as {}. Continue at {}.", name, target);
        return Ok(());
    }

    let username = match username.or_else(|| app.config.last_username.clone()) {
        Some(name) => name,
        None => prompt("Username: ")?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let user = app.session.login(&username, &password).await?;
    info!(username = %user.username, "Logged in");

    app.config.last_username = Some(username);
    app.save_config();

    println!("Logged in as {} ({})", user.full_name(), user.role_label());
    if let Some(target) = app.session.context().navigation().borrow().as_ref() {
        println!("Continue at {}", target);
    }
    Ok(())
}

pub fn logout(app: &mut App) -> Result<()> {
    app.session.logout();
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(app: &mut App) -> Result<()> {
    app.authorize(Route::Admin(AdminPage::Settings)).await?;
    let Some(user) = app.session.user() else {
        bail!("Not logged in. Run `diradmin login`.");
    };

    if app.json {
        return print_json(&user);
    }
    print_field("Name", &user.full_name());
    print_field("Username", &user.username);
    print_field("Email", &user.email);
    print_field("Role", user.role_label());
    print_field("Status", user.status_label());
    Ok(())
}

/// Show the guard's decision for a path
pub async fn route(app: &mut App, path: &str) -> Result<()> {
    let route: Route = path.parse()?;
    match app.decide(&route).await {
        GuardDecision::Render => println!("{}: render", route),
        GuardDecision::Wait => println!("{}: loading", route),
        GuardDecision::Redirect(target) => println!("{}: redirect to {}", route, target),
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
