// User management commands

use anyhow::{Context, Result};
use clap::Subcommand;

use diradmin_core::auth::AdminPage;
use diradmin_core::models::{filter_users, NewUser, UserStatusFilter};
use diradmin_core::Route;

use crate::app::App;
use crate::output::{print_json, print_table_header, print_table_row};

#[derive(Subcommand)]
pub enum UsersCommand {
    /// List users
    List {
        /// Match name or email
        #[arg(long, short, default_value = "")]
        search: String,

        /// all, active or inactive
        #[arg(long, default_value = "all")]
        status: UserStatusFilter,
    },

    /// Create a user (password from DIRADMIN_NEW_PASSWORD or a prompt)
    Create {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,
    },

    /// Delete a user
    Delete {
        /// User ID
        id: i64,
    },

    /// Re-enable a disabled account
    Enable {
        /// User ID
        id: i64,
    },

    /// Disable an account without deleting it
    Disable {
        /// User ID
        id: i64,
    },
}

pub async fn run(command: UsersCommand, app: &mut App) -> Result<()> {
    match command {
        UsersCommand::List { search, status } => list(app, &search, status).await,
        UsersCommand::Create {
            username,
            email,
            first_name,
            last_name,
        } => {
            app.authorize(Route::Admin(AdminPage::CreateUser)).await?;
            let password = match std::env::var("DIRADMIN_NEW_PASSWORD") {
                Ok(password) => password,
                Err(_) => rpassword::prompt_password("New user's password: ")
                    .context("Failed to read password")?,
            };
            let user = NewUser {
                username,
                email,
                password,
                first_name,
                last_name,
            };
            let created = app
                .api()
                .create_user(&user)
                .await
                .context("Failed to create user")?;
            println!("Created user {} (id {})", created.username, created.id);
            Ok(())
        }
        UsersCommand::Delete { id } => {
            app.authorize(Route::Admin(AdminPage::Users)).await?;
            app.api()
                .delete_user(id)
                .await
                .context("Failed to delete user")?;
            println!("Deleted user {}", id);
            Ok(())
        }
        UsersCommand::Enable { id } => set_active(app, id, true).await,
        UsersCommand::Disable { id } => set_active(app, id, false).await,
    }
}

async fn list(app: &mut App, search: &str, status: UserStatusFilter) -> Result<()> {
    app.authorize(Route::Admin(AdminPage::Users)).await?;
    let users = app.api().list_users().await.context("Failed to load users")?;
    let shown = filter_users(&users, search, status);

    if app.json {
        return print_json(&shown);
    }
    if shown.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    print_table_header(&[
        ("ID", 6),
        ("NAME", 24),
        ("USERNAME", 18),
        ("EMAIL", 28),
        ("ROLE", 12),
        ("STATUS", 8),
    ]);
    for user in shown {
        let id = user.id.to_string();
        let name = user.full_name();
        print_table_row(&[
            (&id, 6),
            (&name, 24),
            (&user.username, 18),
            (&user.email, 28),
            (user.role_label(), 12),
            (user.status_label(), 8),
        ]);
    }
    Ok(())
}

async fn set_active(app: &mut App, id: i64, active: bool) -> Result<()> {
    app.authorize(Route::Admin(AdminPage::Users)).await?;
    let user = app
        .api()
        .set_user_active(id, active)
        .await
        .context("Failed to update user")?;
    println!("{} is now {}", user.username, user.status_label().to_lowercase());
    Ok(())
}
