use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use dept_guard::authz::{assignable_roles, compose_menus, ComposeMode};
use dept_guard::db;
use dept_guard::events::{init_event_bus, start_activity_listener};
use dept_guard::models::MoveDirection;
use dept_guard::{DepartmentMenuCache, GuardConfig, GuardService, MenuAdmin, SqliteCatalog};

#[derive(Parser, Debug)]
#[command(author, version, about = "department-scoped route guard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending migrations
    Migrate,
    /// Insert the demo department, roles, menus and users
    Seed,
    /// Decide whether a user may open a path
    Decide {
        #[arg(long)]
        user: Option<Uuid>,
        #[arg(long)]
        path: String,
    },
    /// Print a department's composed menu records
    Menus {
        #[arg(long)]
        department: Uuid,
        /// Administrative listing instead of the authorization view
        #[arg(long)]
        listing: bool,
    },
    /// Print the navigation tree a user sees
    Nav {
        #[arg(long)]
        user: Uuid,
    },
    /// Print the roles assignable in a department
    Roles {
        #[arg(long)]
        department: Uuid,
    },
    /// Hide or show a menu for the actor's department
    Hide {
        #[arg(long)]
        actor: Uuid,
        #[arg(long)]
        menu: Uuid,
        /// Clear the override instead of hiding
        #[arg(long)]
        show: bool,
    },
    /// Move a menu up or down among its siblings
    Move {
        #[arg(long)]
        actor: Uuid,
        #[arg(long)]
        menu: Uuid,
        #[arg(long)]
        direction: MoveDirection,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    init_tracing();

    let cli = Cli::parse();
    let config = GuardConfig::from_env()?;
    let pool = db::init(&config).await?;

    let catalog = Arc::new(SqliteCatalog::new(pool.clone()));
    let cache = Arc::new(DepartmentMenuCache::new());
    let service = Arc::new(GuardService::from_config(Arc::clone(&catalog), cache, &config));

    match cli.command {
        Commands::Migrate => {
            println!("Migrations applied");
        }
        Commands::Seed => {
            let summary = db::seed::seed_demo(&pool).await.context("failed to seed demo data")?;
            print_json(&summary)?;
        }
        Commands::Decide { user, path } => {
            let decision = service.authorize(user, &path).await;
            print_json(&decision)?;
        }
        Commands::Menus { department, listing } => {
            let mode = if listing { ComposeMode::Listing } else { ComposeMode::Authorization };
            let records = compose_menus(catalog.as_ref(), department, mode).await?;
            print_json(&records)?;
        }
        Commands::Nav { user } => {
            let records = service.navigation(user).await?;
            print_json(&records)?;
        }
        Commands::Roles { department } => {
            let options = assignable_roles(catalog.as_ref(), department).await?;
            print_json(&options)?;
        }
        Commands::Hide { actor, menu, show } => {
            let (bus, rx) = init_event_bus();
            let listener = tokio::spawn(start_activity_listener(rx, pool.clone()));
            let admin = MenuAdmin::new(Arc::clone(&service), bus);

            let result = admin.set_hidden(actor, menu, !show).await;
            drop(admin);
            listener.await.context("activity listener panicked")?;
            print_json(&result?)?;
        }
        Commands::Move { actor, menu, direction } => {
            let (bus, rx) = init_event_bus();
            let listener = tokio::spawn(start_activity_listener(rx, pool.clone()));
            let admin = MenuAdmin::new(Arc::clone(&service), bus);

            let result = admin.move_order(actor, menu, direction).await;
            drop(admin);
            listener.await.context("activity listener panicked")?;
            print_json(&serde_json::json!({ "moved": result? }))?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
