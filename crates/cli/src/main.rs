//! Paperback CLI - Terminal storefront for the bookstore API.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! paperback books list --author "Le Guin" --in-stock --sort price
//! paperback books search "left hand"
//! paperback books show 7
//!
//! # Sign in (session cookies persist across invocations)
//! paperback auth register -u reader -e reader@example.com -p hunter2
//! paperback auth login -u reader -p hunter2
//! paperback auth whoami
//!
//! # Cart and checkout
//! paperback cart add 7 --quantity 2
//! paperback cart show
//! paperback orders place
//! paperback orders cancel 3
//! ```
//!
//! # Environment Variables
//!
//! - `PAPERBACK_API_URL` - Base URL of the bookstore API
//! - `PAPERBACK_SESSION_FILE` - Where session cookies are persisted
//!   (default: `$HOME/.paperback-session`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use paperback_core::SortKey;

#[derive(Parser)]
#[command(name = "paperback")]
#[command(author, version, about = "Paperback bookstore terminal client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Books {
        #[command(subcommand)]
        action: BooksAction,
    },
    /// Manage the signed-in session
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Order history and checkout
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum BooksAction {
    /// List books with optional filters
    List {
        /// Author substring filter
        #[arg(long)]
        author: Option<String>,

        /// Only books with stock available
        #[arg(long)]
        in_stock: bool,

        /// Sort order (`title`, `price`, `price-desc`, `newest`)
        #[arg(long, default_value = "title")]
        sort: SortKey,
    },
    /// Search books by free text
    Search {
        /// Search text
        text: String,
    },
    /// Show one book
    Show {
        /// Book id
        id: i64,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Register a new account (signs you in)
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Log in
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },
    /// Log out
    Logout,
    /// Show who the saved session belongs to
    Whoami,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a book to the cart
    Add {
        /// Book id
        book_id: i64,

        /// How many copies
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Change an item's quantity
    Update {
        /// Cart item id
        item_id: i64,

        /// New quantity (at least 1; use `remove` to drop an item)
        quantity: u32,
    },
    /// Remove an item from the cart
    Remove {
        /// Cart item id
        item_id: i64,
    },
    /// Remove every item
    Clear,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List past orders
    List,
    /// Place an order from the cart
    Place,
    /// Cancel an order
    Cancel {
        /// Order id
        order_id: i64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let stores = commands::connect().await?;

    match cli.command {
        Commands::Books { action } => match action {
            BooksAction::List {
                author,
                in_stock,
                sort,
            } => commands::books::list(&stores, author, in_stock, sort).await?,
            BooksAction::Search { text } => commands::books::search(&stores, &text).await?,
            BooksAction::Show { id } => commands::books::show(&stores, id).await?,
        },
        Commands::Auth { action } => match action {
            AuthAction::Register {
                username,
                email,
                password,
            } => commands::auth::register(&stores, &username, &email, &password).await?,
            AuthAction::Login { username, password } => {
                commands::auth::login(&stores, &username, &password).await?;
            }
            AuthAction::Logout => commands::auth::logout(&stores).await,
            AuthAction::Whoami => commands::auth::whoami(&stores).await,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&stores).await?,
            CartAction::Add { book_id, quantity } => {
                commands::cart::add(&stores, book_id, quantity).await?;
            }
            CartAction::Update { item_id, quantity } => {
                commands::cart::update(&stores, item_id, quantity).await?;
            }
            CartAction::Remove { item_id } => commands::cart::remove(&stores, item_id).await?,
            CartAction::Clear => commands::cart::clear(&stores).await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&stores).await?,
            OrdersAction::Place => commands::orders::place(&stores).await?,
            OrdersAction::Cancel { order_id } => {
                commands::orders::cancel(&stores, order_id).await?;
            }
        },
    }

    commands::persist(&stores.api);
    Ok(())
}
