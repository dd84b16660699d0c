//! API Gateway for the marketplace backend

mod api;
mod auth;
mod config;
mod error;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse};
use tracing::{info, Level, debug};
use tracing_subscriber::{EnvFilter, FmtSubscriber, fmt::format::FmtSpan};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use account_ledger::AccountService;
use listing_catalog::ListingService;
use trade_engine::{TradeEngineConfig, TradeService};

use crate::api::{
    account::{create_account, get_account, deposit},
    listing::{create_listing, list_listings, get_listing, deactivate_listing},
    trade::{purchase, my_purchases, my_sales, statistics, get_trade, refund, rate},
};
use crate::config::AppConfig;

/// App state shared across handlers
pub struct AppState {
    /// Account ledger service
    pub ledger: Arc<AccountService>,
    /// Listing catalog service
    pub catalog: Arc<ListingService>,
    /// Trade engine service
    pub trades: Arc<TradeService>,
}

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Account routes
        api::account::create_account,
        api::account::get_account,
        api::account::deposit,
        // Listing routes
        api::listing::create_listing,
        api::listing::list_listings,
        api::listing::get_listing,
        api::listing::deactivate_listing,
        // Trade routes
        api::trade::purchase,
        api::trade::my_purchases,
        api::trade::my_sales,
        api::trade::statistics,
        api::trade::get_trade,
        api::trade::refund,
        api::trade::rate,
    ),
    components(
        schemas(
            // Account API
            api::account::CreateAccountRequest,
            api::account::DepositRequest,
            common::model::account::Account,
            common::model::account::AccountSummary,
            common::model::account::RatingSummary,

            // Listing API
            api::listing::CreateListingRequest,
            common::model::listing::Listing,
            common::model::listing::ListingSummary,
            common::model::listing::Category,

            // Trade API
            api::trade::PurchaseRequest,
            api::trade::RefundRequest,
            api::trade::RefundResponse,
            api::trade::RateRequest,
            api::trade::StatisticsQuery,
            common::model::trade::Trade,
            common::model::trade::TradeDetail,
            common::model::trade::TradeRating,
            common::model::trade::TradeStatus,
            common::model::trade::TradeStatistics,
            common::model::trade::TradeRole,

            // Response models
            api::response::ApiResponse<common::model::account::Account>,
            api::response::ApiResponse<common::model::listing::Listing>,
            api::response::ApiResponse<common::model::trade::TradeDetail>,
            api::response::ApiResponse<common::model::trade::TradeRating>,
            api::response::ApiResponse<common::model::trade::TradeStatistics>,
            api::response::ApiResponse<api::trade::RefundResponse>,
            api::response::PaginatedResponse<common::model::listing::Listing>,
            api::response::PaginatedResponse<common::model::trade::TradeDetail>,
            api::response::PaginationMetadata
        )
    ),
    tags(
        (name = "account", description = "Account management endpoints"),
        (name = "listing", description = "Listing catalog endpoints"),
        (name = "trade", description = "Trade settlement endpoints")
    ),
    info(
        title = "Marketplace API",
        version = "1.0.0",
        description = "API for the information marketplace: accounts, listings, and escrow-style trade settlement"
    )
)]
struct ApiDoc;

/// Marketplace API server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Listening address
    #[clap(short, long, default_value = "127.0.0.1:8080")]
    addr: String,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging with debug level when DEBUG=1 env var is set
    let env = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env == "1" { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse("tower_http=debug,api_gateway=debug")
        .unwrap();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    debug!("Debug logging enabled");

    // Initialize services; a configured DATABASE_URL selects PostgreSQL,
    // otherwise everything runs on in-memory repositories (demo mode)
    let config = AppConfig::new();
    let (ledger, catalog, trades) = match config.database_url.clone() {
        Some(url) => {
            info!("Using PostgreSQL repositories");

            // Apply any pending schema migrations before the services connect
            let pool = common::db::init_db_pool()
                .await
                .expect("Failed to connect to database");
            common::db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");

            let ledger = Arc::new(
                AccountService::with_repository(
                    account_ledger::RepositoryType::Postgres(Some(url.clone())),
                )
                .await
                .expect("Failed to initialize account ledger"),
            );
            let catalog = Arc::new(
                ListingService::with_repository(
                    listing_catalog::RepositoryType::Postgres(Some(url.clone())),
                )
                .await
                .expect("Failed to initialize listing catalog"),
            );
            let trades = Arc::new(
                TradeService::with_repository(
                    trade_engine::RepositoryType::Postgres(Some(url)),
                    ledger.clone(),
                    catalog.clone(),
                    TradeEngineConfig::from_env(),
                )
                .await
                .expect("Failed to initialize trade engine"),
            );

            (ledger, catalog, trades)
        },
        None => {
            info!("No DATABASE_URL set, using in-memory repositories");

            let ledger = Arc::new(AccountService::new());
            let catalog = Arc::new(ListingService::new());
            let trades = Arc::new(TradeService::new(ledger.clone(), catalog.clone()));

            (ledger, catalog, trades)
        },
    };

    // Create app state
    let state = Arc::new(AppState {
        ledger,
        catalog,
        trades,
    });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Set up API routes
    let api_routes = Router::new()
        // Account routes
        .route("/accounts", post(create_account))
        .route("/accounts/:id", get(get_account))
        .route("/accounts/:id/deposit", post(deposit))

        // Listing routes
        .route("/listings", post(create_listing))
        .route("/listings", get(list_listings))
        .route("/listings/:id", get(get_listing))
        .route("/listings/:id/deactivate", post(deactivate_listing))

        // Trade routes
        .route("/trades/purchase", post(purchase))
        .route("/trades/my-purchases", get(my_purchases))
        .route("/trades/my-sales", get(my_sales))
        .route("/trades/statistics", get(statistics))
        .route("/trades/:id", get(get_trade))
        .route("/trades/:id/refund", post(refund))
        .route("/trades/:id/rate", post(rate));

    // Set up Swagger UI
    let swagger_ui = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi());

    // Combine all routes
    let app = Router::new()
        .nest("/api/v1", api_routes)
        .merge(swagger_ui)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(log_level)
                )
                .on_request(DefaultOnRequest::new().level(log_level))
                .on_response(DefaultOnResponse::new().level(log_level))
        )
        .with_state(state);

    // Start the server
    let addr: std::net::SocketAddr = args.addr.parse().expect("Invalid address");
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    // Run until interrupt signal
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
