//! Student Aid Service Server
//!
//! Runs the HTTP API with every route group enabled against PostgreSQL.
//! Outbound mail goes through SMTP when `SMTP_SERVER` is set and is only
//! logged otherwise.

use std::sync::Arc;

use axum::http::HeaderValue;
use dotenv::dotenv;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use student_aid_service::{
    api::{AppState, RouterBuilder},
    config::AppConfig,
    database::run_migrations,
    repository::{PgAccountRepository, PgAidRequestRepository},
    service::{
        AccountNotifier, EmailTemplates, JwtService, LogGateway, NotificationGateway,
        NotificationQueue, SmtpGateway,
    },
};

fn cors_layer(origins: &[String]) -> Result<CorsLayer, Box<dyn std::error::Error>> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return Ok(layer.allow_origin(Any));
    }

    let origins = origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv().ok();

    env_logger::init();

    log::info!(
        "🚀 Starting Student Aid Service v{}",
        student_aid_service::VERSION
    );

    // Load configuration from environment
    let config = AppConfig::from_env()?;
    config.validate()?;

    log::info!("✅ Configuration loaded and validated");

    let database_pool = config.database.create_pool().await?;

    log::info!("🔄 Running database migrations...");
    run_migrations(&database_pool).await?;
    log::info!("✅ Database migrations completed");

    let accounts = Arc::new(PgAccountRepository::new(database_pool.clone()));
    let requests = Arc::new(PgAidRequestRepository::new(database_pool));
    let jwt_service = Arc::new(JwtService::from_config(&config.jwt));

    let gateway: Arc<dyn NotificationGateway> = match &config.email {
        Some(email_config) => {
            log::info!(
                "✅ SMTP delivery via {}:{}",
                email_config.smtp_host,
                email_config.smtp_port
            );
            Arc::new(SmtpGateway::new(email_config)?)
        }
        None => {
            log::warn!("⚠️  SMTP not configured; outbound email will only be logged");
            Arc::new(LogGateway)
        }
    };

    let queue = NotificationQueue::start(gateway);
    let notifier = AccountNotifier::new(EmailTemplates::new(&config.public_base_url)?, queue);

    let app_state = AppState::new(
        accounts,
        requests,
        jwt_service,
        notifier,
        config.security.bcrypt_cost,
    );

    log::info!("✅ Services initialized");

    let app = RouterBuilder::with_all_routes()
        .build(app_state.access_guard.clone())
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.server.cors_origins)?)
                .into_inner(),
        );

    let bind_addr = config.server.bind_address();
    log::info!("🌐 Starting server on {}", bind_addr);

    log::info!("📋 API Endpoints:");
    log::info!("   GET  /health - Health check");
    log::info!("   POST /auth/register - Register a student or manager");
    log::info!("   POST /auth/login - Exchange credentials for a bearer token");
    log::info!("   GET  /auth/verify-email/{{token}} - Verify email address");
    log::info!("   POST /auth/forgot-password - Request a password reset link");
    log::info!("   POST /auth/reset-password/{{token}} - Reset password");
    log::info!("   POST /auth/change-password - Change password (authenticated)");
    log::info!("   POST /students/apply - Submit an aid request");
    log::info!("   GET  /students/applications - List own aid requests");
    log::info!("   GET  /managers/applications - List all aid requests");
    log::info!("   PUT  /managers/applications/{{id}}/status - Approve or reject");
    log::info!("   POST /admin/initial-admin - Bootstrap the first admin");
    log::info!("   POST /admin/admins - Create an admin");
    log::info!("   GET  /admin/managers | /admin/students - List accounts by role");
    log::info!("   PUT  /admin/managers/{{id}}/deactivate - Deactivate a manager");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    log::info!("✅ Server listening and ready for requests");
    axum::serve(listener, app).await?;

    Ok(())
}
