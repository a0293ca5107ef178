use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use forum_service::db::channel_repo::PgChannelDirectory;
use forum_service::db::store::PgMessageStore;
use forum_service::middleware::JwtAuthMiddleware;
use forum_service::openapi::ApiDoc;
use forum_service::security::jwt;
use forum_service::services::{ChannelService, MessageService};
use forum_service::{db, handlers, Config};
use sqlx::PgPool;
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

async fn health_summary(pool: web::Data<PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").fetch_one(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "forum-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "forum-service"
        })),
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting forum-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    jwt::initialize(&config.auth.jwt_secret)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let pool = db::init_pool(&config.database).await.map_err(|e| {
        io::Error::new(
            io::ErrorKind::ConnectionRefused,
            format!("PostgreSQL connection failed: {}", e),
        )
    })?;

    db::MIGRATOR
        .run(&pool)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("migration failed: {}", e)))?;
    tracing::info!("Database migrations applied");

    let message_service = web::Data::new(MessageService::new(
        Arc::new(PgMessageStore::new(pool.clone())),
        Arc::new(PgChannelDirectory::new(pool.clone())),
    ));
    let channel_service = web::Data::new(ChannelService::new(pool.clone()));
    let pool_data = web::Data::new(pool);

    let bind_address = (config.app.host.clone(), config.app.port);
    let allowed_origins = config.cors.allowed_origins.clone();
    tracing::info!("Listening on {}:{}", config.app.host, config.app.port);

    HttpServer::new(move || {
        // Build CORS configuration
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        let openapi_doc = ApiDoc::openapi();

        App::new()
            .app_data(pool_data.clone())
            .app_data(message_service.clone())
            .app_data(channel_service.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api/v1/openapi.json", openapi_doc.clone()),
            )
            // Health check endpoints
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            .service(
                web::scope("/api/v1")
                    .wrap(JwtAuthMiddleware)
                    .service(
                        web::scope("/channels")
                            .service(
                                web::resource("")
                                    .route(web::get().to(handlers::list_channels))
                                    .route(web::post().to(handlers::create_channel)),
                            )
                            .service(
                                web::resource("/{channel_id}")
                                    .route(web::get().to(handlers::get_channel)),
                            )
                            .service(
                                web::resource("/{channel_id}/messages")
                                    .route(web::get().to(handlers::list_channel_messages))
                                    .route(web::post().to(handlers::create_message)),
                            ),
                    )
                    .service(
                        web::scope("/messages").service(
                            web::resource("/{message_id}")
                                .route(web::get().to(handlers::get_message))
                                .route(web::patch().to(handlers::update_message))
                                .route(web::delete().to(handlers::delete_message)),
                        ),
                    ),
            )
    })
    .bind(bind_address)?
    .run()
    .await
}
