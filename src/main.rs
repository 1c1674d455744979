use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use std::sync::Arc;
use std::time::Duration;

use campus_erp::config::Config;
use campus_erp::db::init_db;
use campus_erp::docs::ApiDoc;
use campus_erp::routes;
use campus_erp::service::{DecisionEngine, LeavePolicy};
use campus_erp::store::mysql::{MySqlLedgerStore, MySqlLeaveStore};
use campus_erp::utils::directory_cache::CachedDirectory;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Campus ERP leave service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;

    let directory = CachedDirectory::new(
        pool.clone(),
        Duration::from_secs(config.directory_cache_ttl_secs),
    );
    let directory_for_warmup = directory.clone();
    let warmup_batch = config.directory_warmup_batch;

    actix_web::rt::spawn(async move {
        if let Err(e) = directory_for_warmup.warmup(warmup_batch).await {
            tracing::error!(error = %e, "Failed to warmup directory cache");
        }
    });

    let engine = DecisionEngine::new(
        Arc::new(MySqlLeaveStore::new(pool.clone())),
        Arc::new(MySqlLedgerStore::new(pool)),
        Arc::new(directory),
        LeavePolicy {
            accrue_od_leave: config.accrue_od_leave,
        },
    );
    info!(accrue_od_leave = config.accrue_od_leave, "Leave policy loaded");

    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(engine.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
