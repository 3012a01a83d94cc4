use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

use academy::config::Config;
use academy::db::{init_db, migrate};
use academy::docs::ApiDoc;
use academy::routes::{self, Limiters};
use academy::scan::mysql_pipeline;
use academy::store::MySqlStore;
use academy::telemetry;
use academy::utils::student_cache::StudentCache;
use tracing::{info, warn};
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Academy API"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;
    let _guard = telemetry::init(&config, "academy.log");

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;
    if config.run_migrations {
        migrate(&pool).await?;
    }

    let cache = StudentCache::new(config.student_cache_capacity, config.student_cache_ttl);
    let pipeline = Data::new(mysql_pipeline(
        MySqlStore::new(pool.clone()),
        cache.clone(),
        config.ledger_clock,
    ));
    let limiters = Limiters::from_config(&config)?;

    let pool_for_cache_warmup = pool.clone();
    let (warmup_days, warmup_batch) = (config.cache_warmup_days, config.cache_warmup_batch);
    actix_web::rt::spawn(async move {
        // Recent admissions are the students most likely to be scanned
        if let Err(e) = cache
            .warmup(&pool_for_cache_warmup, warmup_days, warmup_batch)
            .await
        {
            warn!(error = %e, "Failed to warm up student cache");
        }
    });

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(pipeline.clone())
            .app_data(Data::new(config_data.ledger_clock))
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config_data, &limiters))
    })
    .bind(&server_addr)
    .with_context(|| format!("failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
