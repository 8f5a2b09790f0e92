pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::error::Error;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::OrderService;
use crate::errors::AppError;
use crate::handlers::{admin, coupons, orders};
use crate::infrastructure::DieselOrderStore;

pub use config::AppConfig;
pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(OpenApi)]
#[openapi(
    paths(
        orders::create_order,
        orders::quote_order,
        orders::list_orders,
        orders::get_order,
        orders::cancel_order,
        orders::request_cancellation,
        coupons::validate_coupon,
        admin::list_orders,
        admin::update_status,
        admin::update_payment_status,
        admin::resolve_cancellation,
    ),
    tags(
        (name = "orders", description = "Checkout and customer order management"),
        (name = "coupons", description = "Coupon checks"),
        (name = "admin", description = "Back-office order lifecycle"),
    )
)]
pub struct ApiDoc;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    for version in applied {
        log::info!("Applied migration {version}");
    }
    Ok(())
}

/// Routes and extractor configuration, shared by the server and HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/orders")
            .route("", web::post().to(orders::create_order))
            .route("", web::get().to(orders::list_orders))
            .route("/quote", web::post().to(orders::quote_order))
            .route("/{id}", web::get().to(orders::get_order))
            .route("/{id}/cancel", web::post().to(orders::cancel_order))
            .route(
                "/{id}/cancellation-request",
                web::post().to(orders::request_cancellation),
            ),
    )
    .service(web::scope("/coupons").route("/validate", web::post().to(coupons::validate_coupon)))
    .service(
        web::scope("/admin/orders")
            .route("", web::get().to(admin::list_orders))
            .route("/{id}/status", web::patch().to(admin::update_status))
            .route(
                "/{id}/payment-status",
                web::patch().to(admin::update_payment_status),
            )
            .route(
                "/{id}/cancellation-request",
                web::patch().to(admin::resolve_cancellation),
            ),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let service = web::Data::new(OrderService::new(DieselOrderStore::new(pool)));
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
