use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::io;
use std::sync::Arc;

use news_board::api::{self, AppState};
use news_board::auth::AuthService;
use news_board::config::Settings;
use news_board::store::Store;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = Settings::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let settings = Arc::new(settings);

    let store = Store::new(&settings.database_path).map_err(|e| {
        log::error!("Failed to initialize database: {}", e);
        io::Error::new(io::ErrorKind::Other, e)
    })?;
    let store = Arc::new(store);

    let auth_service = Arc::new(AuthService::new(settings.jwt_secret.clone(), store.clone()));

    log::info!("Database: {}", settings.database_path);
    log::info!(
        "Home page shows {} news items, {} banned words configured",
        settings.news_count_on_home_page,
        settings.banned_words.len()
    );

    let port = settings.port;

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            // Registered on its own for the Identity extractor
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(AppState::new(
                store.clone(),
                auth_service.clone(),
                settings.clone(),
            )))
            .configure(api::configure_routes)
    })
    .workers(1);

    log::info!("Starting news-board server on port {}", port);

    server.bind(("0.0.0.0", port))?.run().await
}
