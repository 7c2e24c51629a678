mod config;
mod database;
mod error;
mod model;
mod routes;
mod service;
mod validation;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use log::info;
use service::Service;
use std::io;

fn startup_error<E: std::fmt::Display>(err: E, message: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", message, err))
}

#[actix_rt::main]
async fn main() -> io::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "filmorate=debug,actix_web=info");
    }
    env_logger::init();

    let config = Config::from_env().map_err(|err| startup_error(err, "Configuration error"))?;
    let db = config
        .open_db()
        .map_err(|err| startup_error(err, "Database error"))?;
    match &config.db_path {
        Some(path) => info!("Opened database at {}", path.display()),
        None => info!("Opened temporary database"),
    }
    info!("Update relation policy: {:?}", config.relation_policy);

    let service = web::Data::new(Service::new(db, config.relation_policy));
    info!("Listening on {}", config.bind_address);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(service.clone())
            .configure(routes::configure)
    })
    .bind(&config.bind_address)?
    .run()
    .await
}
