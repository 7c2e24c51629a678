use crate::error::{Error, ErrorKind};
use crate::model::*;
use crate::service::Service;
use actix_web::{error::InternalError, http::StatusCode, web, HttpResponse, ResponseError};
use log::debug;
use serde::Serialize;

pub type AppService = web::Data<Service<sled::Db>>;

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else if self.kind() == ErrorKind::NotFound {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        let kind = self.kind();
        let message = if kind == ErrorKind::Storage {
            debug!("{:?}", self);
            "Database error".to_owned()
        } else {
            self.to_string()
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: kind.as_str(),
            message,
        })
    }
}

async fn add_user(service: AppService, user: web::Json<User>) -> actix_web::Result<HttpResponse> {
    let user = service.add_user(user.into_inner())?;
    Ok(HttpResponse::Created().json(user))
}

async fn update_user(
    service: AppService,
    user: web::Json<User>,
) -> actix_web::Result<HttpResponse> {
    let user = service.update_user(user.into_inner())?;
    Ok(HttpResponse::Ok().json(user))
}

async fn list_users(service: AppService) -> actix_web::Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.list_users()?))
}

async fn get_user(service: AppService, id: web::Path<UserId>) -> actix_web::Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.get_user(id.into_inner())?))
}

async fn friends(service: AppService, id: web::Path<UserId>) -> actix_web::Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.friends(id.into_inner())?))
}

async fn add_friend(
    service: AppService,
    path: web::Path<(UserId, UserId)>,
) -> actix_web::Result<HttpResponse> {
    let (id, friend_id) = path.into_inner();
    service.add_friend(id, friend_id)?;
    Ok(HttpResponse::NoContent().finish())
}

async fn remove_friend(
    service: AppService,
    path: web::Path<(UserId, UserId)>,
) -> actix_web::Result<HttpResponse> {
    let (id, friend_id) = path.into_inner();
    service.remove_friend(id, friend_id)?;
    Ok(HttpResponse::NoContent().finish())
}

async fn add_film(service: AppService, film: web::Json<Film>) -> actix_web::Result<HttpResponse> {
    let film = service.add_film(film.into_inner())?;
    Ok(HttpResponse::Created().json(film))
}

async fn update_film(
    service: AppService,
    film: web::Json<Film>,
) -> actix_web::Result<HttpResponse> {
    let film = service.update_film(film.into_inner())?;
    Ok(HttpResponse::Ok().json(film))
}

async fn list_films(service: AppService) -> actix_web::Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.list_films()?))
}

async fn get_film(service: AppService, id: web::Path<FilmId>) -> actix_web::Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.get_film(id.into_inner())?))
}

async fn add_like(
    service: AppService,
    path: web::Path<(FilmId, UserId)>,
) -> actix_web::Result<HttpResponse> {
    let (film_id, user_id) = path.into_inner();
    service.add_like(film_id, user_id)?;
    Ok(HttpResponse::Created().finish())
}

async fn remove_like(
    service: AppService,
    path: web::Path<(FilmId, UserId)>,
) -> actix_web::Result<HttpResponse> {
    let (film_id, user_id) = path.into_inner();
    service.remove_like(film_id, user_id)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Undecodable JSON bodies get the same error body as validation failures.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ErrorBody {
            error: "invalid_payload",
            message: err.to_string(),
        });
        InternalError::from_response(err, response).into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/users", web::post().to(add_user))
        .route("/users", web::put().to(update_user))
        .route("/users", web::get().to(list_users))
        .route("/users/{id}", web::get().to(get_user))
        .route("/users/{id}/friends", web::get().to(friends))
        .route("/users/{id}/friends/{friend_id}", web::put().to(add_friend))
        .route("/users/{id}/friends/{friend_id}", web::delete().to(remove_friend))
        .route("/films", web::post().to(add_film))
        .route("/films", web::put().to(update_film))
        .route("/films", web::get().to(list_films))
        .route("/films/{id}", web::get().to(get_film))
        .route("/films/{id}/like/{user_id}", web::put().to(add_like))
        .route("/films/{id}/like/{user_id}", web::delete().to(remove_like));
}
