use crate::error::{Error, Result};
use crate::model::{Film, User};
use chrono::NaiveDate;
use log::{info, warn};

pub const MAX_DESCRIPTION_LEN: usize = 200;

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn check_not_future(field: &'static str, date: Option<NaiveDate>, today: NaiveDate) -> Result<()> {
    let date = date.ok_or(Error::MissingField { field })?;
    if date > today {
        return Err(Error::FutureDate { field, date });
    }
    Ok(())
}

/// Checks a user before it is stored. A blank name is replaced by the login.
pub fn validate_user(user: &mut User, today: NaiveDate) -> Result<()> {
    check_user(user, today).map_err(|err| {
        warn!("Rejected user {:?}: {}", user.login, err);
        err
    })?;
    if is_blank(&user.name) {
        info!("User {:?} has no name, using login", user.login);
        user.name = user.login.clone();
    }
    Ok(())
}

fn check_user(user: &User, today: NaiveDate) -> Result<()> {
    if is_blank(&user.email) {
        return Err(Error::EmptyField { field: "email" });
    }
    if !user.email.contains('@') {
        return Err(Error::InvalidFormat {
            field: "email",
            reason: "must contain '@'",
        });
    }
    if is_blank(&user.login) {
        return Err(Error::EmptyField { field: "login" });
    }
    if user.login.chars().any(char::is_whitespace) {
        return Err(Error::InvalidFormat {
            field: "login",
            reason: "must not contain whitespace",
        });
    }
    check_not_future("birthday", user.birthday, today)
}

pub fn validate_film(film: &Film, today: NaiveDate) -> Result<()> {
    check_film(film, today).map_err(|err| {
        warn!("Rejected film {:?}: {}", film.name, err);
        err
    })
}

fn check_film(film: &Film, today: NaiveDate) -> Result<()> {
    if is_blank(&film.name) {
        return Err(Error::EmptyField { field: "name" });
    }
    let len = film.description.chars().count();
    if len > MAX_DESCRIPTION_LEN {
        return Err(Error::TooLong {
            field: "description",
            max: MAX_DESCRIPTION_LEN,
            len,
        });
    }
    check_not_future("releaseDate", film.release_date, today)?;
    if film.duration <= 0 {
        return Err(Error::NotPositive {
            field: "duration",
            value: film.duration.into(),
        });
    }
    Ok(())
}
