use crate::database::{FilmDb, UserDb};
use crate::error::{Entity, Error, Result};
use crate::model::*;
use crate::validation::{validate_film, validate_user};
use chrono::{Local, NaiveDate};
use log::{info, warn};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// What an update does with the relationship sets (friends, likes) of the incoming payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationPolicy {
    /// Keep the stored sets and ignore the payload's.
    Preserve,
    /// Overwrite the stored sets with the payload's. Symmetry of friendships is not checked.
    Replace,
}

impl Default for RelationPolicy {
    fn default() -> Self {
        RelationPolicy::Preserve
    }
}

impl FromStr for RelationPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preserve" => Ok(RelationPolicy::Preserve),
            "replace" => Ok(RelationPolicy::Replace),
            other => Err(format!("expected preserve or replace, got {:?}", other)),
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub struct Service<D> {
    db: D,
    policy: RelationPolicy,
    // Held across every read-modify-write so friend symmetry and like sets stay consistent.
    write: Mutex<()>,
}

impl<D> Service<D>
where
    D: UserDb<Error = Error> + FilmDb<Error = Error>,
{
    pub fn new(db: D, policy: RelationPolicy) -> Self {
        Service {
            db,
            policy,
            write: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_user(&self, mut user: User) -> Result<User> {
        validate_user(&mut user, today())?;
        let _guard = self.lock();
        let user = self.db.add_user(user)?;
        info!("Added user {} ({})", user.id, user.login);
        Ok(user)
    }

    pub fn update_user(&self, mut user: User) -> Result<User> {
        let _guard = self.lock();
        let stored = self.get_user(user.id)?;
        validate_user(&mut user, today())?;
        if self.policy == RelationPolicy::Preserve {
            user.friends = stored.friends;
        }
        let user = self.db.update_user(user)?;
        info!("Updated user {}", user.id);
        Ok(user)
    }

    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.db.get_user(id)?.ok_or_else(|| {
            warn!("User {} not found", id);
            Error::not_found(Entity::User, id)
        })
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        self.db.list_users()
    }

    /// Users in the friend set of `id`. Ids that no longer resolve are skipped.
    pub fn friends(&self, id: UserId) -> Result<Vec<User>> {
        let user = self.get_user(id)?;
        let mut friends = Vec::with_capacity(user.friends.len());
        for friend_id in &user.friends {
            if let Some(friend) = self.db.get_user(*friend_id)? {
                friends.push(friend);
            }
        }
        Ok(friends)
    }

    pub fn add_friend(&self, user_id: UserId, friend_id: UserId) -> Result<()> {
        let _guard = self.lock();
        let mut user = self.get_user(user_id)?;
        let mut friend = self.get_user(friend_id)?;
        if user_id == friend_id {
            user.friends.insert(user_id);
            self.db.update_user(user)?;
        } else {
            user.friends.insert(friend_id);
            friend.friends.insert(user_id);
            self.db.update_users(user, friend)?;
        }
        info!("User {} added user {} as a friend", user_id, friend_id);
        Ok(())
    }

    pub fn remove_friend(&self, user_id: UserId, friend_id: UserId) -> Result<()> {
        let _guard = self.lock();
        let mut user = self.get_user(user_id)?;
        let mut friend = self.get_user(friend_id)?;
        if user_id == friend_id {
            user.friends.remove(&user_id);
            self.db.update_user(user)?;
        } else {
            user.friends.remove(&friend_id);
            friend.friends.remove(&user_id);
            self.db.update_users(user, friend)?;
        }
        info!("User {} removed user {} from friends", user_id, friend_id);
        Ok(())
    }

    pub fn add_film(&self, film: Film) -> Result<Film> {
        validate_film(&film, today())?;
        let _guard = self.lock();
        let film = self.db.add_film(film)?;
        info!("Added film {} ({})", film.id, film.name);
        Ok(film)
    }

    pub fn update_film(&self, mut film: Film) -> Result<Film> {
        let _guard = self.lock();
        let stored = self.get_film(film.id)?;
        validate_film(&film, today())?;
        if self.policy == RelationPolicy::Preserve {
            film.likes = stored.likes;
        }
        let film = self.db.update_film(film)?;
        info!("Updated film {}", film.id);
        Ok(film)
    }

    pub fn get_film(&self, id: FilmId) -> Result<Film> {
        self.db.get_film(id)?.ok_or_else(|| {
            warn!("Film {} not found", id);
            Error::not_found(Entity::Film, id)
        })
    }

    pub fn list_films(&self) -> Result<Vec<Film>> {
        self.db.list_films()
    }

    pub fn add_like(&self, film_id: FilmId, user_id: UserId) -> Result<()> {
        let _guard = self.lock();
        let mut film = self.get_film(film_id)?;
        self.get_user(user_id)?;
        film.likes.insert(user_id);
        self.db.update_film(film)?;
        info!("User {} liked film {}", user_id, film_id);
        Ok(())
    }

    pub fn remove_like(&self, film_id: FilmId, user_id: UserId) -> Result<()> {
        let _guard = self.lock();
        let mut film = self.get_film(film_id)?;
        self.get_user(user_id)?;
        film.likes.remove(&user_id);
        self.db.update_film(film)?;
        info!("User {} removed like from film {}", user_id, film_id);
        Ok(())
    }
}
