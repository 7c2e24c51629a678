use crate::error::Error;
use crate::model::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::TransactionError;
use std::convert::TryInto;

// Big-endian keys keep tree iteration in id order.
fn serialize_id(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

fn deserialize_id(id: Option<&[u8]>) -> u64 {
    id.and_then(|bytes| bytes.try_into().ok())
        .map(u64::from_be_bytes)
        .unwrap_or(0)
}

fn increment(old: Option<&[u8]>) -> Option<Vec<u8>> {
    Some(serialize_id(deserialize_id(old) + 1).to_vec())
}

pub trait UserDb {
    type Error;
    fn add_user(&self, user: User) -> Result<User, Self::Error>;
    fn update_user(&self, user: User) -> Result<User, Self::Error>;
    /// Writes two users atomically. Readers see both or neither.
    fn update_users(&self, a: User, b: User) -> Result<(User, User), Self::Error>;
    fn get_user(&self, id: UserId) -> Result<Option<User>, Self::Error>;
    fn list_users(&self) -> Result<Vec<User>, Self::Error>;
}

pub trait FilmDb {
    type Error;
    fn add_film(&self, film: Film) -> Result<Film, Self::Error>;
    fn update_film(&self, film: Film) -> Result<Film, Self::Error>;
    fn get_film(&self, id: FilmId) -> Result<Option<Film>, Self::Error>;
    fn list_films(&self) -> Result<Vec<Film>, Self::Error>;
}

const USERS: &[u8] = b"users";
const FILMS: &[u8] = b"films";
const IDS: &[u8] = b"ids";

/// Allocates the next id for `tree`. Each entity tree counts from 1.
fn next_id(db: &sled::Db, tree: &[u8]) -> Result<u64, Error> {
    let ids = db.open_tree(IDS)?;
    let id = ids.update_and_fetch(tree, increment)?;
    Ok(deserialize_id(id.as_deref()))
}

fn put<T: Serialize>(db: &sled::Db, tree: &[u8], id: u64, value: &T) -> Result<(), Error> {
    let tree = db.open_tree(tree)?;
    tree.insert(&serialize_id(id), bincode::serialize(value)?)?;
    Ok(())
}

fn get<T: DeserializeOwned>(db: &sled::Db, tree: &[u8], id: u64) -> Result<Option<T>, Error> {
    let tree = db.open_tree(tree)?;
    match tree.get(serialize_id(id))? {
        Some(data) => Ok(Some(bincode::deserialize(&data)?)),
        None => Ok(None),
    }
}

fn list<T: DeserializeOwned>(db: &sled::Db, tree: &[u8]) -> Result<Vec<T>, Error> {
    let tree = db.open_tree(tree)?;
    tree.iter()
        .values()
        .map(|data| -> Result<T, Error> { Ok(bincode::deserialize(&data?)?) })
        .collect()
}

impl UserDb for sled::Db {
    type Error = Error;

    fn add_user(&self, mut user: User) -> Result<User, Error> {
        user.id = next_id(self, USERS)?;
        put(self, USERS, user.id, &user)?;
        Ok(user)
    }

    fn update_user(&self, user: User) -> Result<User, Error> {
        put(self, USERS, user.id, &user)?;
        Ok(user)
    }

    fn update_users(&self, a: User, b: User) -> Result<(User, User), Error> {
        let users = self.open_tree(USERS)?;
        let entries = [
            (serialize_id(a.id), bincode::serialize(&a)?),
            (serialize_id(b.id), bincode::serialize(&b)?),
        ];
        users
            .transaction(|tx| {
                for (key, value) in &entries {
                    tx.insert(&key[..], value.as_slice())?;
                }
                Ok(())
            })
            .map_err(|e: TransactionError<()>| match e {
                TransactionError::Storage(s) => s,
                TransactionError::Abort(()) => {
                    sled::Error::Unsupported("user update aborted".to_owned())
                }
            })?;
        Ok((a, b))
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>, Error> {
        get(self, USERS, id)
    }

    fn list_users(&self) -> Result<Vec<User>, Error> {
        list(self, USERS)
    }
}

impl FilmDb for sled::Db {
    type Error = Error;

    fn add_film(&self, mut film: Film) -> Result<Film, Error> {
        film.id = next_id(self, FILMS)?;
        put(self, FILMS, film.id, &film)?;
        Ok(film)
    }

    fn update_film(&self, film: Film) -> Result<Film, Error> {
        put(self, FILMS, film.id, &film)?;
        Ok(film)
    }

    fn get_film(&self, id: FilmId) -> Result<Option<Film>, Error> {
        get(self, FILMS, id)
    }

    fn list_films(&self) -> Result<Vec<Film>, Error> {
        list(self, FILMS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn db() -> sled::Db {
        sled::Config::new().temporary(true).open().unwrap()
    }

    fn user(login: &str) -> User {
        User {
            login: login.to_owned(),
            ..User::default()
        }
    }

    #[rstest]
    fn ids_start_at_one_per_entity(db: sled::Db) {
        let first = db.add_user(user("a")).unwrap();
        let second = db.add_user(user("b")).unwrap();
        let film = db.add_film(Film::default()).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(film.id, 1);
    }

    #[rstest]
    fn add_ignores_client_id(db: sled::Db) {
        let mut u = user("a");
        u.id = 42;
        assert_eq!(db.add_user(u).unwrap().id, 1);
        assert!(db.get_user(42).unwrap().is_none());
    }

    #[rstest]
    fn get_returns_stored_user(db: sled::Db) {
        let mut u = user("a");
        u.friends.insert(7);
        let stored = db.add_user(u).unwrap();
        assert_eq!(db.get_user(stored.id).unwrap(), Some(stored));
        assert_eq!(db.get_user(99).unwrap(), None);
    }

    #[rstest]
    fn update_replaces_value(db: sled::Db) {
        let mut film = db.add_film(Film::default()).unwrap();
        film.name = "Renamed".to_owned();
        film.likes.insert(3);
        db.update_film(film.clone()).unwrap();
        assert_eq!(db.get_film(film.id).unwrap(), Some(film));
    }

    #[rstest]
    fn update_users_writes_both(db: sled::Db) {
        let mut a = db.add_user(user("a")).unwrap();
        let mut b = db.add_user(user("b")).unwrap();
        a.friends.insert(b.id);
        b.friends.insert(a.id);
        db.update_users(a.clone(), b.clone()).unwrap();
        assert_eq!(db.get_user(a.id).unwrap(), Some(a));
        assert_eq!(db.get_user(b.id).unwrap(), Some(b));
    }

    #[rstest]
    fn list_is_ordered_by_id(db: sled::Db) {
        for login in &["a", "b", "c"] {
            db.add_user(user(login)).unwrap();
        }
        // little-endian keys would sort 256 before 1
        for _ in 0..300 {
            db.add_film(Film::default()).unwrap();
        }
        let logins: Vec<_> = db.list_users().unwrap().into_iter().map(|u| u.login).collect();
        assert_eq!(logins, vec!["a", "b", "c"]);
        let ids: Vec<_> = db.list_films().unwrap().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, (1..=300).collect::<Vec<_>>());
    }

    #[rstest]
    fn databases_are_isolated(db: sled::Db) {
        let other = sled::Config::new().temporary(true).open().unwrap();
        db.add_user(user("a")).unwrap();
        assert!(other.list_users().unwrap().is_empty());
    }
}
