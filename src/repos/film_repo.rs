/*
 * Responsibility
 * - films の保存先 (FilmRepo trait) と in-memory 実装
 * - owner (token の sub) 単位で見える範囲を絞る
 * - 削除は owner を見ない (admin role のみ route 側で許可)
 */
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Film {
    pub id: Uuid,
    pub title: String,
    pub owner_user_id: String,
}

/// Film storage, injected through `AppState`.
///
/// Implementations must be cheap to share (`Arc<dyn FilmRepo>`).
#[async_trait]
pub trait FilmRepo: Send + Sync {
    // Films owned by `owner`, in insertion order. Unknown owners get an empty list.
    async fn list_by_owner(&self, owner: &str) -> RepoResult<Vec<Film>>;

    // Store a new film; id and owner are assigned here, never taken from the client.
    async fn create(&self, owner: &str, title: &str) -> RepoResult<Film>;

    // Remove the film with `id` regardless of owner.
    //
    // Returns whether a record was removed. A missing id is not an error.
    async fn delete_by_id(&self, id: &str) -> RepoResult<bool>;
}

#[derive(Debug, Default)]
pub struct InMemoryFilmRepo {
    films: RwLock<Vec<Film>>,
}

impl InMemoryFilmRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.films
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RepoResult<RwLockReadGuard<'_, Vec<Film>>> {
        self.films.read().map_err(poisoned)
    }

    fn write(&self) -> RepoResult<RwLockWriteGuard<'_, Vec<Film>>> {
        self.films.write().map_err(poisoned)
    }
}

fn poisoned<T>(_: PoisonError<T>) -> RepoError {
    RepoError::Backend("film store lock poisoned".to_string())
}

#[async_trait]
impl FilmRepo for InMemoryFilmRepo {
    async fn list_by_owner(&self, owner: &str) -> RepoResult<Vec<Film>> {
        let films = self.read()?;

        Ok(films
            .iter()
            .filter(|f| f.owner_user_id == owner)
            .cloned()
            .collect())
    }

    async fn create(&self, owner: &str, title: &str) -> RepoResult<Film> {
        let film = Film {
            id: Uuid::new_v4(),
            title: title.to_string(),
            owner_user_id: owner.to_string(),
        };

        self.write()?.push(film.clone());

        Ok(film)
    }

    async fn delete_by_id(&self, id: &str) -> RepoResult<bool> {
        let mut films = self.write()?;

        let before = films.len();
        films.retain(|f| f.id.to_string() != id);

        Ok(films.len() != before)
    }
}
