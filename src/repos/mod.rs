pub mod error;
pub mod film_repo;

pub use film_repo::{Film, FilmRepo, InMemoryFilmRepo};
