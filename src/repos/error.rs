/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    // Storage unusable (e.g. a writer panicked while holding the in-memory lock).
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type RepoResult<T> = Result<T, RepoError>;
