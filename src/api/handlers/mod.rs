pub mod films;
pub mod health;
