pub mod intake;
pub mod model;
pub mod repository;
pub mod repository_sqlx;
