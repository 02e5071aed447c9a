pub mod auth;
pub mod error;
pub mod lists;
pub mod middleware;
pub mod movies;
pub mod ratings;
pub mod tmdb;
