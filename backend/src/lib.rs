//! Ingredient photo classification service.
//!
//! `POST /predict` runs an uploaded photo through the bundled classifier and
//! `POST /feedback` keeps a like/dislike tally on disk. Both sit behind a
//! single Basic credential pair and require `Accept: application/json`.

pub mod auth;
pub mod config;
pub mod feedback;
pub mod inference;
pub mod routes;
