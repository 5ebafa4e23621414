pub mod credentials;
pub mod middleware;
