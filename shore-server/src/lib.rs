// Library exports for shore-server
// The migration CLI and integration tests build on these modules

pub mod api;
pub mod config;
pub mod db;
pub mod geo;
pub mod password;
pub mod routes;
pub mod session;
pub mod state;
pub mod tides;
pub mod validation;
