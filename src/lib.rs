pub mod booking;
pub mod calendar;
pub mod compactor;
pub mod config;
pub mod http;
pub mod limits;
pub mod model;
pub mod observability;
pub mod seed;
pub mod store;
pub mod validate;
pub mod wal;
