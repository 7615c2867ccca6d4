pub mod core {
    pub mod config;
    pub mod error;
    pub mod tracing_init;
}

pub mod api {
    pub mod client;
    pub mod endpoints;
}

pub mod stores {
    pub mod torrent_store;
}

pub mod classify;
pub mod commands;
pub mod models;
pub mod utils;
pub mod view;
