pub mod audio;
pub mod config;
pub mod document;
pub mod error;
pub mod geo;
pub mod layers;
pub mod models;
pub mod popup;
pub mod sidebar;
pub mod surface;
pub mod view;
