pub mod canvas;
pub mod clock;
pub mod config;
pub mod images;
pub mod mode;
pub mod registry;
