/// Database configuration and connection management
pub mod database;

/// Economy settings and achievement definitions loaded from config.toml
pub mod economy;
