pub mod models;
pub mod scheduler;
pub mod config;
pub mod bot_strategy;
pub mod bot_profiles;
pub mod simulator;
pub mod arena;
pub mod replay;
pub mod session;
