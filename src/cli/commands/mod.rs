pub mod chat;
pub mod config;
pub mod generate;
pub mod plan;
pub mod publish;
pub mod status;
