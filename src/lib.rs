pub mod character;
pub mod character_fetch;
pub mod config;
pub mod dice;
pub mod http_client;
pub mod provider;
pub mod state;
