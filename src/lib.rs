pub mod airtable;
pub mod command;
pub mod commands;
pub mod config;
pub mod dice;
pub mod http_server;
pub mod lunch;
pub mod message_components;
pub mod moderation;
pub mod slack;
