pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod notes;
pub mod processor;
pub mod propagation;
pub mod rules;
pub mod services;
pub mod tenant;
pub mod types;
