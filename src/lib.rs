pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod local;
pub mod node;
pub mod pool;
pub mod push;
pub mod service;
pub mod shutdown;
pub mod sms;
pub mod store;
pub mod worker;
