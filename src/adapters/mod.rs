// Adapters layer: concrete implementations for external systems (http, passport registry, storage).

pub mod http;
pub mod passport_client;
pub mod storage;
