pub mod oauth;
pub mod session;
pub mod token_cache;
pub mod token_store;
