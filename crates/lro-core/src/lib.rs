pub mod config;
pub mod logging;

pub mod cancel;
pub mod error;
pub mod http;
pub mod kinds;
pub mod lro;
pub mod retry;
pub mod sleep;
