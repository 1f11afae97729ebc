pub mod handler;
pub mod useragent;
