pub mod dispatch;
pub mod handlers;
pub mod lifecycle;
pub mod service;
