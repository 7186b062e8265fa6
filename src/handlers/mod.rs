//! HTTP 处理器模块

pub mod audit;
pub mod health;
pub mod news;
pub mod review;
pub mod stream;
pub mod subject;
pub mod user;
