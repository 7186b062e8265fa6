//! WATHII 软删除审计与恢复服务
//! 评论、新闻、用户的软删除 / 恢复、审计查询导出与实时推送

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod output;
pub mod realtime;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
