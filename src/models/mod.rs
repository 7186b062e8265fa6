//! 数据模型模块
//! 可软删除的对象（评论、新闻、用户）及其审计记录

pub mod audit;
pub mod news;
pub mod review;
pub mod subject;
pub mod user;

pub use audit::*;
pub use news::*;
pub use review::*;
pub use subject::*;
pub use user::*;
