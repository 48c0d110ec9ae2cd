//! # 测试框架模块
//!
//! 提供单元测试共用的 fixtures 和辅助函数

pub mod fixtures;
pub mod helpers;
