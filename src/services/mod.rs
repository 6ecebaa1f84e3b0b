//! 业务逻辑服务模块
//! 
//! 封装报价获取、缓存、收盘价存储和排名计算

pub mod cache;          // 两层价格缓存
pub mod contest;        // 比赛数据加载
pub mod market;         // 交易时间
pub mod price_service;  // 价格读取与刷新
pub mod quotes;         // 报价接口
pub mod standings;      // 排名与统计
pub mod static_store;   // 收盘价文件
