// ==========================================
// 物流枢纽流转系统 - 运营异常数据仓储
// ==========================================
// 表: pipeline_exception / exception_history
// 红线: 历史表只追加 (库表触发器兜底)
// ==========================================

mod core;
mod queries;

#[cfg(test)]
mod tests;

pub use self::core::ExceptionRepository;
pub use self::queries::CategorySummary;
