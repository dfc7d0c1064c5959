// ==========================================
// 物流枢纽流转系统 - 领域类型定义
// ==========================================
// 职责: 各实体状态、方向、异常分类与严重等级
// 存储: 全部以 SCREAMING_SNAKE_CASE 字符串落库
// ==========================================

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 枚举字符串解析失败
#[derive(Debug, Clone, Error)]
#[error("无法识别的{kind}取值: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

// 字符串枚举: as_str / FromStr / Display / ToSql / FromSql
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// 转换为字符串 (用于数据库存储)
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: ParseEnumError| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

// ==========================================
// 收货批次状态 (Intake Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntakeStatus {
    Pending,    // 待收货
    InProgress, // 收货中
    Done,       // 收货完成
    Exception,  // 异常
}

string_enum!(IntakeStatus, "收货状态", {
    Pending => "PENDING",
    InProgress => "IN_PROGRESS",
    Done => "DONE",
    Exception => "EXCEPTION",
});

// ==========================================
// 运输方向 (Direction)
// ==========================================
// 入库运输 / 出库运输，也用于核对方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    In,
    Out,
}

string_enum!(Direction, "方向", {
    In => "IN",
    Out => "OUT",
});

// ==========================================
// 运输状态 (Transport Status)
// ==========================================
// 红线: 单调推进, CANCELLED 只能从未终结状态进入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportStatus {
    Created,   // 已创建
    InTransit, // 在途
    Received,  // 已到货
    Delivered, // 已送达 (出库线路完结)
    Cancelled, // 已取消
}

string_enum!(TransportStatus, "运输状态", {
    Created => "CREATED",
    InTransit => "IN_TRANSIT",
    Received => "RECEIVED",
    Delivered => "DELIVERED",
    Cancelled => "CANCELLED",
});

impl TransportStatus {
    fn rank(&self) -> Option<u8> {
        match self {
            TransportStatus::Created => Some(0),
            TransportStatus::InTransit => Some(1),
            TransportStatus::Received => Some(2),
            TransportStatus::Delivered => Some(3),
            TransportStatus::Cancelled => None,
        }
    }

    /// 是否为终结状态
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransportStatus::Delivered | TransportStatus::Cancelled)
    }

    /// 判断状态迁移是否合法
    ///
    /// - 按 CREATED → IN_TRANSIT → RECEIVED → DELIVERED 前进 (允许跳级)
    /// - CANCELLED 只能从 CREATED / IN_TRANSIT 进入
    pub fn can_transition_to(&self, next: TransportStatus) -> bool {
        if next == TransportStatus::Cancelled {
            return matches!(self, TransportStatus::Created | TransportStatus::InTransit);
        }
        match (self.rank(), next.rank()) {
            (Some(from), Some(to)) => to > from,
            _ => false,
        }
    }
}

// ==========================================
// 核对状态 (Conference Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConferenceStatus {
    Pending,
    InProgress,
    Done,
}

string_enum!(ConferenceStatus, "核对状态", {
    Pending => "PENDING",
    InProgress => "IN_PROGRESS",
    Done => "DONE",
});

// ==========================================
// 订单状态 (Order Status)
// ==========================================
// 红线: 沿流水线单调推进; EXCEPTION / CANCELLED 可从任意未终结状态进入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    InTransit,          // 揽收完成, 在途往枢纽
    AwaitingConference, // 待入库核对
    Validated,
    InStock,            // 在库
    AwaitingSeparation, // 待拣货
    AwaitingShipment,   // 拣货完成, 待发运
    EnRoute,            // 配送中
    Delivered,          // 已送达
    Cancelled,
    Exception,
}

string_enum!(OrderStatus, "订单状态", {
    Pending => "PENDING",
    Processing => "PROCESSING",
    InTransit => "IN_TRANSIT",
    AwaitingConference => "AWAITING_CONFERENCE",
    Validated => "VALIDATED",
    InStock => "IN_STOCK",
    AwaitingSeparation => "AWAITING_SEPARATION",
    AwaitingShipment => "AWAITING_SHIPMENT",
    EnRoute => "EN_ROUTE",
    Delivered => "DELIVERED",
    Cancelled => "CANCELLED",
    Exception => "EXCEPTION",
});

impl OrderStatus {
    fn pipeline_rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Processing => Some(1),
            OrderStatus::InTransit => Some(2),
            OrderStatus::AwaitingConference => Some(3),
            OrderStatus::Validated => Some(4),
            OrderStatus::InStock => Some(5),
            OrderStatus::AwaitingSeparation => Some(6),
            OrderStatus::AwaitingShipment => Some(7),
            OrderStatus::EnRoute => Some(8),
            OrderStatus::Delivered => Some(9),
            OrderStatus::Cancelled | OrderStatus::Exception => None,
        }
    }

    /// 是否为终结状态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Exception
        )
    }

    /// 判断订单能否推进到目标状态
    ///
    /// 同状态视为幂等推进 (允许)
    pub fn can_advance_to(&self, next: OrderStatus) -> bool {
        if *self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match (self.pipeline_rank(), next.pipeline_rank()) {
            (Some(from), Some(to)) => to > from,
            // EXCEPTION / CANCELLED
            (_, None) => true,
            (None, _) => false,
        }
    }
}

// ==========================================
// 拣货 / 揽收 / 线路 / 站点状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeparationStatus {
    Pending,
    Separated,
}

string_enum!(SeparationStatus, "拣货状态", {
    Pending => "PENDING",
    Separated => "SEPARATED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionStatus {
    Pending,
    Realized,
    Cancelled,
}

string_enum!(CollectionStatus, "揽收状态", {
    Pending => "PENDING",
    Realized => "REALIZED",
    Cancelled => "CANCELLED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteStatus {
    Created,
    InProgress,
    Finished,
}

string_enum!(RouteStatus, "线路状态", {
    Created => "CREATED",
    InProgress => "IN_PROGRESS",
    Finished => "FINISHED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopStatus {
    Pending,
    Delivered,
}

string_enum!(StopStatus, "站点状态", {
    Pending => "PENDING",
    Delivered => "DELIVERED",
});

// ==========================================
// 异常分类 (Exception Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionCategory {
    Divergence, // 数量差异
    Avaria,     // 货损
    Backlog,    // 库存缺失
    Noshow,     // 司机缺席
    Atraso,     // 揽收延误
    Parcel,     // 部分未送达
    Extraviado, // 流程中丢失
    Outros,     // 其他
}

string_enum!(ExceptionCategory, "异常分类", {
    Divergence => "DIVERGENCE",
    Avaria => "AVARIA",
    Backlog => "BACKLOG",
    Noshow => "NOSHOW",
    Atraso => "ATRASO",
    Parcel => "PARCEL",
    Extraviado => "EXTRAVIADO",
    Outros => "OUTROS",
});

// ==========================================
// 严重等级 (Severity)
// ==========================================
// 等级制, 可比较
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

string_enum!(Severity, "严重等级", {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
    Critical => "CRITICAL",
});

// ==========================================
// 异常处理状态 (Exception Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionStatus {
    Open,
    InAnalysis,
    Resolved,
    Closed,
}

string_enum!(ExceptionStatus, "异常状态", {
    Open => "OPEN",
    InAnalysis => "IN_ANALYSIS",
    Resolved => "RESOLVED",
    Closed => "CLOSED",
});

impl ExceptionStatus {
    /// OPEN → IN_ANALYSIS → RESOLVED → CLOSED, RESOLVED 可重新打开
    pub fn can_transition_to(&self, next: ExceptionStatus) -> bool {
        use ExceptionStatus::*;
        matches!(
            (self, next),
            (Open, InAnalysis)
                | (Open, Resolved)
                | (InAnalysis, Resolved)
                | (InAnalysis, Open)
                | (Resolved, Closed)
                | (Resolved, Open)
        )
    }
}
