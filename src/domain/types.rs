// ==========================================
// 建材物料管理系统 - 领域类型定义
// ==========================================
// 职责: 物料/工程/占用/补货单/流水 的枚举状态
// 约定: 数据库存储统一使用 SCREAMING_SNAKE_CASE
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 物料类别 (Material Kind)
// ==========================================
// 红线: 玻璃/五金/通用库存统一为一个 Material，按 kind 区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaterialKind {
    Glass,            // 玻璃 (vidrio)
    Hardware,         // 五金 (herraje)
    GenericInventory, // 通用库存
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 3] = [
        MaterialKind::Glass,
        MaterialKind::Hardware,
        MaterialKind::GenericInventory,
    ];

    /// 从字符串解析（兼容数据库代码与展示名称）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
            "GLASS" | "VIDRIO" => Some(MaterialKind::Glass),
            "HARDWARE" | "HERRAJE" => Some(MaterialKind::Hardware),
            "GENERIC_INVENTORY" | "GENERICINVENTORY" | "INVENTARIO" => {
                Some(MaterialKind::GenericInventory)
            }
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MaterialKind::Glass => "GLASS",
            MaterialKind::Hardware => "HARDWARE",
            MaterialKind::GenericInventory => "GENERIC_INVENTORY",
        }
    }

    /// 展示名称（检索评分时参与 kind 字段匹配）
    pub fn label(&self) -> &'static str {
        match self {
            MaterialKind::Glass => "Glass",
            MaterialKind::Hardware => "Hardware",
            MaterialKind::GenericInventory => "Generic Inventory",
        }
    }
}

// ==========================================
// 物料状态 (Material Status)
// ==========================================
// 软删除: 停用而非物理删除
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaterialStatus {
    Active,      // 启用
    Deactivated, // 已停用
}

impl fmt::Display for MaterialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl MaterialStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Some(MaterialStatus::Active),
            "DEACTIVATED" => Some(MaterialStatus::Deactivated),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            MaterialStatus::Active => "ACTIVE",
            MaterialStatus::Deactivated => "DEACTIVATED",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, MaterialStatus::Active)
    }
}

// ==========================================
// 工程状态 (Project Status)
// ==========================================
// 工程由外部模块维护，本系统只读
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Planning,   // 规划中
    InProgress, // 施工中
    Paused,     // 暂停
    Completed,  // 已完工
    Cancelled,  // 已取消
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ProjectStatus {
    /// 从字符串解析状态（未知值按规划中处理）
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "IN_PROGRESS" => ProjectStatus::InProgress,
            "PAUSED" => ProjectStatus::Paused,
            "COMPLETED" => ProjectStatus::Completed,
            "CANCELLED" => ProjectStatus::Cancelled,
            _ => ProjectStatus::Planning,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "PLANNING",
            ProjectStatus::InProgress => "IN_PROGRESS",
            ProjectStatus::Paused => "PAUSED",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::Cancelled => "CANCELLED",
        }
    }

    /// 已关闭的工程不再接受物料占用
    pub fn is_closed(&self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Cancelled)
    }
}

// ==========================================
// 占用状态 (Allocation State)
// ==========================================
// 状态机: None → Active → Released (终态)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationState {
    Active,   // 占用中
    Released, // 已释放
}

impl fmt::Display for AllocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl AllocationState {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Some(AllocationState::Active),
            "RELEASED" => Some(AllocationState::Released),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AllocationState::Active => "ACTIVE",
            AllocationState::Released => "RELEASED",
        }
    }
}

// ==========================================
// 补货单状态 (Order Status)
// ==========================================
// 红线: RECEIVED 之后不可再变更
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,  // 待收货
    Received, // 已收货
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl OrderStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(OrderStatus::Pending),
            "RECEIVED" => Some(OrderStatus::Received),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Received => "RECEIVED",
        }
    }
}

// ==========================================
// 库存流水方向 (Movement Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    Ingress, // 入库
    Egress,  // 出库
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl MovementKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "INGRESS" => Some(MovementKind::Ingress),
            "EGRESS" => Some(MovementKind::Egress),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            MovementKind::Ingress => "INGRESS",
            MovementKind::Egress => "EGRESS",
        }
    }
}

// ==========================================
// 库存流水原因 (Movement Reason)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementReason {
    Allocation,   // 分配到工程
    Release,      // 工程释放
    OrderReceipt, // 补货单收货
    Adjustment,   // 人工库存修正
}

impl fmt::Display for MovementReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl MovementReason {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ALLOCATION" => Some(MovementReason::Allocation),
            "RELEASE" => Some(MovementReason::Release),
            "ORDER_RECEIPT" => Some(MovementReason::OrderReceipt),
            "ADJUSTMENT" => Some(MovementReason::Adjustment),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            MovementReason::Allocation => "ALLOCATION",
            MovementReason::Release => "RELEASE",
            MovementReason::OrderReceipt => "ORDER_RECEIPT",
            MovementReason::Adjustment => "ADJUSTMENT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_kind_parse() {
        assert_eq!(MaterialKind::from_str("GLASS"), Some(MaterialKind::Glass));
        assert_eq!(MaterialKind::from_str("vidrio"), Some(MaterialKind::Glass));
        assert_eq!(MaterialKind::from_str("herraje"), Some(MaterialKind::Hardware));
        assert_eq!(
            MaterialKind::from_str("Generic Inventory"),
            Some(MaterialKind::GenericInventory)
        );
        assert_eq!(MaterialKind::from_str("wood"), None);

        for kind in MaterialKind::ALL {
            assert_eq!(MaterialKind::from_str(kind.to_db_str()), Some(kind));
        }
    }

    #[test]
    fn test_project_status_closed() {
        assert!(ProjectStatus::Completed.is_closed());
        assert!(ProjectStatus::Cancelled.is_closed());
        assert!(!ProjectStatus::InProgress.is_closed());
        // 未知值按规划中处理
        assert_eq!(ProjectStatus::from_str("???"), ProjectStatus::Planning);
    }

    #[test]
    fn test_db_str_round_trip() {
        assert_eq!(OrderStatus::from_str(OrderStatus::Received.to_db_str()), Some(OrderStatus::Received));
        assert_eq!(MovementKind::from_str("egress"), Some(MovementKind::Egress));
        assert_eq!(MovementReason::from_str("ORDER_RECEIPT"), Some(MovementReason::OrderReceipt));
        assert_eq!(AllocationState::from_str("released"), Some(AllocationState::Released));
    }
}
