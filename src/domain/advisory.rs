// ==========================================
// 医院就诊负荷预测 - 建议 / 排班 / 健康风险领域模型
// ==========================================
// 每次调用新建，不持久化
// ==========================================

use crate::domain::types::{AdvisoryType, Severity};
use serde::{Deserialize, Serialize};

// ==========================================
// Advisory - 公众建议
// ==========================================
// 列表顺序即生成顺序（容量 → 空气 → 疫情 → 气温），不按严重度排序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    #[serde(rename = "type")]
    pub advisory_type: AdvisoryType, // 建议类型
    pub severity: Severity,          // 严重度
    pub message: String,             // 消息
    pub recommendation: String,      // 建议措施
    pub icon: String,                // 图标
}

// ==========================================
// ShiftStaffing - 单班次人员配置
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShiftStaffing {
    pub doctors: u32,
    pub nurses: u32,
    pub support: u32,
}

impl ShiftStaffing {
    pub fn total(&self) -> u32 {
        self.doctors + self.nurses + self.support
    }
}

impl std::ops::Add for ShiftStaffing {
    type Output = ShiftStaffing;

    fn add(self, rhs: ShiftStaffing) -> ShiftStaffing {
        ShiftStaffing {
            doctors: self.doctors + rhs.doctors,
            nurses: self.nurses + rhs.nurses,
            support: self.support + rhs.support,
        }
    }
}

// ==========================================
// StaffingPlan - 三班次排班建议
// ==========================================
// 不变式: morning + evening + night == required（夜班吸收取整余数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffingPlan {
    pub morning: ShiftStaffing,
    pub evening: ShiftStaffing,
    pub night: ShiftStaffing,
    pub required: ShiftStaffing, // 各岗位总需求
}

// ==========================================
// HealthRisk - 当前健康风险条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRisk {
    pub title: String,
    pub severity: Severity,
    pub description: String,
    pub icon: String,
}

/// 健康风险评估结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRiskAssessment {
    pub current_risks: Vec<HealthRisk>, // 风险列表（生成顺序）
    pub risk_level: Severity,           // 整体风险 = 最高严重度，无风险时 LOW
    pub recommendations: Vec<String>,   // 建议（健康提示）
}
