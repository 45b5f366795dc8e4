// ==========================================
// 建材物料管理系统 - 物料检索评分引擎
// ==========================================
// 红线: Engine 不拼 SQL
// ==========================================
// 评分规则（不区分大小写）:
// - 编码完全一致 100，编码包含 50（二者取其一）
// - 类别包含 +30，描述包含 +20，供应商包含 +10
// - 0 分剔除；同分保持输入顺序（稳定排序）
// ==========================================

use crate::domain::material::Material;
use serde::{Deserialize, Serialize};

pub const SCORE_CODE_EXACT: u32 = 100;
pub const SCORE_CODE_CONTAINS: u32 = 50;
pub const SCORE_KIND_CONTAINS: u32 = 30;
pub const SCORE_DESCRIPTION_CONTAINS: u32 = 20;
pub const SCORE_SUPPLIER_CONTAINS: u32 = 10;

/// 检索命中项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub material: Material,
    pub score: u32,
}

// ==========================================
// MaterialSearchEngine - 检索评分
// ==========================================
pub struct MaterialSearchEngine;

impl MaterialSearchEngine {
    /// 计算单个物料的得分
    ///
    /// `term_lower` 须已转小写且非空
    pub fn score(material: &Material, term_lower: &str) -> u32 {
        let mut score = 0;

        let code = material.code.to_lowercase();
        if code == term_lower {
            score += SCORE_CODE_EXACT;
        } else if code.contains(term_lower) {
            score += SCORE_CODE_CONTAINS;
        }

        let kind = &material.kind;
        if kind.label().to_lowercase().contains(term_lower)
            || kind.to_db_str().to_lowercase().contains(term_lower)
        {
            score += SCORE_KIND_CONTAINS;
        }

        if material.description.to_lowercase().contains(term_lower) {
            score += SCORE_DESCRIPTION_CONTAINS;
        }

        if material
            .supplier
            .as_deref()
            .map(|s| s.to_lowercase().contains(term_lower))
            .unwrap_or(false)
        {
            score += SCORE_SUPPLIER_CONTAINS;
        }

        score
    }

    /// 评分、过滤、排序并截断
    ///
    /// # 参数
    /// - `candidates`: 候选物料（按 id 升序传入）
    /// - `term`: 已清洗的检索词
    /// - `limit`: 结果上限
    pub fn rank(candidates: Vec<Material>, term: &str, limit: usize) -> Vec<SearchHit> {
        let term_lower = term.trim().to_lowercase();
        if term_lower.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = candidates
            .into_iter()
            .filter_map(|material| {
                let score = Self::score(&material, &term_lower);
                (score > 0).then_some(SearchHit { material, score })
            })
            .collect();

        // sort_by 为稳定排序
        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(limit);
        hits
    }
}
