// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::NaiveDate;
use obra_ledger::domain::{NewMaterial, NewProject};
use obra_ledger::{MaterialKind, ProjectStatus};
use rust_decimal::Decimal;

// ==========================================
// NewMaterial 构建器
// ==========================================

pub struct MaterialBuilder {
    inner: NewMaterial,
}

impl MaterialBuilder {
    /// 按类别给出满足类别规则的默认值
    pub fn new(code: &str, kind: MaterialKind) -> Self {
        let (supplier, unit, thickness_mm) = match kind {
            MaterialKind::Glass => (None, Some("m2".to_string()), Some(6.0)),
            MaterialKind::Hardware => (Some("Herrajes Lomas".to_string()), None, None),
            MaterialKind::GenericInventory => (None, Some("pza".to_string()), None),
        };
        Self {
            inner: NewMaterial {
                code: code.to_string(),
                kind,
                description: format!("{} test material", code),
                supplier,
                unit,
                thickness_mm,
                unit_price: Decimal::ONE,
                initial_stock: 0,
                min_stock: 0,
            },
        }
    }

    pub fn glass(code: &str) -> Self {
        Self::new(code, MaterialKind::Glass)
    }

    pub fn hardware(code: &str) -> Self {
        Self::new(code, MaterialKind::Hardware)
    }

    pub fn description(mut self, description: &str) -> Self {
        self.inner.description = description.to_string();
        self
    }

    pub fn supplier(mut self, supplier: Option<&str>) -> Self {
        self.inner.supplier = supplier.map(str::to_string);
        self
    }

    pub fn unit(mut self, unit: Option<&str>) -> Self {
        self.inner.unit = unit.map(str::to_string);
        self
    }

    pub fn thickness(mut self, thickness_mm: Option<f64>) -> Self {
        self.inner.thickness_mm = thickness_mm;
        self
    }

    /// 单价，单位为分
    pub fn price_cents(mut self, cents: i64) -> Self {
        self.inner.unit_price = Decimal::new(cents, 2);
        self
    }

    pub fn stock(mut self, stock: i64) -> Self {
        self.inner.initial_stock = stock;
        self
    }

    pub fn min_stock(mut self, min_stock: i64) -> Self {
        self.inner.min_stock = min_stock;
        self
    }

    pub fn build(self) -> NewMaterial {
        self.inner
    }
}

// ==========================================
// NewProject 构建器
// ==========================================

pub struct ProjectBuilder {
    inner: NewProject,
}

impl ProjectBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            inner: NewProject {
                name: name.to_string(),
                status: ProjectStatus::InProgress,
                start_date: None,
                estimated_end_date: None,
                budget: Decimal::ZERO,
            },
        }
    }

    pub fn status(mut self, status: ProjectStatus) -> Self {
        self.inner.status = status;
        self
    }

    pub fn start(mut self, date: NaiveDate) -> Self {
        self.inner.start_date = Some(date);
        self
    }

    /// 原始文本，允许非法值
    pub fn end_raw(mut self, raw: &str) -> Self {
        self.inner.estimated_end_date = Some(raw.to_string());
        self
    }

    pub fn end(self, date: NaiveDate) -> Self {
        let raw = date.format("%Y-%m-%d").to_string();
        self.end_raw(&raw)
    }

    pub fn build(self) -> NewProject {
        self.inner
    }
}
