// ==========================================
// 建材物料管理系统 - 入参校验
// ==========================================
// 职责: 数量/价格/新建物料的字段校验（不访问数据库）
// 规则来源: domain::material::KIND_RULES
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::material::{KindRules, NewMaterial};
use rust_decimal::Decimal;

/// 数量必须为正
pub fn validate_positive_quantity(quantity: i64) -> ApiResult<()> {
    if quantity <= 0 {
        return Err(ApiError::ValidationError(format!(
            "数量必须大于0: quantity={}",
            quantity
        )));
    }
    Ok(())
}

/// 整数字段不得为负
pub fn validate_non_negative(field: &str, value: i64) -> ApiResult<()> {
    if value < 0 {
        return Err(ApiError::ValidationError(format!(
            "{}不能为负: {}",
            field, value
        )));
    }
    Ok(())
}

/// 单价必须为正
pub fn validate_price(price: Decimal) -> ApiResult<()> {
    if price <= Decimal::ZERO {
        return Err(ApiError::ValidationError(format!(
            "单价必须大于0: unit_price={}",
            price
        )));
    }
    Ok(())
}

/// 必填文本（已清洗）
pub fn require_text(field: &str, value: &str) -> ApiResult<()> {
    if value.is_empty() {
        return Err(ApiError::ValidationError(format!("{}不能为空", field)));
    }
    Ok(())
}

/// 新建物料校验
///
/// # 规则
/// - 编码非空，单价 > 0，初始库存/最低库存 ≥ 0
/// - 按类别查表: 玻璃厚度 > 0；必填供应商/计量单位
pub fn validate_new_material(material: &NewMaterial) -> ApiResult<()> {
    require_text("物料编码", &material.code)?;
    validate_price(material.unit_price)?;
    validate_non_negative("初始库存", material.initial_stock)?;
    validate_non_negative("最低库存", material.min_stock)?;

    let rules = KindRules::for_kind(material.kind);

    if rules.requires_thickness {
        match material.thickness_mm {
            Some(t) if t.is_finite() && t > 0.0 => {}
            other => {
                return Err(ApiError::ValidationError(format!(
                    "{}必须填写正的厚度: thickness_mm={:?}",
                    material.kind.label(),
                    other
                )))
            }
        }
    }

    if rules.requires_supplier && is_blank(material.supplier.as_deref()) {
        return Err(ApiError::ValidationError(format!(
            "{}必须填写供应商",
            material.kind.label()
        )));
    }

    if rules.requires_unit && is_blank(material.unit.as_deref()) {
        return Err(ApiError::ValidationError(format!(
            "{}必须填写计量单位",
            material.kind.label()
        )));
    }

    Ok(())
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|s| s.trim().is_empty()).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::MaterialKind;
    use rust_decimal_macros::dec;

    fn glass() -> NewMaterial {
        NewMaterial {
            code: "VT-6".to_string(),
            kind: MaterialKind::Glass,
            description: "vidrio templado 6mm".to_string(),
            supplier: None,
            unit: Some("m2".to_string()),
            thickness_mm: Some(6.0),
            unit_price: dec!(420.50),
            initial_stock: 10,
            min_stock: 2,
        }
    }

    #[test]
    fn test_valid_glass() {
        assert!(validate_new_material(&glass()).is_ok());
    }

    #[test]
    fn test_glass_requires_positive_thickness() {
        let mut m = glass();
        m.thickness_mm = Some(0.0);
        assert!(matches!(validate_new_material(&m), Err(ApiError::ValidationError(_))));
        m.thickness_mm = None;
        assert!(validate_new_material(&m).is_err());
    }

    #[test]
    fn test_hardware_requires_supplier() {
        let mut m = glass();
        m.kind = MaterialKind::Hardware;
        m.thickness_mm = None;
        m.unit = None;
        assert!(validate_new_material(&m).is_err());
        m.supplier = Some("Herrajes del Norte".to_string());
        assert!(validate_new_material(&m).is_ok());
    }

    #[test]
    fn test_price_and_stock_rules() {
        let mut m = glass();
        m.unit_price = Decimal::ZERO;
        assert!(validate_new_material(&m).is_err());

        let mut m = glass();
        m.initial_stock = -1;
        assert!(validate_new_material(&m).is_err());

        let mut m = glass();
        m.code = String::new();
        assert!(validate_new_material(&m).is_err());

        assert!(validate_positive_quantity(0).is_err());
        assert!(validate_positive_quantity(1).is_ok());
    }
}
