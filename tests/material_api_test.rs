// ==========================================
// MaterialApi 集成测试
// ==========================================
// 测试范围:
// 1. 新建: 类别规则校验、编码唯一、初始库存流水
// 2. 修正: 库存/单价/最低库存
// 3. 停用: 有占用时拒绝
// ==========================================

mod helpers;

use helpers::api_test_helper::LedgerTestEnv;
use helpers::test_data_builder::{MaterialBuilder, ProjectBuilder};
use obra_ledger::domain::audit_module;
use obra_ledger::{ApiError, MaterialKind, MaterialStatus, MovementKind};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ==========================================
// 新建
// ==========================================

#[test]
fn test_create_material_writes_stock_movement_and_audit() {
    let env = LedgerTestEnv::new().expect("无法创建测试环境");

    let material = env
        .state
        .material_api
        .create_material(
            MaterialBuilder::glass("  VID-TEMP-6 ")
                .description("Vidrio   templado\t6mm")
                .price_cents(48_500)
                .stock(12)
                .min_stock(3)
                .build(),
            "ana",
        )
        .expect("新建物料失败");

    assert_eq!(material.code, "VID-TEMP-6");
    assert_eq!(material.description, "Vidrio templado 6mm");
    assert_eq!(material.status, MaterialStatus::Active);
    assert_eq!(material.free_stock, 12);
    assert_eq!(material.unit_price, dec!(485));

    let movements = env
        .state
        .ledger_log_api
        .list_movements_by_material(material.id, None, 0, "ana")
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].kind, MovementKind::Ingress);
    assert_eq!(movements[0].quantity, 12);

    let audits = env
        .state
        .ledger_log_api
        .list_audit_by_module(audit_module::MATERIALS, None, 0, "ana")
        .unwrap();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].user, "ana");
    assert_eq!(audits[0].payload_json.as_ref().unwrap()["initial_stock"], 12);
}

#[test]
fn test_create_material_without_stock_has_no_movement() {
    let env = LedgerTestEnv::new().expect("无法创建测试环境");
    let material = env.create_material(MaterialBuilder::hardware("HER-1").build());
    assert_eq!(env.count_rows("stock_movement"), 0);
    assert_eq!(env.movement_net(material.id), 0);
}

#[test]
fn test_create_material_kind_rules() {
    let env = LedgerTestEnv::new().expect("无法创建测试环境");
    let api = &env.state.material_api;

    let cases = vec![
        ("玻璃缺厚度", MaterialBuilder::glass("G1").thickness(None).build()),
        ("玻璃厚度为 0", MaterialBuilder::glass("G2").thickness(Some(0.0)).build()),
        ("玻璃缺单位", MaterialBuilder::glass("G3").unit(None).build()),
        ("五金缺供应商", MaterialBuilder::hardware("H1").supplier(None).build()),
        ("五金供应商为空白", MaterialBuilder::hardware("H2").supplier(Some("  ")).build()),
        (
            "通用库存缺单位",
            MaterialBuilder::new("I1", MaterialKind::GenericInventory)
                .unit(None)
                .build(),
        ),
        ("单价为 0", MaterialBuilder::glass("G4").price_cents(0).build()),
        ("初始库存为负", MaterialBuilder::glass("G5").stock(-1).build()),
        ("编码为空", MaterialBuilder::glass("   ").build()),
    ];

    for (name, data) in cases {
        let result = api.create_material(data, "ana");
        assert!(
            matches!(result, Err(ApiError::ValidationError(_))),
            "{} 应校验失败",
            name
        );
    }
    assert_eq!(env.count_rows("material"), 0);
    assert_eq!(env.count_rows("audit_log"), 0);
}

#[test]
fn test_duplicate_code_is_conflict() {
    let env = LedgerTestEnv::new().expect("无法创建测试环境");
    env.create_material(MaterialBuilder::glass("VID-1").build());

    let err = env
        .state
        .material_api
        .create_material(MaterialBuilder::hardware("VID-1").build(), "ana")
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(env.count_rows("material"), 1);
}

// ==========================================
// 修正
// ==========================================

#[test]
fn test_update_stock_records_signed_adjustment() {
    let env = LedgerTestEnv::new().expect("无法创建测试环境");
    let material = env.create_material(MaterialBuilder::glass("VID-1").stock(10).build());
    let api = &env.state.material_api;

    let updated = api.update_stock(material.id, 4, "ana").unwrap();
    assert_eq!(updated.free_stock, 4);
    assert_eq!(env.movement_net(material.id), 4);

    let updated = api.update_stock(material.id, 9, "ana").unwrap();
    assert_eq!(updated.free_stock, 9);
    assert_eq!(env.movement_net(material.id), 9);

    // 无差值不写流水
    let before = env.count_rows("stock_movement");
    api.update_stock(material.id, 9, "ana").unwrap();
    assert_eq!(env.count_rows("stock_movement"), before);

    assert!(matches!(
        api.update_stock(material.id, -1, "ana"),
        Err(ApiError::ValidationError(_))
    ));
    assert!(matches!(
        api.update_stock(404, 1, "ana"),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_update_price_and_min_stock() {
    let env = LedgerTestEnv::new().expect("无法创建测试环境");
    let material = env.create_material(MaterialBuilder::glass("VID-1").stock(2).build());
    let api = &env.state.material_api;

    let updated = api.update_price(material.id, dec!(99.90), "ana").unwrap();
    assert_eq!(updated.unit_price, dec!(99.90));
    assert!(matches!(
        api.update_price(material.id, Decimal::ZERO, "ana"),
        Err(ApiError::ValidationError(_))
    ));

    assert!(api.list_low_stock("ana").unwrap().is_empty());
    let updated = api.update_min_stock(material.id, 5, "ana").unwrap();
    assert_eq!(updated.min_stock, 5);
    let low = api.list_low_stock("ana").unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].id, material.id);
}

// ==========================================
// 停用
// ==========================================

#[test]
fn test_deactivate_blocked_by_active_allocation() {
    let env = LedgerTestEnv::new().expect("无法创建测试环境");
    let material = env.create_material(MaterialBuilder::glass("VID-1").stock(5).build());
    let project = env.create_project(ProjectBuilder::new("P").build());
    env.state
        .allocation_api
        .assign_material(project, material.id, 2, MaterialKind::Glass, "ana")
        .unwrap();

    let api = &env.state.material_api;
    assert!(matches!(
        api.deactivate(material.id, "ana"),
        Err(ApiError::Conflict(_))
    ));

    env.state
        .allocation_api
        .release_material(project, material.id, 2, "ana")
        .unwrap();
    let deactivated = api.deactivate(material.id, "ana").unwrap();
    assert_eq!(deactivated.status, MaterialStatus::Deactivated);

    // 重复停用不重复记审计
    let audits = env.count_rows("audit_log");
    api.deactivate(material.id, "ana").unwrap();
    assert_eq!(env.count_rows("audit_log"), audits);

    // 停用后不再参与列表与占用
    assert!(api.list_materials(false, 50, 0, "ana").unwrap().is_empty());
    assert_eq!(api.list_materials(true, 50, 0, "ana").unwrap().len(), 1);
    assert!(matches!(
        env.state
            .allocation_api
            .assign_material(project, material.id, 1, MaterialKind::Glass, "ana"),
        Err(ApiError::Conflict(_))
    ));
}

#[test]
fn test_list_materials_paging() {
    let env = LedgerTestEnv::new().expect("无法创建测试环境");
    for i in 0..5 {
        env.create_material(MaterialBuilder::glass(&format!("VID-{}", i)).build());
    }
    let api = &env.state.material_api;

    let page = api.list_materials(false, 2, 2, "ana").unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].code, "VID-2");
    assert!(matches!(
        api.list_materials(false, 0, 0, "ana"),
        Err(ApiError::ValidationError(_))
    ));
}
