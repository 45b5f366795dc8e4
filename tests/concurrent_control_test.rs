// ==========================================
// 并发占用测试
// ==========================================
// 验证: 多线程争抢同一物料时，可用库存不为负，
//       成功占用总量 = 库存减少量 = 出库流水总量
// ==========================================

mod helpers;

use std::thread;

use helpers::api_test_helper::LedgerTestEnv;
use helpers::test_data_builder::{MaterialBuilder, ProjectBuilder};
use obra_ledger::{ApiError, MaterialKind};

#[test]
fn test_concurrent_assign_never_oversells() {
    let env = LedgerTestEnv::new().expect("无法创建测试环境");
    let glass = env.create_material(MaterialBuilder::glass("VID-1").stock(20).build());
    let projects: Vec<i64> = (0..8)
        .map(|i| env.create_project(ProjectBuilder::new(&format!("P{}", i)).build()))
        .collect();

    let results: Vec<Result<i64, ApiError>> = thread::scope(|scope| {
        let handles: Vec<_> = projects
            .iter()
            .map(|&project_id| {
                let api = env.state.allocation_api.clone();
                let material_id = glass.id;
                scope.spawn(move || {
                    api.assign_material(project_id, material_id, 3, MaterialKind::Glass, "worker")
                        .map(|a| a.quantity)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("线程异常"))
            .collect()
    });

    let succeeded: i64 = results.iter().filter_map(|r| r.as_ref().ok()).sum();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(ApiError::InsufficientStock { .. })))
        .count();

    assert_eq!(succeeded, 18, "20 件库存最多成功 6 次 × 3");
    assert_eq!(rejected, 2);
    assert_eq!(env.free_stock(glass.id), 2);
    assert_eq!(env.movement_net(glass.id), 2);
}
