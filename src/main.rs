// ==========================================
// 建材物料管理系统 - 命令行入口
// ==========================================
// 用法:
//   obra-ledger                   打印库存概况
//   obra-ledger low-stock         低于最低库存的物料
//   obra-ledger search <词>       物料检索
//   obra-ledger orders            待收货补货单
// 环境变量: OBRA_LEDGER_DB_PATH, RUST_LOG, OBRA_LEDGER_USER
// ==========================================

use anyhow::{anyhow, Context};
use obra_ledger::app::{get_default_db_path, AppState};
use obra_ledger::domain::types::OrderStatus;
use obra_ledger::logging;

fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 物料占用与补货台账", obra_ledger::APP_NAME);
    tracing::info!("系统版本: {}", obra_ledger::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;
    let user = std::env::var("OBRA_LEDGER_USER").unwrap_or_else(|_| "cli".to_string());

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => print_overview(&state, &user),
        Some("low-stock") => print_low_stock(&state, &user),
        Some("search") => {
            let term = args[1..].join(" ");
            let hits = state
                .query_api
                .search_materials(&term, &user)
                .context("物料检索失败")?;
            for hit in hits {
                println!(
                    "{:>4}  {:<16} {:<18} {}",
                    hit.score,
                    hit.material.code,
                    hit.material.kind.label(),
                    hit.material.description
                );
            }
            Ok(())
        }
        Some("orders") => {
            let orders = state
                .order_api
                .list_orders(None, Some(OrderStatus::Pending), &user)
                .context("查询补货单失败")?;
            for order in orders {
                println!(
                    "#{:<6} project={:<6} total={:<12} issued_by={} at {}",
                    order.id, order.project_id, order.estimated_total, order.issued_by, order.issued_at
                );
            }
            Ok(())
        }
        Some(other) => Err(anyhow!("未知命令: {}", other)),
    }
}

fn print_overview(state: &AppState, user: &str) -> anyhow::Result<()> {
    let materials = state
        .material_api
        .list_materials(false, 1_000, 0, user)
        .context("查询物料失败")?;
    let total_stock: i64 = materials.iter().map(|m| m.free_stock).sum();
    println!("启用物料: {}，可用库存合计: {}", materials.len(), total_stock);
    print_low_stock(state, user)
}

fn print_low_stock(state: &AppState, user: &str) -> anyhow::Result<()> {
    let low = state
        .material_api
        .list_low_stock(user)
        .context("查询低库存失败")?;
    if low.is_empty() {
        println!("没有低于最低库存的物料");
    }
    for m in low {
        println!(
            "{:<16} free={:<6} min={:<6} {}",
            m.code, m.free_stock, m.min_stock, m.description
        );
    }
    Ok(())
}
