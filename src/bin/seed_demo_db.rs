// ==========================================
// 演示数据库初始化
// ==========================================
// 用法: seed_demo_db [db_path]
// 已有数据库会先备份为 <db_path>.bak.<时间戳> 再重建
// ==========================================

use chrono::{Duration, Local};
use rust_decimal::Decimal;
use std::error::Error;
use std::fs;
use std::path::Path;

use obra_ledger::app::{get_default_db_path, AppState};
use obra_ledger::domain::{NewMaterial, NewProject};
use obra_ledger::{MaterialKind, ProjectStatus};

const SEED_USER: &str = "seed";

fn main() -> Result<(), Box<dyn Error>> {
    obra_ledger::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    let state = AppState::new(db_path.clone())?;
    seed_demo_scenario(&state)?;
    print_quick_counts(&state)?;

    eprintln!("Seeded {}", db_path);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn material(
    code: &str,
    kind: MaterialKind,
    description: &str,
    price_cents: i64,
    stock: i64,
    min_stock: i64,
) -> NewMaterial {
    NewMaterial {
        code: code.to_string(),
        kind,
        description: description.to_string(),
        supplier: match kind {
            MaterialKind::Glass => Some("Vidrios del Norte".to_string()),
            MaterialKind::Hardware => Some("Herrajes Lomas".to_string()),
            MaterialKind::GenericInventory => None,
        },
        unit: match kind {
            MaterialKind::Glass => Some("m2".to_string()),
            MaterialKind::Hardware => None,
            MaterialKind::GenericInventory => Some("pza".to_string()),
        },
        thickness_mm: match kind {
            MaterialKind::Glass => Some(6.0),
            _ => None,
        },
        unit_price: Decimal::new(price_cents, 2),
        initial_stock: stock,
        min_stock,
    }
}

fn seed_demo_scenario(state: &AppState) -> Result<(), Box<dyn Error>> {
    let today = Local::now().date_naive();

    let catalog = [
        material("VID-TEMP-6", MaterialKind::Glass, "Vidrio templado 6mm claro", 48_500, 20, 5),
        material("VID-LAM-8", MaterialKind::Glass, "Vidrio laminado 8mm", 72_000, 8, 4),
        material("HER-BIS-01", MaterialKind::Hardware, "Bisagra hidraulica inox", 16_750, 40, 10),
        material("HER-JAL-02", MaterialKind::Hardware, "Jaladera tubular 30cm", 9_900, 12, 6),
        material("INV-SIL-01", MaterialKind::GenericInventory, "Silicon estructural", 12_000, 30, 12),
    ];

    let mut material_ids = Vec::with_capacity(catalog.len());
    for data in catalog {
        let created = state.material_api.create_material(data, SEED_USER)?;
        material_ids.push((created.id, created.kind));
    }

    let torre = state.project_repo.insert(&NewProject {
        name: "Torre Norte - fachada".to_string(),
        status: ProjectStatus::InProgress,
        start_date: Some(today - Duration::days(30)),
        estimated_end_date: Some((today + Duration::days(30)).format("%Y-%m-%d").to_string()),
        budget: Decimal::new(850_000, 0),
    })?;
    let casa = state.project_repo.insert(&NewProject {
        name: "Casa Lago - canceles".to_string(),
        status: ProjectStatus::Planning,
        start_date: Some(today + Duration::days(7)),
        estimated_end_date: Some((today + Duration::days(40)).format("%d/%m/%Y").to_string()),
        budget: Decimal::new(120_000, 0),
    })?;

    let luis = state.personnel_repo.insert_person("Luis Ortega", Decimal::new(950, 0))?;
    let marta = state.personnel_repo.insert_person("Marta Ruiz", Decimal::new(1_200, 0))?;

    state
        .allocation_api
        .assign_personnel(torre, luis, "instalador", today - Duration::days(20), SEED_USER)?;
    state
        .allocation_api
        .assign_personnel(torre, marta, "supervisora", today - Duration::days(30), SEED_USER)?;

    // 大部分玻璃占给 Torre Norte，使其产生补货缺口
    let (vid_temp, vid_kind) = material_ids[0];
    let (bisagra, bis_kind) = material_ids[2];
    let (silicon, sil_kind) = material_ids[4];
    state
        .allocation_api
        .assign_material(torre, vid_temp, 15, vid_kind, SEED_USER)?;
    state
        .allocation_api
        .assign_material(torre, bisagra, 24, bis_kind, SEED_USER)?;
    state
        .allocation_api
        .assign_material(casa, silicon, 6, sil_kind, SEED_USER)?;
    state.allocation_api.release_material(casa, silicon, 2, SEED_USER)?;

    let order = state.order_api.generate_order(torre, SEED_USER)?;
    eprintln!(
        "Order #{} for project {}: {} line(s), estimated total {}",
        order.order.id,
        torre,
        order.lines.len(),
        order.order.estimated_total
    );

    Ok(())
}

fn print_quick_counts(state: &AppState) -> Result<(), Box<dyn Error>> {
    let conn = state.db.lock()?;
    let tables = [
        "material",
        "project",
        "personnel",
        "personnel_assignment",
        "allocation",
        "replenishment_order",
        "order_line",
        "stock_movement",
        "audit_log",
    ];

    eprintln!("Row counts:");
    for t in tables {
        let sql = format!("SELECT COUNT(*) FROM {}", t);
        let c: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        eprintln!("  {:<24} {}", t, c);
    }
    Ok(())
}
