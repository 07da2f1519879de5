// ==========================================
// 旅游批发后台 - 命令行入口
// ==========================================
// 用法:
//   tour-allocation init
//   tour-allocation expand <tenant_id> <window.json>
//   tour-allocation add-rate <rate.json>
//   tour-allocation release-warnings <tenant_id> [as_of]
//   tour-allocation quote <tenant_id> <variant_id> <check_in> <check_out> <occupancy> [supplier_id]
//   tour-allocation margin <tenant_id> <variant_id> <check_in> <check_out> <occupancy> <supplier_id>
//
// 数据库路径: 环境变量 TOUR_ALLOCATION_DB_PATH，缺省为用户数据目录
// 结果以 JSON 输出到 stdout，日志写 stderr
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::sync::{Arc, Mutex};

use tour_allocation::api::{AllocationApi, ApiError, PricingApi};
use tour_allocation::config::{ConfigManager, PricingConfigReader};
use tour_allocation::db::{default_db_path, init_schema, open_sqlite_connection};
use tour_allocation::domain::{AllocationWindow, RateDocument, StayQuery};
use tour_allocation::repository::{AllocationRepository, RateRepository};
use tour_allocation::{logging, TenantId};

struct Services {
    allocation_api: AllocationApi,
    pricing_api: PricingApi,
}

impl Services {
    fn open(db_path: &str) -> Result<Self> {
        let conn = open_sqlite_connection(db_path)
            .with_context(|| format!("无法打开数据库: {}", db_path))?;
        init_schema(&conn).context("数据库初始化失败")?;
        let conn = Arc::new(Mutex::new(conn));

        let config: Arc<dyn PricingConfigReader> = Arc::new(
            ConfigManager::from_connection(conn.clone()).map_err(|e| anyhow!(e.to_string()))?,
        );
        let allocation_repo = Arc::new(AllocationRepository::from_connection(conn.clone()));
        let rate_repo = Arc::new(RateRepository::from_connection(conn));

        Ok(Self {
            allocation_api: AllocationApi::new(allocation_repo, config.clone()),
            pricing_api: PricingApi::new(rate_repo, config),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_usage();
        return Ok(());
    };

    let db_path = default_db_path();
    tracing::info!(db_path = %db_path, version = tour_allocation::VERSION, "使用数据库");
    let services = Services::open(&db_path)?;

    match command.as_str() {
        "init" => {
            print_json(&serde_json::json!({ "db_path": db_path, "status": "ok" }))?;
        }
        "expand" => {
            let tenant_id = parse_tenant(arg(&args, 1, "tenant_id")?)?;
            let window: AllocationWindow = read_json(arg(&args, 2, "window.json")?)?;
            let report = services
                .allocation_api
                .create_and_expand(tenant_id, &window)
                .await
                .map_err(user_error)?;
            print_json(&report)?;
        }
        "add-rate" => {
            let doc: RateDocument = read_json(arg(&args, 1, "rate.json")?)?;
            let rate_id = services
                .pricing_api
                .create_rate_document(doc)
                .map_err(user_error)?;
            print_json(&serde_json::json!({ "rate_id": rate_id }))?;
        }
        "release-warnings" => {
            let tenant_id = parse_tenant(arg(&args, 1, "tenant_id")?)?;
            let as_of = match args.get(2) {
                Some(raw) => parse_date(raw)?,
                None => Local::now().date_naive(),
            };
            let rows = services
                .allocation_api
                .list_release_warnings(tenant_id, as_of)
                .await
                .map_err(user_error)?;
            print_json(&rows)?;
        }
        "quote" => {
            let query = parse_stay_query(&args)?;
            let supplier_id = args.get(6).map(|raw| parse_i64(raw, "supplier_id")).transpose()?;
            let breakdown = services
                .pricing_api
                .quote_stay(query.tenant_id, query.with_supplier(supplier_id))
                .await
                .map_err(user_error)?;
            print_json(&breakdown)?;
        }
        "margin" => {
            let query = parse_stay_query(&args)?;
            let supplier_id = parse_i64(arg(&args, 6, "supplier_id")?, "supplier_id")?;
            let result = services
                .pricing_api
                .margin(query.tenant_id, query, supplier_id)
                .await
                .map_err(user_error)?;
            print_json(&result)?;
        }
        other => {
            print_usage();
            bail!("未知命令: {}", other);
        }
    }

    Ok(())
}

/// 对外只给可读文案，技术细节进日志
fn user_error(err: ApiError) -> anyhow::Error {
    tracing::error!(error = %err, "命令执行失败");
    anyhow!(err.user_message())
}

fn print_usage() {
    eprintln!("{} v{}", tour_allocation::APP_NAME, tour_allocation::VERSION);
    eprintln!("用法:");
    eprintln!("  tour-allocation init");
    eprintln!("  tour-allocation expand <tenant_id> <window.json>");
    eprintln!("  tour-allocation add-rate <rate.json>");
    eprintln!("  tour-allocation release-warnings <tenant_id> [as_of]");
    eprintln!("  tour-allocation quote <tenant_id> <variant_id> <check_in> <check_out> <occupancy> [supplier_id]");
    eprintln!("  tour-allocation margin <tenant_id> <variant_id> <check_in> <check_out> <occupancy> <supplier_id>");
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn arg<'a>(args: &'a [String], idx: usize, name: &str) -> Result<&'a str> {
    args.get(idx)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("缺少参数: {}", name))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("无法读取文件: {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("JSON 格式错误: {}", path))
}

fn parse_i64(raw: &str, name: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .with_context(|| format!("参数 {} 不是整数: {}", name, raw))
}

fn parse_tenant(raw: &str) -> Result<TenantId> {
    Ok(TenantId(parse_i64(raw, "tenant_id")?))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("日期格式应为 YYYY-MM-DD: {}", raw))
}

fn parse_stay_query(args: &[String]) -> Result<StayQuery> {
    let tenant_id = parse_tenant(arg(args, 1, "tenant_id")?)?;
    let variant_id = parse_i64(arg(args, 2, "variant_id")?, "variant_id")?;
    let check_in = parse_date(arg(args, 3, "check_in")?)?;
    let check_out = parse_date(arg(args, 4, "check_out")?)?;
    let occupancy: u32 = arg(args, 5, "occupancy")?
        .trim()
        .parse()
        .context("occupancy 必须是非负整数")?;
    // 房型留空，由配置 default_room_type 补齐
    Ok(StayQuery::new(tenant_id, variant_id, check_in, check_out, occupancy).with_room_type(""))
}
