use actix_web::{App, HttpServer, ResponseError, error, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use spin_rewards_backend::{
    AppError,
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::create_cors,
    services::*,
    store::{SeaOrmSpinStore, SpinStore},
    swagger::swagger_config,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");
    if config.spin.hash_salt.is_empty() {
        log::warn!("spin.hash_salt is empty, identity digests are unsalted");
    }

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 创建服务
    let store: Arc<dyn SpinStore> = Arc::new(SeaOrmSpinStore::new(pool));
    let analytics_service = AnalyticsService::new(store.clone());
    let restaurant_service = RestaurantService::new(store.clone(), analytics_service.clone());
    let spin_service = SpinService::new(
        store.clone(),
        analytics_service.clone(),
        Arc::new(ThreadRngDraw),
        config.spin.clone(),
    );
    let claim_service = ClaimService::new(store, analytics_service);
    let spin_config = config.spin.clone().normalized();

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                let response = AppError::ValidationError(err.to_string()).error_response();
                error::InternalError::from_response(err, response).into()
            }))
            .app_data(web::Data::new(restaurant_service.clone()))
            .app_data(web::Data::new(spin_service.clone()))
            .app_data(web::Data::new(claim_service.clone()))
            .app_data(web::Data::new(spin_config.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::restaurant_config)
                    .configure(handlers::spin_config)
                    .configure(handlers::claim_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
