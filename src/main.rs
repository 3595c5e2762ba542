//! 陣取りAPIサーバーのエントリポイント
//! 設定読み込み、ログ初期化、セッション管理の初期化、HTTPサーバー起動を行う。

use std::sync::Arc;
use std::time::Duration;

use square_color::{
    api::{create_router, TerritoryService},
    config::Config,
    session::GameSessionManager,
};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// メイン関数 - サーバーの初期化と起動を担当
#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("設定読み込みエラー: {}", e);
            std::process::exit(1);
        }
    };

    // RUST_LOGがあれば設定ファイルのフィルタより優先する
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if std::env::args().any(|arg| arg == "--generate-config") {
        match Config::default().save_to_file("config.json") {
            Ok(()) => info!("wrote default configuration to config.json"),
            Err(e) => {
                error!(error = %e, "failed to write configuration");
                std::process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = config.validate() {
        error!(error = %e, "invalid configuration, generate a default one with --generate-config");
        std::process::exit(1);
    }

    info!(
        host = %config.server.host,
        port = config.server.port,
        board = %format!("{}x{}", config.board.width, config.board.height),
        max_sessions = config.sessions.max_sessions,
        save_dir = %config.persistence.save_dir.display(),
        "configuration loaded"
    );

    let session_manager = Arc::new(GameSessionManager::with_timeout(
        config.sessions.max_sessions,
        config.sessions.session_timeout_minutes,
    ));

    if config.sessions.enable_session_cleanup {
        let manager = Arc::clone(&session_manager);
        let interval = Duration::from_secs(config.sessions.cleanup_interval_minutes.max(1) * 60);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                manager.cleanup_inactive_sessions();
            }
        });
    }

    let service = Arc::new(TerritoryService::new(
        session_manager,
        config.game_settings(),
        config.persistence.save_dir.clone(),
    ));
    let app = create_router(service);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let listener = match TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(address = %bind_address, error = %e, "failed to bind address");
            std::process::exit(1);
        }
    };

    info!(address = %bind_address, "square color server listening");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}
