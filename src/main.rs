use std::net::SocketAddr;

use clap::Parser;
use keygate::cli::{Args, build_config, handle_hash_password, init_logging, load_users};
use keygate::create_app;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    if let Some(password) = &args.hash_password {
        handle_hash_password(password);
        return;
    }

    let Some(users) = load_users(args.users_file.as_deref()) else {
        std::process::exit(1);
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let config = build_config(&args, users);
    let app = create_app(&config);

    match listener.local_addr() {
        Ok(local_addr) => info!(address = %local_addr, "Listening"),
        Err(_) => info!(address = %addr, "Listening"),
    }

    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    if let Err(e) = axum::serve(listener, make_service).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
