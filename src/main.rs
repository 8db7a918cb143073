use axum::http::StatusCode;
use chatgate::error::AppError;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,chatgate=debug")),
        )
        .json()
        .init();
}

fn startup_error(code: &str, err: impl std::fmt::Display) -> AppError {
    AppError::new(StatusCode::INTERNAL_SERVER_ERROR, code, err.to_string())
}

async fn serve() -> Result<(), AppError> {
    let state = chatgate::app::load_state().await?;
    let addr: std::net::SocketAddr = state
        .runtime
        .listen
        .parse()
        .map_err(|err| startup_error("listen_invalid", err))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| startup_error("listen_failed", err))?;
    tracing::info!(%addr, "chatgate listening");
    axum::serve(listener, chatgate::app::build_app(state))
        .await
        .map_err(|err| startup_error("serve_failed", err))
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = serve().await {
        eprintln!("error: {}", err.message);
        std::process::exit(1);
    }
}
