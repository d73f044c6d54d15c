use std::{net::SocketAddr, sync::Arc};

use adder_mcp::{
    build_app, build_dispatcher, config::Config, logging, repl, shutdown_server, AppState,
};
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let dispatcher = Arc::new(build_dispatcher(config.tool_timeout)?);

    let bind_socket = config.bind_socket()?;
    let state = AppState::new(config.api_token.clone(), Arc::clone(&dispatcher));
    let prompt_state = state.clone();
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        auth = config.api_token.is_some(),
        tools = dispatcher.registry().len(),
        "server starting"
    );

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );

    if !config.interactive {
        server.await?;
        return Ok(());
    }

    let server = tokio::spawn(async move { server.await });
    repl::run_prompt(
        &prompt_state,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    info!("interactive prompt closed, shutting down");
    shutdown_server(server).await?;
    Ok(())
}
