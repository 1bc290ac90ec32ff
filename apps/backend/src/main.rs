use actix_web::{web, App, HttpServer};
use points_backend::config::game::GameConfig;
use points_backend::config::hosted::HostedServiceConfig;
use points_backend::infra::state::build_state;
use points_backend::middleware::cors::cors_middleware;
use points_backend::middleware::request_trace::RequestTrace;
use points_backend::middleware::structured_logger::StructuredLogger;
use points_backend::middleware::trace_span::TraceSpan;
use points_backend::routes;
use tracing::{error, info};

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment
    // (container env file, or `set -a; . ./.env; set +a` locally).
    let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = match std::env::var("BACKEND_PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse::<u16>()
    {
        Ok(port) => port,
        Err(_) => {
            error!("BACKEND_PORT must be a valid port number");
            std::process::exit(1);
        }
    };

    let app_state = match HostedServiceConfig::from_env()
        .and_then(|hosted| Ok((hosted, GameConfig::from_env()?)))
        .and_then(|(hosted, game)| {
            build_state()
                .with_hosted(hosted)
                .with_game_config(game)
                .build()
        }) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "failed to build application state");
            std::process::exit(1);
        }
    };

    info!(
        %host,
        port,
        device_id = app_state.points.device_id(),
        tick_ms = app_state.game_config.tick_interval.as_millis() as u64,
        "starting points backend"
    );

    let data = web::Data::new(app_state);

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
