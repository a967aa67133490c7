use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use std::sync::Arc;
use weatherly_backend::app::{AppState, cors_layer, create_app, create_forecaster};
use weatherly_backend::config::Args;
use weatherly_backend::error::StartupError;

#[tokio::main]
async fn main() {
    env_logger::init();

    let args = Args::parse();

    if let Err(error) = run(args).await {
        log::error!("{}", error);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), StartupError> {
    let settings = args.settings()?;
    let addr = settings.listen_address()?;
    let tls_files = args.tls_files()?;

    let forecaster = create_forecaster(&settings)?;
    let state = AppState {
        forecaster: Arc::new(forecaster),
    };
    let app = create_app(state, cors_layer(&settings.allowed_origins)?);

    log::info!("listening on {}", addr);
    if let Some(tls_files) = tls_files {
        log::info!(
            "using tls with key file {} and cert file {}",
            tls_files.key_file_path.display(),
            tls_files.cert_file_path.display()
        );
        let tls =
            RustlsConfig::from_pem_file(tls_files.cert_file_path, tls_files.key_file_path).await?;
        axum_server::bind_rustls(addr, tls)
            .serve(app.into_make_service())
            .await?;
    } else {
        axum_server::bind(addr)
            .serve(app.into_make_service())
            .await?;
    }
    Ok(())
}
