use std::{
    net::{IpAddr, SocketAddr},
    str::FromStr,
    sync::Arc,
};

use clap::Parser;
use server::{cli::Cli, db, identity::FirebaseVerifier, routes, AppState};
use shared::{configure_tracing, load_dotenv};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    load_dotenv()?;
    configure_tracing()?;

    let args = Cli::parse();
    debug!(?args);

    if args.debug_delete_database {
        warn!(path = %args.sqlite_connection_string, "Deleting database");
        match std::fs::remove_file(&args.sqlite_connection_string) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e)?,
            _ => {},
        }
    }

    // Run the migrations synchronously before creating the pool or launching the server
    let (ran, new_version) =
        db::run_migrations(&args.sqlite_connection_string, env!("CARGO_PKG_VERSION"))?;
    info!(?new_version, "Ran {ran} db migrations");

    let pool = db::create_pool(&args.sqlite_connection_string)?;

    #[cfg(feature = "seed-catalog")]
    {
        use shared::api::error::ServerError;

        let conn = pool.get().await?;
        let seeded = conn
            .interact(db::seed_catalog)
            .await
            .map_err(ServerError::from)??;
        info!("Seeded {seeded} catalog exercises");
    }

    let verifier = FirebaseVerifier::from_key_file(
        args.firebase_project_id.clone(),
        &args.firebase_keys_path,
    )?;

    let socket = SocketAddr::new(IpAddr::from_str(&args.bind_addr)?, args.port);
    let listener = TcpListener::bind(socket).await?;
    info!("listening on {}", listener.local_addr()?);

    let state = AppState::new(pool, args, Arc::new(verifier));
    axum::serve(listener, routes::router(state)).await?;

    Ok(())
}
