//! filereg-daemon binary.
//!
//! `filereg-daemon` serves the API. The admin commands manage the user
//! directory and exit:
//!   filereg-daemon add-user <email>
//!   filereg-daemon list-users

use std::sync::Arc;

use anyhow::Context;
use filereg_daemon::config::DaemonConfig;
use filereg_daemon::state::{now_secs, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DaemonConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().or_else(|_| {
                tracing_subscriber::EnvFilter::try_new(format!(
                    "filereg={level},tower_http={level}",
                    level = config.logging.log_level
                ))
            })?,
        )
        .init();

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;
    let conn = filereg_db::open(&data_dir.join("filereg.db"))?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => {}
        [cmd, email] if cmd == "add-user" => {
            let user = filereg_db::queries::users::insert(&conn, email, now_secs())?;
            info!(user_id = user.id, email = %user.email, "user added");
            println!("{}", user.id);
            return Ok(());
        }
        [cmd] if cmd == "list-users" => {
            for user in filereg_db::queries::users::list(&conn)? {
                println!("{}\t{}", user.id, user.email);
            }
            return Ok(());
        }
        _ => anyhow::bail!("usage: filereg-daemon [add-user <email> | list-users]"),
    }

    // Refuse to serve without a usable secret.
    let secret = config.server_secret()?;
    let state = Arc::new(AppState::new(conn, secret));
    let app = filereg_daemon::router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.server.listen_addr))?;
    info!(addr = %config.server.listen_addr, "filereg daemon listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Ctrl-C received, shutting down");
        })
        .await?;

    info!("Daemon stopped");
    Ok(())
}
