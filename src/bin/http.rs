#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use release_schedule::{
        InMemoryPlanStore, PlanSnapshot, ServiceConfig, StoreLocation,
        http_api::{self, AppState},
        load_snapshot_from_json, logging,
    };
    use tracing::info;

    let config = ServiceConfig::from_env()?;
    logging::init(&config.log_filter);

    let snapshot = match &config.seed_file {
        Some(path) => {
            info!(path = %path.display(), "loading seed snapshot");
            load_snapshot_from_json(path)?
        }
        None => PlanSnapshot::default(),
    };

    let state = match &config.store {
        StoreLocation::Memory => AppState::new(InMemoryPlanStore::from_snapshot(snapshot)?),
        #[cfg(feature = "sqlite")]
        StoreLocation::Sqlite(path) => {
            info!(path = %path.display(), "opening sqlite plan store");
            let mut store = release_schedule::SqlitePlanStore::new(path)?;
            snapshot.load_into(&mut store)?;
            AppState::new(store)
        }
        #[cfg(not(feature = "sqlite"))]
        StoreLocation::Sqlite(_) => {
            return Err("rebuild with the `sqlite` feature to use RELEASE_SCHEDULE_DB".into());
        }
    }
    .with_config(config.analyzer);

    http_api::serve(config.http_addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
