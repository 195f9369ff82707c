use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use curriculum_planner::config::{AppConfig, RoutingSource};
use curriculum_planner::curriculum::{CurriculumCatalog, SelectionRules};
use curriculum_planner::domain::Track;
use curriculum_planner::plan::build_schedule_graph;
use curriculum_planner::resolver::{ResolverConfig, ScheduleGraph};
use curriculum_planner::routing::{
    CacheConfig, CancelSignal, GeoCache, Geocoder, NominatimClient, NominatimConfig, OsrmClient,
    OsrmConfig, RouteCache, RouteEngine, RoutePlanner, RoutePlannerConfig, RouteTable,
    StaticGeocoder, StaticRouteEngine,
};
use curriculum_planner::source::OfferingTable;
use curriculum_planner::web::{AppState, create_router};

/// Route every graph, persisting the caches after each one.
async fn build_route_tables<G: Geocoder, E: RouteEngine>(
    planner: RoutePlanner<G, E>,
    graphs: &[ScheduleGraph],
    cache_config: &CacheConfig,
    cancel: &CancelSignal,
) -> Vec<RouteTable> {
    let mut tables = Vec::with_capacity(graphs.len());
    for graph in graphs {
        tables.push(planner.build_route_table(graph, cancel).await);
        if cache_config.persist_after_batch
            && let Err(e) = planner.persist(cache_config)
        {
            warn!(error = %e, "failed to persist caches");
        }
    }
    if let Err(e) = planner.persist(cache_config) {
        warn!(error = %e, "failed to persist caches");
    }
    tables
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let table = OfferingTable::load(&config.offerings_path).expect("Failed to load offerings");
    let catalog = match &config.curriculum_path {
        Some(path) => CurriculumCatalog::load(path),
        None => CurriculumCatalog::builtin(),
    }
    .expect("Failed to load curriculum");
    let rules = match &config.rules_path {
        Some(path) => SelectionRules::load(path),
        None => SelectionRules::builtin(),
    }
    .expect("Failed to load selection rules");
    info!(offerings = table.len(), "inputs loaded");

    let resolver_config = ResolverConfig::default();
    let graphs: Vec<ScheduleGraph> = Track::ALL
        .iter()
        .map(|&track| {
            build_schedule_graph(&table, &catalog, &rules, track, &resolver_config)
                .expect("Failed to build schedule graph")
        })
        .collect();

    let cache_config = CacheConfig::new(&config.cache_dir);
    let geo_cache = GeoCache::new();
    let route_cache = RouteCache::new();
    geo_cache.load_from(&cache_config.geo_file()).await;
    route_cache.load_from(&cache_config.route_file()).await;

    // Ctrl-C stops the route build, then the server
    let cancel = CancelSignal::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupted, shutting down");
                cancel.cancel();
            }
        }
    });

    let planner_config = RoutePlannerConfig::default();
    let route_tables = match &config.routing {
        RoutingSource::Online {
            geocoder_email,
            geocoder_url,
            router_url,
        } => {
            let mut nominatim = NominatimConfig::new(geocoder_email);
            if let Some(url) = geocoder_url {
                nominatim = nominatim.with_base_url(url);
            }
            let mut osrm = OsrmConfig::default();
            if let Some(url) = router_url {
                osrm = osrm.with_base_url(url);
            }
            let planner = RoutePlanner::new(
                NominatimClient::new(nominatim).expect("Failed to create geocoding client"),
                OsrmClient::new(osrm).expect("Failed to create routing client"),
                geo_cache,
                route_cache,
                planner_config,
            );
            build_route_tables(planner, &graphs, &cache_config, &cancel).await
        }
        RoutingSource::Offline { places_path } => {
            let planner = RoutePlanner::new(
                StaticGeocoder::load(places_path).expect("Failed to load places"),
                StaticRouteEngine::default().with_straight_lines(true),
                geo_cache,
                route_cache,
                planner_config
                    .with_geocode_interval(std::time::Duration::ZERO)
                    .with_retry_backoff(std::time::Duration::ZERO),
            );
            build_route_tables(planner, &graphs, &cache_config, &cancel).await
        }
    };

    if cancel.is_cancelled() {
        return;
    }

    let state = AppState::new(graphs, route_tables);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind");
    info!(addr = %config.bind_addr, "curriculum planner listening");
    info!("  GET /health");
    info!("  GET /schedule/:track/:semester");
    info!("  GET /routes/:track/:semester/:study_semester");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .expect("Server error");
}
