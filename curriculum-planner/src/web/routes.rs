//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::warn;

use crate::domain::{
    InvalidSemester, InvalidStudySemester, InvalidTrack, Semester, StudySemester, Track,
};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/schedule/:track/:semester", get(schedule))
        .route("/routes/:track/:semester/:study_semester", get(routes))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// One semester of a track's schedule.
async fn schedule(
    State(state): State<AppState>,
    Path((track, semester)): Path<(String, String)>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let track = Track::from_code(&track)?;
    let semester = Semester::parse(&semester)?;

    let graph = state.schedule(track).ok_or_else(|| AppError::NotFound {
        message: format!("No schedule for track {track}"),
    })?;
    let response =
        ScheduleResponse::from_graph(graph, semester).ok_or_else(|| AppError::NotFound {
            message: format!("No schedule for {track} in {semester}"),
        })?;
    Ok(Json(response))
}

/// Walking routes for one study semester.
async fn routes(
    State(state): State<AppState>,
    Path((track, semester, study_semester)): Path<(String, String, String)>,
) -> Result<Json<RoutesResponse>, AppError> {
    let track = Track::from_code(&track)?;
    let semester = Semester::parse(&semester)?;
    let study_semester = StudySemester::parse(&study_semester)?;

    let response = state
        .route_table(track)
        .and_then(|table| RoutesResponse::from_table(table, semester, study_semester))
        .ok_or_else(|| AppError::NotFound {
            message: format!("No routes for {track} in {semester}, semester {study_semester}"),
        })?;
    Ok(Json(response))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
}

impl From<InvalidTrack> for AppError {
    fn from(e: InvalidTrack) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<InvalidSemester> for AppError {
    fn from(e: InvalidSemester) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<InvalidStudySemester> for AppError {
    fn from(e: InvalidStudySemester) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
        };

        warn!(%status, %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::{CurriculumCatalog, SelectionRules};
    use crate::plan::build_schedule_graph;
    use crate::resolver::ResolverConfig;
    use crate::routing::{
        CancelSignal, GeoCache, RouteCache, RoutePlanner, RoutePlannerConfig, StaticGeocoder,
        StaticRouteEngine,
    };
    use crate::source::OfferingTable;

    const OFFERINGS: &str = include_str!("../../data/offerings.sample.json");
    const PLACES: &str = include_str!("../../data/places.sample.json");

    async fn state() -> AppState {
        let table = OfferingTable::from_json(OFFERINGS).unwrap();
        let catalog = CurriculumCatalog::builtin().unwrap();
        let rules = SelectionRules::builtin().unwrap();
        let graph =
            build_schedule_graph(&table, &catalog, &rules, Track::Cs, &ResolverConfig::default())
                .unwrap();

        let planner = RoutePlanner::new(
            StaticGeocoder::from_json(PLACES).unwrap(),
            StaticRouteEngine::default().with_straight_lines(true),
            GeoCache::new(),
            RouteCache::new(),
            RoutePlannerConfig::default().with_geocode_interval(std::time::Duration::ZERO),
        );
        let routes = planner.build_route_table(&graph, &CancelSignal::new()).await;
        AppState::new([graph], [routes])
    }

    fn path2(a: &str, b: &str) -> Path<(String, String)> {
        Path((a.to_string(), b.to_string()))
    }

    fn path3(a: &str, b: &str, c: &str) -> Path<(String, String, String)> {
        Path((a.to_string(), b.to_string(), c.to_string()))
    }

    #[tokio::test]
    async fn health_check() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn schedule_for_semester() {
        let Json(response) = schedule(State(state().await), path2("inf", "2020s"))
            .await
            .unwrap();

        assert_eq!(response.track, Track::Cs);
        let second = response
            .slots
            .iter()
            .find(|s| s.study_semester.get() == 2)
            .unwrap();
        assert_eq!(second.days[0].weekday_name, "Monday");
        assert_eq!(second.days[0].addresses.len(), 3);
        assert_eq!(response.unresolved.len(), 1);
    }

    #[tokio::test]
    async fn unknown_semester_is_not_found() {
        let err = schedule(State(state().await), path2("inf", "2019w"))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_track_is_bad_request() {
        let err = schedule(State(state().await), path2("bio", "2020s"))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err = routes(State(state().await), path3("inf", "2020x", "2"))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn routes_for_study_semester() {
        let Json(response) = routes(State(state().await), path3("inf", "2020s", "2"))
            .await
            .unwrap();

        assert!(response.complete);
        let monday = &response.days[0];
        assert_eq!(monday.points.len(), 3);
        assert!(monday.points.iter().all(Option::is_some));
        assert_eq!(monday.legs.len(), 2);

        // Thursday's only room has no house number
        let thursday = response.days.iter().find(|d| d.weekday.get() == 4).unwrap();
        assert_eq!(thursday.points, vec![None]);
    }

    #[tokio::test]
    async fn routes_missing_for_other_track() {
        let err = routes(State(state().await), path3("winf", "2020s", "2"))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
