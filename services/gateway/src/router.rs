use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{competitions, internal, participants};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/competitions",
            post(competitions::create_competition).get(competitions::list_competitions),
        )
        .route("/competitions/:id", get(competitions::get_competition))
        .route("/competitions/:id/start", post(competitions::start_competition))
        .route("/competitions/:id/stop", post(competitions::stop_competition))
        .route(
            "/competitions/:id/participants",
            post(competitions::create_participant).get(competitions::list_participants),
        )
        .route("/competitions/:id/leaderboard", get(competitions::leaderboard))
        .route("/participants/:id", get(participants::get_participant))
        .route("/participants/:id/portfolio", get(participants::portfolio))
        .route("/participants/:id/positions", get(participants::positions))
        .route("/participants/:id/trades", get(participants::trades))
        .route("/participants/:id/orders", get(participants::orders))
        .route("/participants/:id/invocations", get(participants::invocations))
        .route("/participants/:id/performance", get(participants::performance))
        .route("/internal/invoke-participants", post(internal::invoke_participants))
        .route(
            "/internal/trigger-invocation/:id",
            post(internal::trigger_invocation),
        )
        .route("/internal/reset-competition", post(internal::reset_competition))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
