// --------------------------------------------------
// Handles API endpoints for read-only board views.
//
// Responsibilities:
// - Shift overview counters for the dashboard
// - Option vocabularies for the room form
// --------------------------------------------------

use axum::{extract::State, Json};

use crate::app::AppState;
use crate::logic::{self, DashboardSummary};
use crate::models::FormOptions;

// -----------------------------
// GET /api/dashboard
// Shift overview counters
// -----------------------------
pub async fn dashboard(State(state): State<AppState>) -> Json<DashboardSummary> {
    let board = state.board.lock().await;
    Json(logic::dashboard_summary(board.rooms()))
}

// -----------------------------
// GET /api/options
// Vocabularies for the room form
// -----------------------------
pub async fn options() -> Json<FormOptions> {
    Json(FormOptions::current())
}
