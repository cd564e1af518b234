// --------------------------------------------------
// Handles API endpoints for shift tasks.
//
// Responsibilities:
// - Add / toggle / delete a room's tasks
// - Bulk-add suggested tasks
// - Cross-room task feed
// --------------------------------------------------

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::BoardError;
use crate::logic::{self, FeedEntry};
use crate::models::{RoomId, Task, TaskId};

#[derive(Debug, Deserialize, Serialize)]
pub struct AddTaskInput {
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ApplySuggestedInput {
    pub descriptions: Vec<String>,
}

// -----------------------------
// GET /api/tasks
// Every task on the floor, newest first
// -----------------------------
pub async fn task_feed(State(state): State<AppState>) -> Json<Vec<FeedEntry>> {
    let board = state.board.lock().await;
    Json(logic::task_feed(board.rooms()))
}

// -----------------------------
// GET /api/rooms/:id/tasks
// -----------------------------
pub async fn list_room_tasks(
    State(state): State<AppState>,
    Path(id): Path<RoomId>,
) -> Result<Json<Vec<Task>>, BoardError> {
    let board = state.board.lock().await;
    let room = board.room(&id).ok_or(BoardError::NotFound("room"))?;
    Ok(Json(logic::room_tasks(room).into_iter().cloned().collect()))
}

// -----------------------------
// POST /api/rooms/:id/tasks
// -----------------------------
pub async fn add_task(
    State(state): State<AppState>,
    Path(id): Path<RoomId>,
    Json(input): Json<AddTaskInput>,
) -> Result<(StatusCode, Json<Task>), BoardError> {
    let mut board = state.board.lock().await;
    let task = board
        .add_task(&id, &input.description)?
        .cloned()
        .ok_or(BoardError::NotFound("room"))?;
    Ok((StatusCode::CREATED, Json(task)))
}

// -----------------------------
// POST /api/rooms/:id/tasks/:task_id/toggle
// Complete <-> incomplete
// -----------------------------
pub async fn toggle_task(
    State(state): State<AppState>,
    Path((id, task_id)): Path<(RoomId, TaskId)>,
) -> Result<Json<Task>, BoardError> {
    let mut board = state.board.lock().await;
    board
        .toggle_task(&id, &task_id)
        .cloned()
        .map(Json)
        .ok_or(BoardError::NotFound("task"))
}

// -----------------------------
// DELETE /api/rooms/:id/tasks/:task_id
// -----------------------------
pub async fn delete_task(
    State(state): State<AppState>,
    Path((id, task_id)): Path<(RoomId, TaskId)>,
) -> Result<Json<serde_json::Value>, BoardError> {
    let mut board = state.board.lock().await;
    if !board.delete_task(&id, &task_id) {
        return Err(BoardError::NotFound("task"));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

// -----------------------------
// POST /api/rooms/:id/suggested-tasks
// Adds already-fetched suggestions, each marked as suggested
// -----------------------------
pub async fn apply_suggested_tasks(
    State(state): State<AppState>,
    Path(id): Path<RoomId>,
    Json(input): Json<ApplySuggestedInput>,
) -> Result<Json<Vec<Task>>, BoardError> {
    let mut board = state.board.lock().await;
    board
        .apply_suggested_tasks(&id, &input.descriptions)
        .map(Json)
        .ok_or(BoardError::NotFound("room"))
}
