// --------------------------------------------------
// Handles API endpoints for registering rooms, editing
// their clinical fields and browsing the directory.
//
// Responsibilities:
// - Create / read / update rooms
// - Toggle status and checkbox-style field sets
// - Ask the suggestion service for tasks by diagnosis
// --------------------------------------------------

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::BoardError;
use crate::logic;
use crate::models::{Room, RoomId, RoomPatch, Task};
use crate::suggest;

#[derive(Debug, Deserialize)]
pub struct DirectoryQuery {
    pub q: Option<String>, // free text: physician or room number
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomInput {
    pub room_number: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ToggleItemInput {
    pub item: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SuggestionResult {
    pub tasks: Vec<Task>,
    pub precautions: String, // summary only, never applied to the room
}

// -----------------------------
// GET /api/rooms?q=
// Sorted directory, optionally filtered
// -----------------------------
pub async fn list_rooms(
    State(state): State<AppState>,
    Query(q): Query<DirectoryQuery>,
) -> Json<Vec<Room>> {
    let board = state.board.lock().await;
    let query = q.q.unwrap_or_default();
    let rooms = logic::filtered_directory(board.rooms(), &query)
        .into_iter()
        .cloned()
        .collect();
    Json(rooms)
}

// -----------------------------
// POST /api/rooms
// Registers a room; the new room is returned so clients can select it
// -----------------------------
pub async fn create_room(
    State(state): State<AppState>,
    Json(input): Json<CreateRoomInput>,
) -> Result<(StatusCode, Json<Room>), BoardError> {
    let mut board = state.board.lock().await;
    let id = board.create_room(&input.room_number)?;
    let room = board.room(&id).cloned().ok_or(BoardError::NotFound("room"))?;
    Ok((StatusCode::CREATED, Json(room)))
}

// -----------------------------
// GET /api/rooms/:id
// -----------------------------
pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<RoomId>,
) -> Result<Json<Room>, BoardError> {
    let board = state.board.lock().await;
    board
        .room(&id)
        .cloned()
        .map(Json)
        .ok_or(BoardError::NotFound("room"))
}

// -----------------------------
// PUT /api/rooms/:id
// Partial update; omitted fields keep their values
// -----------------------------
pub async fn update_room(
    State(state): State<AppState>,
    Path(id): Path<RoomId>,
    Json(patch): Json<RoomPatch>,
) -> Result<Json<Room>, BoardError> {
    let mut board = state.board.lock().await;
    board
        .update_room(&id, patch)?
        .cloned()
        .map(Json)
        .ok_or(BoardError::NotFound("room"))
}

// -----------------------------
// POST /api/rooms/:id/status
// Active <-> inactive
// -----------------------------
pub async fn toggle_status(
    State(state): State<AppState>,
    Path(id): Path<RoomId>,
) -> Result<Json<Room>, BoardError> {
    let mut board = state.board.lock().await;
    board
        .toggle_status(&id)
        .cloned()
        .map(Json)
        .ok_or(BoardError::NotFound("room"))
}

// -----------------------------
// POST /api/rooms/:id/contraptions
// -----------------------------
pub async fn toggle_contraption(
    State(state): State<AppState>,
    Path(id): Path<RoomId>,
    Json(input): Json<ToggleItemInput>,
) -> Result<Json<Room>, BoardError> {
    let mut board = state.board.lock().await;
    board
        .toggle_contraption(&id, &input.item)?
        .cloned()
        .map(Json)
        .ok_or(BoardError::NotFound("room"))
}

// -----------------------------
// POST /api/rooms/:id/precautions
// -----------------------------
pub async fn toggle_precaution(
    State(state): State<AppState>,
    Path(id): Path<RoomId>,
    Json(input): Json<ToggleItemInput>,
) -> Result<Json<Room>, BoardError> {
    let mut board = state.board.lock().await;
    board
        .toggle_precaution(&id, &input.item)?
        .cloned()
        .map(Json)
        .ok_or(BoardError::NotFound("room"))
}

// -----------------------------
// POST /api/rooms/:id/suggestions
// Ask for tasks matching the room's diagnosis and add them
// -----------------------------
pub async fn request_suggestions(
    State(state): State<AppState>,
    Path(id): Path<RoomId>,
) -> Result<Json<SuggestionResult>, BoardError> {
    // Lock is released while the service call is outstanding
    let diagnosis = {
        let board = state.board.lock().await;
        let room = board.room(&id).ok_or(BoardError::NotFound("room"))?;
        room.diagnosis.clone()
    };
    if diagnosis.trim().is_empty() {
        return Err(BoardError::InvalidInput(
            "enter a diagnosis first for smart suggestions".into(),
        ));
    }

    let Some(suggestions) = suggest::suggest_for(state.suggester.as_ref(), &diagnosis).await else {
        return Ok(Json(SuggestionResult::default()));
    };

    let mut board = state.board.lock().await;
    let Some(tasks) = board.apply_suggested_tasks(&id, &suggestions.suggested_tasks) else {
        tracing::info!("room {} is gone, discarding suggestions", id);
        return Ok(Json(SuggestionResult::default()));
    };

    Ok(Json(SuggestionResult {
        tasks,
        precautions: suggestions.precautions,
    }))
}
