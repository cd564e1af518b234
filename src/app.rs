use std::{path::Path, sync::Arc};

use axum::{
    routing::{delete, get, post},
    Router,
};
use tokio::sync::Mutex;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::board::RoomBoard;
use crate::suggest::SuggestionService;
use crate::{routes_rooms, routes_tasks, routes_views};

/// Shared handler state: the one board plus the suggestion capability.
#[derive(Clone)]
pub struct AppState {
    pub board: Arc<Mutex<RoomBoard>>,
    pub suggester: Arc<dyn SuggestionService>,
}

impl AppState {
    pub fn new(board: RoomBoard, suggester: Arc<dyn SuggestionService>) -> Self {
        Self {
            board: Arc::new(Mutex::new(board)),
            suggester,
        }
    }
}

pub fn create_router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let api = Router::new()
        // rooms
        .route("/rooms", get(routes_rooms::list_rooms).post(routes_rooms::create_room))
        .route("/rooms/:id", get(routes_rooms::get_room).put(routes_rooms::update_room))
        .route("/rooms/:id/status", post(routes_rooms::toggle_status))
        .route("/rooms/:id/contraptions", post(routes_rooms::toggle_contraption))
        .route("/rooms/:id/precautions", post(routes_rooms::toggle_precaution))
        .route("/rooms/:id/suggestions", post(routes_rooms::request_suggestions))
        // tasks
        .route("/rooms/:id/tasks", get(routes_tasks::list_room_tasks).post(routes_tasks::add_task))
        .route("/rooms/:id/suggested-tasks", post(routes_tasks::apply_suggested_tasks))
        .route("/rooms/:id/tasks/:task_id", delete(routes_tasks::delete_task))
        .route("/rooms/:id/tasks/:task_id/toggle", post(routes_tasks::toggle_task))
        .route("/tasks", get(routes_tasks::task_feed))
        // views
        .route("/dashboard", get(routes_views::dashboard))
        .route("/options", get(routes_views::options));

    Router::new()
        .nest("/api", api)
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
