// Data and core logic
pub mod models; // Room, Task and the fixed option sets
pub mod error; // Board rejections and their HTTP mapping
pub mod store; // Persistence slot (load at boot, save after every change)
pub mod board; // Room/task board: the only sanctioned mutations
pub mod logic; // Derived views: sorting, directory filter, task feed, dashboard
pub mod suggest; // Task suggestions from a diagnosis
pub mod config; // CLI / env / TOML configuration

// HTTP surface
pub mod app; // Shared state and router
pub mod routes_rooms; // Room registration, editing and suggestions
pub mod routes_tasks; // Task add / toggle / delete and the task feed
pub mod routes_views; // Dashboard and form options

pub use app::{AppState, create_router};
pub use board::RoomBoard;
pub use error::BoardError;
