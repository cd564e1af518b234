use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Fixed option sets offered by the room form
pub const PRECAUTIONS: [&str; 7] = [
    "NPO",
    "Strict Bed Rest",
    "Droplet Precaution",
    "Contact Precaution",
    "Airborne Precaution",
    "Left Arm Precaution",
    "Right Arm Precaution",
];

pub const CONTRAPTIONS: [&str; 5] = ["JP Drain", "IFC", "NGT", "Chest Tube", "Hemovac"];

pub const IV_FLUIDS: [&str; 6] = [
    "PNSS 1L",
    "D5LRS 1L",
    "D5NRSS 1L",
    "D50.3 NaCl 1L",
    "PLR 1L",
    IV_FLUID_OTHER,
];

// Sentinel fluid value; the actual name then lives in `iv_fluid_other`
pub const IV_FLUID_OTHER: &str = "Other";

// Marks tasks that came from the suggestion service
pub const SUGGESTED_PREFIX: &str = "Suggested: ";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl RoomId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    #[default]
    Active,
    Inactive,
}

impl RoomStatus {
    pub fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }
}

/// Vital-check interval: none, every hour, every two hours.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Monitoring {
    #[default]
    None,
    Q1,
    Q2,
}

impl Monitoring {
    pub const ALL: [Monitoring; 3] = [Monitoring::None, Monitoring::Q1, Monitoring::Q2];
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    #[serde(default)]
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    // Local "hh:mm AM" label, only while completed; not sortable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub room_number: String,
    #[serde(default)]
    pub status: RoomStatus,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub doctors: String,
    #[serde(default)]
    pub iv_fluid: String, // "" means no active line
    #[serde(default)]
    pub iv_fluid_other: String,
    #[serde(default)]
    pub regulation: String, // flow rate label, mL/hr
    #[serde(default)]
    pub side_drips: String,
    #[serde(default)]
    pub contraptions: Vec<String>,
    #[serde(default)]
    pub contraptions_other: String,
    #[serde(default)]
    pub precautions: Vec<String>,
    #[serde(default)]
    pub other_precaution: String,
    #[serde(default)]
    pub monitoring: Monitoring,
    #[serde(default)]
    pub io_required: bool,
    #[serde(default)]
    pub tasks: Vec<Task>,
    pub last_updated: DateTime<Utc>,
}

impl Room {
    /// A freshly registered room with every clinical field at its default.
    pub fn new(room_number: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: RoomId::new(),
            room_number: room_number.into(),
            status: RoomStatus::Active,
            diagnosis: String::new(),
            doctors: String::new(),
            iv_fluid: String::new(),
            iv_fluid_other: String::new(),
            regulation: String::new(),
            side_drips: String::new(),
            contraptions: Vec::new(),
            contraptions_other: String::new(),
            precautions: Vec::new(),
            other_precaution: String::new(),
            monitoring: Monitoring::None,
            io_required: false,
            tasks: Vec::new(),
            last_updated: now,
        }
    }

    /// The infusion as it should be shown, if a line is running.
    pub fn iv_fluid_label(&self) -> Option<&str> {
        match self.iv_fluid.as_str() {
            "" => None,
            IV_FLUID_OTHER => Some(self.iv_fluid_other.as_str()),
            fluid => Some(fluid),
        }
    }

    pub fn has_precautions(&self) -> bool {
        !self.precautions.is_empty() || !self.other_precaution.is_empty()
    }
}

/// Partial update for a room. `id`, room number and tasks are not patchable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RoomPatch {
    pub status: Option<RoomStatus>,
    pub diagnosis: Option<String>,
    pub doctors: Option<String>,
    pub iv_fluid: Option<String>,
    pub iv_fluid_other: Option<String>,
    pub regulation: Option<String>,
    pub side_drips: Option<String>,
    pub contraptions: Option<Vec<String>>,
    pub contraptions_other: Option<String>,
    pub precautions: Option<Vec<String>>,
    pub other_precaution: Option<String>,
    pub monitoring: Option<Monitoring>,
    pub io_required: Option<bool>,
}

// Options payload served to clients building the room form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormOptions {
    pub precautions: Vec<&'static str>,
    pub contraptions: Vec<&'static str>,
    pub iv_fluids: Vec<&'static str>,
    pub monitoring: Vec<Monitoring>,
}

impl FormOptions {
    pub fn current() -> Self {
        Self {
            precautions: PRECAUTIONS.to_vec(),
            contraptions: CONTRAPTIONS.to_vec(),
            iv_fluids: IV_FLUIDS.to_vec(),
            monitoring: Monitoring::ALL.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_shape_uses_camel_case_and_string_enums() {
        let mut room = Room::new("204", Utc::now());
        room.monitoring = Monitoring::Q2;
        room.status = RoomStatus::Inactive;
        let v = serde_json::to_value(&room).unwrap();

        assert_eq!(v["roomNumber"], "204");
        assert_eq!(v["status"], "inactive");
        assert_eq!(v["monitoring"], "Q2");
        assert_eq!(v["ioRequired"], false);
        assert!(v["lastUpdated"].is_string());
        assert!(v.get("ivFluidOther").is_some());
    }

    #[test]
    fn legacy_room_with_missing_fields_loads_with_defaults() {
        let json = r#"{
            "id": "rm_1700000000000_ab12c",
            "roomNumber": "12",
            "lastUpdated": "2024-05-01T08:30:00.000Z",
            "tasks": [{
                "id": "tk_1700000000001",
                "description": "Check vitals",
                "isCompleted": true,
                "completedAt": "08:45 AM",
                "createdAt": "2024-05-01T08:31:00.000Z"
            }]
        }"#;
        let room: Room = serde_json::from_str(json).unwrap();

        assert_eq!(room.id.as_str(), "rm_1700000000000_ab12c");
        assert_eq!(room.status, RoomStatus::Active);
        assert_eq!(room.monitoring, Monitoring::None);
        assert!(room.contraptions.is_empty());
        assert_eq!(room.tasks[0].completed_at.as_deref(), Some("08:45 AM"));
    }

    #[test]
    fn incomplete_task_omits_completed_at() {
        let task = Task {
            id: TaskId::new(),
            description: "Reposition".into(),
            is_completed: false,
            created_at: Utc::now(),
            completed_at: None,
        };
        let v = serde_json::to_value(&task).unwrap();
        assert!(v.get("completedAt").is_none());
        assert_eq!(v["isCompleted"], false);
    }

    #[test]
    fn iv_fluid_label_follows_other_sentinel() {
        let mut room = Room::new("3", Utc::now());
        assert_eq!(room.iv_fluid_label(), None);

        room.iv_fluid = "PLR 1L".into();
        room.iv_fluid_other = "stale text".into();
        assert_eq!(room.iv_fluid_label(), Some("PLR 1L"));

        room.iv_fluid = IV_FLUID_OTHER.into();
        room.iv_fluid_other = "D5W 500mL".into();
        assert_eq!(room.iv_fluid_label(), Some("D5W 500mL"));
    }

    #[test]
    fn patch_rejects_id_field() {
        let err = serde_json::from_str::<RoomPatch>(r#"{"id":"x"}"#);
        assert!(err.is_err());
    }
}
