/*
Room/task board: the in-memory source of truth.
Every successful mutation stamps the touched room and re-saves the full list.
Unknown room or task ids are no-ops.
*/

use std::iter;

use chrono::{DateTime, Duration, Local, Utc};

use crate::error::BoardError;
use crate::models::{
    CONTRAPTIONS, IV_FLUIDS, PRECAUTIONS, Room, RoomId, RoomPatch, SUGGESTED_PREFIX, Task,
    TaskId,
};
use crate::store::Persistence;

pub struct RoomBoard {
    rooms: Vec<Room>,
    persistence: Box<dyn Persistence>,
    last_stamp: Option<DateTime<Utc>>, // newest timestamp handed out or loaded
}

impl RoomBoard {
    /// Boot the board from whatever the persistence slot holds.
    pub fn load(persistence: Box<dyn Persistence>) -> Self {
        let rooms = persistence.load();
        let last_stamp = rooms
            .iter()
            .flat_map(|r| iter::once(r.last_updated).chain(r.tasks.iter().map(|t| t.created_at)))
            .max();
        tracing::info!("board loaded with {} rooms", rooms.len());

        Self {
            rooms,
            persistence,
            last_stamp,
        }
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| &r.id == id)
    }

    // -----------------------------
    // Rooms
    // -----------------------------

    /// Register a room by number and return its id.
    pub fn create_room(&mut self, room_number: &str) -> Result<RoomId, BoardError> {
        let number = room_number.trim();
        if number.is_empty() {
            return Err(BoardError::InvalidInput("room number is required".into()));
        }
        if self.rooms.iter().any(|r| r.room_number == number) {
            return Err(BoardError::DuplicateRoom(number.to_string()));
        }

        let now = self.stamp();
        let room = Room::new(number, now);
        let id = room.id.clone();
        self.rooms.push(room);
        self.persist();

        tracing::info!("room {} registered as {}", number, id);
        Ok(id)
    }

    /// Merge a partial field update into a room.
    ///
    /// An unknown room is a no-op whatever the patch holds. Otherwise
    /// vocabulary-backed fields are validated before anything changes;
    /// duplicate set entries collapse to their first occurrence.
    pub fn update_room(
        &mut self,
        id: &RoomId,
        patch: RoomPatch,
    ) -> Result<Option<&Room>, BoardError> {
        let Some(idx) = self.position(id) else {
            return Ok(None);
        };
        if let Some(fluid) = patch.iv_fluid.as_deref() {
            if !fluid.is_empty() && !IV_FLUIDS.contains(&fluid) {
                return Err(BoardError::InvalidInput(format!("unknown IV fluid: {fluid}")));
            }
        }
        let contraptions = patch
            .contraptions
            .map(|items| vocabulary_set(items, &CONTRAPTIONS, "contraption"))
            .transpose()?;
        let precautions = patch
            .precautions
            .map(|items| vocabulary_set(items, &PRECAUTIONS, "precaution"))
            .transpose()?;

        let now = self.stamp();
        let room = &mut self.rooms[idx];

        if let Some(v) = patch.status {
            room.status = v;
        }
        if let Some(v) = patch.diagnosis {
            room.diagnosis = v;
        }
        if let Some(v) = patch.doctors {
            room.doctors = v;
        }
        if let Some(v) = patch.iv_fluid {
            room.iv_fluid = v;
        }
        if let Some(v) = patch.iv_fluid_other {
            room.iv_fluid_other = v;
        }
        if let Some(v) = patch.regulation {
            room.regulation = v;
        }
        if let Some(v) = patch.side_drips {
            room.side_drips = v;
        }
        if let Some(v) = contraptions {
            room.contraptions = v;
        }
        if let Some(v) = patch.contraptions_other {
            room.contraptions_other = v;
        }
        if let Some(v) = precautions {
            room.precautions = v;
        }
        if let Some(v) = patch.other_precaution {
            room.other_precaution = v;
        }
        if let Some(v) = patch.monitoring {
            room.monitoring = v;
        }
        if let Some(v) = patch.io_required {
            room.io_required = v;
        }
        room.last_updated = now;

        self.persist();
        Ok(Some(&self.rooms[idx]))
    }

    pub fn toggle_status(&mut self, id: &RoomId) -> Option<&Room> {
        let idx = self.position(id)?;
        let now = self.stamp();
        let room = &mut self.rooms[idx];
        room.status = room.status.toggled();
        room.last_updated = now;

        self.persist();
        Some(&self.rooms[idx])
    }

    pub fn toggle_contraption(
        &mut self,
        id: &RoomId,
        item: &str,
    ) -> Result<Option<&Room>, BoardError> {
        self.toggle_member(id, item, &CONTRAPTIONS, "contraption", |r| &mut r.contraptions)
    }

    pub fn toggle_precaution(
        &mut self,
        id: &RoomId,
        item: &str,
    ) -> Result<Option<&Room>, BoardError> {
        self.toggle_member(id, item, &PRECAUTIONS, "precaution", |r| &mut r.precautions)
    }

    // Checkbox semantics: add when absent, remove when present
    fn toggle_member(
        &mut self,
        id: &RoomId,
        item: &str,
        vocabulary: &[&str],
        kind: &str,
        field: fn(&mut Room) -> &mut Vec<String>,
    ) -> Result<Option<&Room>, BoardError> {
        let Some(idx) = self.position(id) else {
            return Ok(None);
        };
        if !vocabulary.contains(&item) {
            return Err(BoardError::InvalidInput(format!("unknown {kind}: {item}")));
        }
        let now = self.stamp();
        let room = &mut self.rooms[idx];
        let members = field(room);
        if let Some(pos) = members.iter().position(|m| m == item) {
            members.remove(pos);
        } else {
            members.push(item.to_string());
        }
        room.last_updated = now;

        self.persist();
        Ok(Some(&self.rooms[idx]))
    }

    // -----------------------------
    // Tasks
    // -----------------------------

    pub fn add_task(
        &mut self,
        room_id: &RoomId,
        description: &str,
    ) -> Result<Option<&Task>, BoardError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(BoardError::InvalidInput("task description is required".into()));
        }
        let Some(idx) = self.position(room_id) else {
            return Ok(None);
        };
        let now = self.stamp();
        let room = &mut self.rooms[idx];
        room.tasks.push(new_task(description.to_string(), now));
        room.last_updated = now;

        self.persist();
        Ok(self.rooms[idx].tasks.last())
    }

    /// Flip completion; the completion label exists only while completed.
    pub fn toggle_task(&mut self, room_id: &RoomId, task_id: &TaskId) -> Option<&Task> {
        let ridx = self.position(room_id)?;
        let Some(tidx) = self.rooms[ridx].tasks.iter().position(|t| &t.id == task_id) else {
            tracing::debug!("task {} not found in room {}, ignoring", task_id, room_id);
            return None;
        };
        let now = self.stamp();
        let room = &mut self.rooms[ridx];
        let task = &mut room.tasks[tidx];
        task.is_completed = !task.is_completed;
        task.completed_at = task.is_completed.then(completion_label);
        room.last_updated = now;

        self.persist();
        Some(&self.rooms[ridx].tasks[tidx])
    }

    /// Returns whether a task was removed.
    pub fn delete_task(&mut self, room_id: &RoomId, task_id: &TaskId) -> bool {
        let Some(idx) = self.position(room_id) else {
            return false;
        };
        let tasks = &mut self.rooms[idx].tasks;
        let before = tasks.len();
        tasks.retain(|t| &t.id != task_id);
        if tasks.len() == before {
            tracing::debug!("task {} not found in room {}, ignoring", task_id, room_id);
            return false;
        }
        let now = self.stamp();
        self.rooms[idx].last_updated = now;

        self.persist();
        true
    }

    /// Append one incomplete task per non-blank suggestion, each marked as suggested.
    ///
    /// Results are applied by room id, so a suggestion that arrives after the
    /// room is gone is simply dropped.
    pub fn apply_suggested_tasks<I, S>(&mut self, room_id: &RoomId, descriptions: I) -> Option<Vec<Task>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let idx = self.position(room_id)?;
        let mut added = Vec::new();
        for description in descriptions {
            let description = description.as_ref().trim();
            if description.is_empty() {
                continue;
            }
            let now = self.stamp();
            added.push(new_task(format!("{SUGGESTED_PREFIX}{description}"), now));
        }
        if added.is_empty() {
            return Some(added);
        }

        let room = &mut self.rooms[idx];
        room.tasks.extend(added.iter().cloned());
        if let Some(last) = added.last() {
            room.last_updated = last.created_at;
        }

        self.persist();
        tracing::info!("{} suggested tasks added to room {}", added.len(), room_id);
        Some(added)
    }

    // -----------------------------
    // Internals
    // -----------------------------

    fn position(&self, id: &RoomId) -> Option<usize> {
        let idx = self.rooms.iter().position(|r| &r.id == id);
        if idx.is_none() {
            tracing::debug!("room {} not found, ignoring", id);
        }
        idx
    }

    // Wall clock, nudged forward so stamps strictly increase within the process
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(next);
        next
    }

    fn persist(&self) {
        self.persistence.save(&self.rooms);
    }
}

fn new_task(description: String, now: DateTime<Utc>) -> Task {
    Task {
        id: TaskId::new(),
        description,
        is_completed: false,
        created_at: now,
        completed_at: None,
    }
}

// Local wall-clock label, e.g. "02:05 PM"
fn completion_label() -> String {
    Local::now().format("%I:%M %p").to_string()
}

fn vocabulary_set(
    items: Vec<String>,
    vocabulary: &[&str],
    kind: &str,
) -> Result<Vec<String>, BoardError> {
    let mut set: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !vocabulary.contains(&item.as_str()) {
            return Err(BoardError::InvalidInput(format!("unknown {kind}: {item}")));
        }
        if !set.contains(&item) {
            set.push(item);
        }
    }
    Ok(set)
}
