/*
Derived views over the room list.
Module was independently written from HTTP / Axum for testing:
every function here is pure, the same rooms always give the same answer.
*/

use std::cmp::Ordering;

use serde::Serialize;

use crate::models::{Monitoring, Room, RoomId, RoomStatus, Task};

// One row of the cross-room task tracker
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub room_id: RoomId,
    pub room_number: String,
    #[serde(flatten)]
    pub task: Task,
}

// Shift overview counters, derived on demand and never stored
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub active_rooms: usize,
    pub strict_io: Vec<String>,
    pub monitored: Vec<String>,
    pub with_precautions: Vec<String>,
}

// Compare room numbers the way a person reads them:
// digit runs by numeric value ("2" < "10"), everything else case-insensitively.
pub fn compare_room_numbers(a: &str, b: &str) -> Ordering {
    let mut xs = chunks(a);
    let mut ys = chunks(b);

    loop {
        match (xs.next(), ys.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (is_digits(x), is_digits(y)) {
                    (true, true) => compare_numeric(x, y),
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    (false, false) => x.to_lowercase().cmp(&y.to_lowercase()),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

// Split into alternating runs of ASCII digits and non-digits
fn chunks(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digit = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digit)
            .unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

// Arbitrary-length digit runs: strip leading zeros, then longer is bigger
fn compare_numeric(x: &str, y: &str) -> Ordering {
    let x = x.trim_start_matches('0');
    let y = y.trim_start_matches('0');
    x.len().cmp(&y.len()).then_with(|| x.cmp(y))
}

/// Active rooms first, then room number in reading order. Stable otherwise.
pub fn sorted_rooms(rooms: &[Room]) -> Vec<&Room> {
    let mut sorted: Vec<&Room> = rooms.iter().collect();
    sorted.sort_by(|a, b| {
        status_rank(a.status)
            .cmp(&status_rank(b.status))
            .then_with(|| compare_room_numbers(&a.room_number, &b.room_number))
    });
    sorted
}

fn status_rank(status: RoomStatus) -> u8 {
    match status {
        RoomStatus::Active => 0,
        RoomStatus::Inactive => 1,
    }
}

/// Directory search. Physicians match case-insensitively, room numbers exactly as typed.
pub fn filtered_directory<'a>(rooms: &'a [Room], query: &str) -> Vec<&'a Room> {
    let sorted = sorted_rooms(rooms);
    if query.trim().is_empty() {
        return sorted;
    }

    let needle = query.to_lowercase();
    sorted
        .into_iter()
        .filter(|r| r.doctors.to_lowercase().contains(&needle) || r.room_number.contains(query))
        .collect()
}

/// Every task on the floor, newest first, tagged with its room.
pub fn task_feed(rooms: &[Room]) -> Vec<FeedEntry> {
    let mut feed: Vec<FeedEntry> = rooms
        .iter()
        .flat_map(|room| {
            room.tasks.iter().map(|task| FeedEntry {
                room_id: room.id.clone(),
                room_number: room.room_number.clone(),
                task: task.clone(),
            })
        })
        .collect();

    // stable: equal timestamps keep room/insertion order
    feed.sort_by(|a, b| b.task.created_at.cmp(&a.task.created_at));
    feed
}

/// One room's tasks, newest first.
pub fn room_tasks(room: &Room) -> Vec<&Task> {
    let mut tasks: Vec<&Task> = room.tasks.iter().collect();
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    tasks
}

pub fn dashboard_summary(rooms: &[Room]) -> DashboardSummary {
    let sorted = sorted_rooms(rooms);
    let numbers = |pred: fn(&Room) -> bool| -> Vec<String> {
        sorted
            .iter()
            .filter(|r| pred(r))
            .map(|r| r.room_number.clone())
            .collect()
    };

    DashboardSummary {
        active_rooms: rooms.iter().filter(|r| r.status == RoomStatus::Active).count(),
        strict_io: numbers(|r| r.io_required),
        monitored: numbers(|r| r.monitoring != Monitoring::None),
        with_precautions: numbers(Room::has_precautions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    use crate::models::TaskId;

    fn room(number: &str, status: RoomStatus) -> Room {
        let mut r = Room::new(number, Utc::now());
        r.status = status;
        r
    }

    fn numbers(rooms: &[&Room]) -> Vec<String> {
        rooms.iter().map(|r| r.room_number.clone()).collect()
    }

    fn task(description: &str, created_at: chrono::DateTime<Utc>) -> Task {
        Task {
            id: TaskId::new(),
            description: description.into(),
            is_completed: false,
            created_at,
            completed_at: None,
        }
    }

    #[test]
    fn room_numbers_compare_numerically() {
        assert_eq!(compare_room_numbers("2", "10"), Ordering::Less);
        assert_eq!(compare_room_numbers("10", "3"), Ordering::Greater);
        assert_eq!(compare_room_numbers("007", "7"), Ordering::Equal);
        assert_eq!(compare_room_numbers("ICU-2", "ICU-10"), Ordering::Less);
        assert_eq!(compare_room_numbers("a1", "B1"), Ordering::Less);
        assert_eq!(compare_room_numbers("12", "12A"), Ordering::Less);
    }

    #[test]
    fn huge_digit_runs_do_not_overflow() {
        let big = "99999999999999999999999999";
        assert_eq!(compare_room_numbers(big, "100000000000000000000000000"), Ordering::Less);
    }

    #[test]
    fn active_rooms_sort_first_then_by_number() {
        let rooms = vec![
            room("10", RoomStatus::Active),
            room("1", RoomStatus::Inactive),
            room("2", RoomStatus::Active),
            room("3", RoomStatus::Active),
        ];
        assert_eq!(numbers(&sorted_rooms(&rooms)), vec!["2", "3", "10", "1"]);
    }

    #[test]
    fn empty_query_returns_sorted_rooms() {
        let rooms = vec![room("10", RoomStatus::Active), room("2", RoomStatus::Active)];
        assert_eq!(filtered_directory(&rooms, ""), sorted_rooms(&rooms));
        assert_eq!(filtered_directory(&rooms, "   "), sorted_rooms(&rooms));
    }

    #[test]
    fn query_matches_doctors_case_insensitively() {
        let mut a = room("101", RoomStatus::Active);
        a.doctors = "Dr. Smith / Dr. Reyes".into();
        let mut b = room("102", RoomStatus::Active);
        b.doctors = "Dr. Tan".into();
        let mut c = room("103", RoomStatus::Inactive);
        c.doctors = "dr. SMITHSON".into();
        let rooms = vec![a, b, c];

        assert_eq!(numbers(&filtered_directory(&rooms, "Smith")), vec!["101", "103"]);
        assert_eq!(numbers(&filtered_directory(&rooms, "smith")), vec!["101", "103"]);
    }

    #[test]
    fn query_matches_room_number_substring() {
        let rooms = vec![
            room("204", RoomStatus::Active),
            room("120", RoomStatus::Active),
            room("305", RoomStatus::Active),
        ];
        assert_eq!(numbers(&filtered_directory(&rooms, "20")), vec!["120", "204"]);
    }

    #[test]
    fn feed_is_newest_first_across_rooms() {
        let t1 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let t2 = t1 + Duration::minutes(5);

        let mut a = room("1", RoomStatus::Active);
        a.tasks.push(task("older", t1));
        let mut b = room("2", RoomStatus::Active);
        b.tasks.push(task("newer", t2));
        let rooms = vec![a, b];

        let feed = task_feed(&rooms);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].task.description, "newer");
        assert_eq!(feed[0].room_number, "2");
        assert_eq!(feed[0].room_id, rooms[1].id);
        assert_eq!(feed[1].task.description, "older");
    }

    #[test]
    fn feed_ties_keep_original_order() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut a = room("1", RoomStatus::Active);
        a.tasks.push(task("first", t));
        a.tasks.push(task("second", t));
        let rooms = vec![a];

        let feed = task_feed(&rooms);
        assert_eq!(feed[0].task.description, "first");
        assert_eq!(feed[1].task.description, "second");
    }

    #[test]
    fn feed_entry_serializes_flat() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut a = room("4", RoomStatus::Active);
        a.tasks.push(task("Check vitals", t));
        let v = serde_json::to_value(&task_feed(&[a])[0]).unwrap();
        assert_eq!(v["roomNumber"], "4");
        assert_eq!(v["description"], "Check vitals");
        assert_eq!(v["isCompleted"], false);
    }

    #[test]
    fn room_tasks_are_newest_first() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut a = room("1", RoomStatus::Active);
        a.tasks.push(task("early", t));
        a.tasks.push(task("late", t + Duration::hours(1)));
        let tasks = room_tasks(&a);
        assert_eq!(tasks[0].description, "late");
    }

    #[test]
    fn dashboard_counts_and_lists_in_sorted_order() {
        let mut a = room("10", RoomStatus::Active);
        a.io_required = true;
        a.monitoring = Monitoring::Q2;
        let mut b = room("2", RoomStatus::Active);
        b.io_required = true;
        b.other_precaution = "Fall risk".into();
        let mut c = room("3", RoomStatus::Inactive);
        c.precautions = vec!["NPO".into()];
        c.monitoring = Monitoring::Q1;
        let rooms = vec![a, b, c];

        let summary = dashboard_summary(&rooms);
        assert_eq!(summary.active_rooms, 2);
        assert_eq!(summary.strict_io, vec!["2", "10"]);
        assert_eq!(summary.monitored, vec!["10", "3"]);
        assert_eq!(summary.with_precautions, vec!["2", "3"]);
    }
}
