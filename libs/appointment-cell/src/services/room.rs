// libs/appointment-cell/src/services/room.rs
//! Deterministic room assignment.
//!
//! Keys are hashed with a 31-multiplier rolling hash over UTF-16 code units
//! using wrapping 32-bit signed arithmetic, so a key lands in the same room as
//! it does in the browser-side implementation of the same function. Distinct
//! keys may share a room; nothing here detects or resolves that.

use chrono::NaiveDate;

use crate::models::VideoRoom;

/// Number of rooms at Gihundwe Hospital, used for both in-person and video rooms.
pub const HOSPITAL_ROOM_POOL: usize = 20;

pub fn room_hash(key: &str) -> i32 {
    key.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

/// Index in `[0, pool_size)`. A zero-sized pool maps everything to 0.
pub fn room_index(key: &str, pool_size: usize) -> usize {
    if pool_size == 0 {
        return 0;
    }
    // unsigned_abs keeps i32::MIN at 2^31 instead of overflowing
    room_hash(key).unsigned_abs() as usize % pool_size
}

pub fn room_label(index: usize) -> String {
    format!("Room-{:02}", index + 1)
}

pub fn assign_room(key: &str) -> String {
    room_label(room_index(key, HOSPITAL_ROOM_POOL))
}

/// A missing patient id keys as `"null"`, matching rooms already handed out
/// for rows stored without one.
pub fn in_person_room_key(patient_id: Option<&str>, appointment_date: NaiveDate) -> String {
    format!(
        "{}{}",
        patient_id.unwrap_or("null"),
        appointment_date.format("%Y-%m-%d")
    )
}

pub fn in_person_room(patient_id: Option<&str>, appointment_date: NaiveDate) -> String {
    assign_room(&in_person_room_key(patient_id, appointment_date))
}

/// Video room for an appointment, keyed by appointment id.
pub fn video_room_for(appointment_id: &str, appointment_date: NaiveDate, base_url: &str) -> VideoRoom {
    let room_number = room_index(appointment_id, HOSPITAL_ROOM_POOL) + 1;
    let room_name = format!(
        "iTABAZA-Room-{}-{:02}",
        appointment_date.format("%Y%m%d"),
        room_number
    );
    let slug: String = room_name
        .to_lowercase()
        .chars()
        .filter(|c| *c != '-')
        .collect();

    VideoRoom {
        room_id: room_number as i64,
        url: format!("{}/itabaza-{}", base_url.trim_end_matches('/'), slug),
        room_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn empty_key_maps_to_first_room() {
        assert_eq!(room_hash(""), 0);
        for pool in [1, 20, 23, 100] {
            assert_eq!(room_index("", pool), 0);
        }
        assert_eq!(assign_room(""), "Room-01");
    }

    #[test]
    fn known_hash_values() {
        assert_eq!(room_hash("abc"), 96354);
        assert_eq!(room_hash("hello"), 99162322);
        assert_eq!(room_hash("Hello World"), -862545276);
        assert_eq!(room_hash("é"), 233);
    }

    #[test]
    fn wraps_like_signed_32_bit() {
        assert_eq!(room_hash("polygenelubricants"), i32::MIN);
        assert_eq!(room_index("polygenelubricants", 20), 8);
        assert_eq!(room_index("Hello World", 20), 16);
        assert_eq!(room_index("p-1012025-07-27", 20), 8);
    }

    #[test]
    fn index_is_stable_and_bounded() {
        let keys = ["", "a", "appointment-42", "a7f3c2d1-2025-07-27", "Ωmega", "🙂"];
        for pool in [1usize, 7, 20, 23] {
            for key in keys {
                let first = room_index(key, pool);
                assert_eq!(first, room_index(key, pool));
                assert!(first < pool);
            }
        }
        assert_eq!(room_index("anything", 0), 0);
    }

    #[test]
    fn colliding_keys_share_a_room() {
        let first = in_person_room_key(Some("Aa"), date("2025-07-27"));
        let second = in_person_room_key(Some("BB"), date("2025-07-27"));
        assert_ne!(first, second);
        assert_eq!(room_hash(&first), room_hash(&second));
        assert_eq!(
            in_person_room(Some("Aa"), date("2025-07-27")),
            in_person_room(Some("BB"), date("2025-07-27"))
        );
        assert_eq!(in_person_room(Some("Aa"), date("2025-07-27")), "Room-20");
    }

    #[test]
    fn missing_patient_keys_as_null() {
        let key = in_person_room_key(None, date("2025-07-27"));
        assert_eq!(key, "null2025-07-27");
        assert_eq!(
            in_person_room(None, date("2025-07-27")),
            assign_room("null2025-07-27")
        );
    }

    #[test]
    fn video_room_is_derived_from_appointment_id() {
        let room = video_room_for("appointment-42", date("2025-07-27"), "https://meet.jit.si/");
        assert_eq!(room.room_id, 17);
        assert_eq!(room.room_name, "iTABAZA-Room-20250727-17");
        assert_eq!(room.url, "https://meet.jit.si/itabaza-itabazaroom2025072717");
        assert_eq!(room, video_room_for("appointment-42", date("2025-07-27"), "https://meet.jit.si"));
    }
}
