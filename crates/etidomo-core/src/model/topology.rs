use serde::Serialize;

use etidomo_api::{FloorRecord, RoomRecord};

/// A floor of the plant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Floor {
    pub id: i64,
    pub name: String,
}

impl Floor {
    /// Stand-in for an id the gateway never listed.
    pub fn placeholder(id: i64) -> Self {
        Self {
            id,
            name: format!("Floor #{id}"),
        }
    }

    /// Look `id` up in `floors`, falling back to a placeholder.
    pub fn resolve(floors: &[Floor], id: i64) -> Self {
        floors
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .unwrap_or_else(|| Self::placeholder(id))
    }
}

impl From<FloorRecord> for Floor {
    fn from(r: FloorRecord) -> Self {
        Self {
            id: r.floor_ind,
            name: r.name,
        }
    }
}

/// A room, optionally attached to a floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub floor_id: Option<i64>,
}

impl Room {
    pub fn placeholder(id: i64, floor_id: Option<i64>) -> Self {
        Self {
            id,
            name: format!("Room #{id}"),
            floor_id,
        }
    }

    pub fn resolve(rooms: &[Room], id: i64, floor_id: Option<i64>) -> Self {
        rooms
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .unwrap_or_else(|| Self::placeholder(id, floor_id))
    }
}

impl From<RoomRecord> for Room {
    fn from(r: RoomRecord) -> Self {
        Self {
            id: r.room_ind,
            name: r.name,
            floor_id: Some(r.floor_ind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ids_get_placeholders() {
        let floors = vec![Floor {
            id: 0,
            name: "Ground".into(),
        }];
        assert_eq!(Floor::resolve(&floors, 0).name, "Ground");
        assert_eq!(Floor::resolve(&floors, 7).name, "Floor #7");

        let room = Room::resolve(&[], 12, Some(1));
        assert_eq!(room.name, "Room #12");
        assert_eq!(room.floor_id, Some(1));
    }
}
