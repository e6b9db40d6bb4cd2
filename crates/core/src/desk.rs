//! Front-desk state machine: inventory, bookings, cancellations.

use chrono::Utc;
use thiserror::Error;
use tracing::warn;

use crate::{
    ledger::{LedgerSnapshot, LedgerStore},
    models::{Reservation, Room},
};

/// Errors surfaced to the user by front-desk operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeskError {
    /// No free room matches the requested category.
    #[error("no available rooms in category: {0}")]
    NoRoomInCategory(String),
    /// The reservation id does not exist in the ledger.
    #[error("reservation {0} not found")]
    ReservationNotFound(u32),
}

/// How the persisted ledger was reconciled at startup.
#[derive(Debug)]
pub enum RestoreOutcome {
    /// No snapshot on disk; starting with an empty ledger.
    Fresh,
    /// Snapshot applied.
    Restored {
        /// Number of reservations carried over from the snapshot.
        reservations: usize,
    },
    /// Snapshot unreadable or corrupt; starting empty.
    Failed {
        /// Human-readable failure description.
        reason: String,
    },
}

/// Result of a successful booking or cancellation.
#[derive(Debug, Clone)]
pub struct Confirmation {
    /// The reservation that was created (booking) or removed (cancellation).
    pub reservation: Reservation,
    /// Category of the affected room.
    pub category: String,
    /// Set when the follow-up snapshot write failed; the in-memory
    /// ledger stays authoritative either way.
    pub persist_error: Option<String>,
}

/// The fixed five-room inventory the binary starts with.
pub fn default_inventory() -> Vec<Room> {
    vec![
        Room::new(101, "Standard"),
        Room::new(102, "Deluxe"),
        Room::new(201, "Suite"),
        Room::new(202, "Standard"),
        Room::new(301, "Deluxe"),
    ]
}

/// Owns the room inventory and reservation ledger for the process
/// lifetime. Every mutation is followed by a whole-state snapshot write.
pub struct FrontDesk {
    rooms: Vec<Room>,
    reservations: Vec<Reservation>,
    next_id: u32,
    store: LedgerStore,
}

impl FrontDesk {
    /// Open the desk with the given inventory, restoring any persisted
    /// ledger.
    ///
    /// Restore failures never abort startup; the returned outcome reports
    /// what happened so the caller can surface it.
    pub fn open(inventory: Vec<Room>, store: LedgerStore) -> (Self, RestoreOutcome) {
        let mut desk = Self {
            rooms: inventory,
            reservations: Vec::new(),
            next_id: 1,
            store,
        };

        let outcome = match desk.store.load() {
            Ok(Some(snapshot)) => desk.restore(snapshot),
            Ok(None) => RestoreOutcome::Fresh,
            Err(err) => {
                warn!("failed to load ledger snapshot: {err:#}");
                RestoreOutcome::Failed {
                    reason: format!("{err:#}"),
                }
            }
        };

        (desk, outcome)
    }

    /// Book the first free room whose category matches `category`
    /// (case-insensitive), scanning the inventory in order.
    pub fn reserve(&mut self, customer: &str, category: &str) -> Result<Confirmation, DeskError> {
        let room = self
            .rooms
            .iter_mut()
            .find(|room| !room.booked && room.category.eq_ignore_ascii_case(category))
            .ok_or_else(|| DeskError::NoRoomInCategory(category.to_string()))?;

        room.booked = true;
        let room_category = room.category.clone();
        let reservation = Reservation {
            id: self.next_id,
            customer: customer.to_string(),
            room_id: room.id,
            reserved_at: Utc::now(),
        };
        self.next_id += 1;
        self.reservations.push(reservation.clone());

        Ok(Confirmation {
            reservation,
            category: room_category,
            persist_error: self.persist(),
        })
    }

    /// Cancel the reservation with the given id, freeing its room.
    pub fn cancel(&mut self, reservation_id: u32) -> Result<Confirmation, DeskError> {
        let index = self
            .reservations
            .iter()
            .position(|reservation| reservation.id == reservation_id)
            .ok_or(DeskError::ReservationNotFound(reservation_id))?;

        let reservation = self.reservations.remove(index);
        let category = match self
            .rooms
            .iter_mut()
            .find(|room| room.id == reservation.room_id)
        {
            Some(room) => {
                room.booked = false;
                room.category.clone()
            }
            None => {
                warn!(
                    reservation = reservation.id,
                    room = reservation.room_id,
                    "cancelled reservation referenced a room missing from the inventory"
                );
                String::new()
            }
        };

        Ok(Confirmation {
            reservation,
            category,
            persist_error: self.persist(),
        })
    }

    /// Rooms currently free, in inventory order.
    pub fn available_rooms(&self) -> Vec<&Room> {
        self.rooms.iter().filter(|room| !room.booked).collect()
    }

    /// All reservations in ledger order.
    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    /// Full inventory, including booked rooms.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Look up an inventory room by identifier.
    pub fn room(&self, id: u32) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == id)
    }

    fn restore(&mut self, snapshot: LedgerSnapshot) -> RestoreOutcome {
        let mut restored = Vec::with_capacity(snapshot.reservations.len());
        for reservation in snapshot.reservations {
            match self
                .rooms
                .iter_mut()
                .find(|room| room.id == reservation.room_id)
            {
                Some(room) if room.booked => {
                    warn!(
                        reservation = reservation.id,
                        room = room.id,
                        "dropping restored reservation for an already booked room"
                    );
                }
                Some(room) => {
                    room.booked = true;
                    restored.push(reservation);
                }
                None => {
                    warn!(
                        reservation = reservation.id,
                        room = reservation.room_id,
                        "dropping restored reservation for a room missing from the inventory"
                    );
                }
            }
        }

        // A tampered or stale counter must never hand out a duplicate id.
        let max_id = restored.iter().map(|r| r.id).max().unwrap_or(0);
        self.next_id = snapshot.next_id.max(max_id + 1);
        let count = restored.len();
        self.reservations = restored;
        RestoreOutcome::Restored {
            reservations: count,
        }
    }

    fn persist(&self) -> Option<String> {
        let snapshot = LedgerSnapshot::new(self.reservations.clone(), self.next_id);
        match self.store.save(&snapshot) {
            Ok(()) => None,
            Err(err) => {
                warn!("failed to persist ledger snapshot: {err:#}");
                Some(format!("{err:#}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::{fs, path::Path};
    use tempfile::tempdir;

    fn open_desk(dir: &Path) -> (FrontDesk, RestoreOutcome) {
        FrontDesk::open(
            default_inventory(),
            LedgerStore::new(dir.join("ledger.json")),
        )
    }

    #[test]
    fn booking_flips_the_room_flag() -> Result<()> {
        let dir = tempdir()?;
        let (mut desk, _) = open_desk(dir.path());

        assert!(!desk.room(201).expect("room 201 exists").booked);
        let confirmation = desk.reserve("Dana", "Suite")?;
        assert_eq!(confirmation.reservation.room_id, 201);
        assert_eq!(confirmation.category, "Suite");
        assert!(confirmation.persist_error.is_none());
        assert!(desk.room(201).expect("room 201 exists").booked);
        Ok(())
    }

    #[test]
    fn booking_follows_inventory_order_case_insensitively() -> Result<()> {
        let dir = tempdir()?;
        let (mut desk, _) = open_desk(dir.path());

        let alice = desk.reserve("Alice", "standard")?;
        assert_eq!(alice.reservation.id, 1);
        assert_eq!(alice.reservation.room_id, 101);

        let bob = desk.reserve("Bob", "Standard")?;
        assert_eq!(bob.reservation.id, 2);
        assert_eq!(bob.reservation.room_id, 202);

        let carol = desk.reserve("Carol", "Standard");
        assert_eq!(
            carol.unwrap_err(),
            DeskError::NoRoomInCategory("Standard".to_string())
        );

        desk.cancel(1)?;
        assert!(!desk.room(101).expect("room 101 exists").booked);

        let remaining = desk.reservations();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, 2);
        assert_eq!(remaining[0].customer, "Bob");
        assert_eq!(remaining[0].room_id, 202);
        Ok(())
    }

    #[test]
    fn exhausted_category_changes_no_state() -> Result<()> {
        let dir = tempdir()?;
        let (mut desk, _) = open_desk(dir.path());
        desk.reserve("Erin", "Suite")?;

        let err = desk.reserve("Frank", "Suite").unwrap_err();
        assert_eq!(err, DeskError::NoRoomInCategory("Suite".to_string()));
        assert_eq!(desk.reservations().len(), 1);
        assert_eq!(desk.available_rooms().len(), 4);
        Ok(())
    }

    #[test]
    fn cancelling_unknown_id_changes_no_state() -> Result<()> {
        let dir = tempdir()?;
        let (mut desk, _) = open_desk(dir.path());
        desk.reserve("Grace", "Deluxe")?;

        let err = desk.cancel(99).unwrap_err();
        assert_eq!(err, DeskError::ReservationNotFound(99));
        assert_eq!(desk.reservations().len(), 1);
        assert!(desk.room(102).expect("room 102 exists").booked);
        Ok(())
    }

    #[test]
    fn cancelled_room_is_listed_as_available_again() -> Result<()> {
        let dir = tempdir()?;
        let (mut desk, _) = open_desk(dir.path());
        let confirmation = desk.reserve("Heidi", "Deluxe")?;
        let booked_room = confirmation.reservation.room_id;
        assert!(desk
            .available_rooms()
            .iter()
            .all(|room| room.id != booked_room));

        desk.cancel(confirmation.reservation.id)?;
        assert!(desk
            .available_rooms()
            .iter()
            .any(|room| room.id == booked_room));
        assert!(desk.reservations().is_empty());
        Ok(())
    }

    #[test]
    fn restart_restores_the_same_ledger() -> Result<()> {
        let dir = tempdir()?;
        let (mut desk, _) = open_desk(dir.path());
        desk.reserve("Alice", "Standard")?;
        desk.reserve("Bob", "Suite")?;
        drop(desk);

        let (mut desk, outcome) = open_desk(dir.path());
        assert!(matches!(
            outcome,
            RestoreOutcome::Restored { reservations: 2 }
        ));

        let tuples: Vec<_> = desk
            .reservations()
            .iter()
            .map(|r| (r.id, r.customer.clone(), r.room_id))
            .collect();
        assert_eq!(
            tuples,
            vec![
                (1, "Alice".to_string(), 101),
                (2, "Bob".to_string(), 201)
            ]
        );
        for room in desk.rooms() {
            assert_eq!(room.booked, room.id == 101 || room.id == 201);
        }

        // The restored counter keeps assigning past the loaded ids.
        let next = desk.reserve("Carol", "Deluxe")?;
        assert_eq!(next.reservation.id, 3);
        Ok(())
    }

    #[test]
    fn missing_snapshot_starts_fresh() -> Result<()> {
        let dir = tempdir()?;
        let (desk, outcome) = open_desk(dir.path());
        assert!(matches!(outcome, RestoreOutcome::Fresh));
        assert!(desk.reservations().is_empty());
        assert_eq!(desk.available_rooms().len(), 5);
        Ok(())
    }

    #[test]
    fn corrupt_snapshot_starts_empty_without_aborting() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("ledger.json"), "{ definitely broken")?;

        let (desk, outcome) = open_desk(dir.path());
        assert!(matches!(outcome, RestoreOutcome::Failed { .. }));
        assert!(desk.reservations().is_empty());
        assert_eq!(desk.available_rooms().len(), 5);
        Ok(())
    }

    #[test]
    fn restore_skips_records_for_unknown_rooms() -> Result<()> {
        let dir = tempdir()?;
        let store = LedgerStore::new(dir.path().join("ledger.json"));
        store.save(&LedgerSnapshot::new(
            vec![
                Reservation {
                    id: 1,
                    customer: "Ivan".to_string(),
                    room_id: 999,
                    reserved_at: Utc::now(),
                },
                Reservation {
                    id: 2,
                    customer: "Judy".to_string(),
                    room_id: 102,
                    reserved_at: Utc::now(),
                },
            ],
            3,
        ))?;

        let (desk, outcome) = open_desk(dir.path());
        assert!(matches!(
            outcome,
            RestoreOutcome::Restored { reservations: 1 }
        ));
        assert_eq!(desk.reservations()[0].id, 2);
        assert!(desk.room(102).expect("room 102 exists").booked);
        Ok(())
    }

    #[test]
    fn stale_snapshot_counter_is_bumped_past_restored_ids() -> Result<()> {
        let dir = tempdir()?;
        let store = LedgerStore::new(dir.path().join("ledger.json"));
        store.save(&LedgerSnapshot::new(
            vec![Reservation {
                id: 5,
                customer: "Mallory".to_string(),
                room_id: 101,
                reserved_at: Utc::now(),
            }],
            1,
        ))?;

        let (mut desk, _) = open_desk(dir.path());
        let confirmation = desk.reserve("Niaj", "Deluxe")?;
        assert_eq!(confirmation.reservation.id, 6);
        Ok(())
    }

    #[test]
    fn custom_inventories_are_accepted() -> Result<()> {
        let dir = tempdir()?;
        let inventory = vec![Room::new(1, "Cabin"), Room::new(2, "Cabin")];
        let (mut desk, _) = FrontDesk::open(
            inventory,
            LedgerStore::new(dir.path().join("ledger.json")),
        );

        let first = desk.reserve("Olivia", "cabin")?;
        assert_eq!(first.reservation.room_id, 1);
        let second = desk.reserve("Peggy", "CABIN")?;
        assert_eq!(second.reservation.room_id, 2);
        Ok(())
    }
}
