//! Data models for Frankly platform records.
//!
//! - `Room`: chat rooms, with `NewRoom` / `RoomUpdate` payloads
//! - `Message`, `MessageContent`: messages posted in a room
//! - `User`: app users
//! - `Announcement`: app-wide messages published into rooms
//! - `File`: uploaded files

pub mod announcement;
pub mod file;
pub mod message;
pub mod room;
pub mod user;

pub use announcement::{Announcement, AnnouncementUpdate, NewAnnouncement};
pub use file::{File, NewFile};
pub use message::{Message, MessageContent, MessageUpdate, NewMessage};
pub use room::{NewRoom, Room, RoomStatus, RoomUpdate};
pub use user::{NewUser, User, UserUpdate};
