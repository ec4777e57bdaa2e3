//! Typed resource operations.
//!
//! Each resource kind implements [`Resource`] to describe where it lives and
//! what its create/update payloads look like. [`Resources`] then provides
//! create/get/update/delete/list once for every kind on top of
//! [`Client::execute`].

use std::fmt;
use std::marker::PhantomData;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::client::Client;
use super::pagination::Pager;
use super::transport::RequestEnvelope;
use crate::error::{Error, Result};
use crate::models::{Announcement, Room};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Room,
    Message,
    User,
    Announcement,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Room => "room",
            ResourceKind::Message => "message",
            ResourceKind::User => "user",
            ResourceKind::Announcement => "announcement",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of a single resource on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    Room { id: i64 },
    Message { room_id: i64, id: i64 },
    User { id: i64 },
    Announcement { id: i64 },
}

impl ResourceRef {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRef::Room { .. } => ResourceKind::Room,
            ResourceRef::Message { .. } => ResourceKind::Message,
            ResourceRef::User { .. } => ResourceKind::User,
            ResourceRef::Announcement { .. } => ResourceKind::Announcement,
        }
    }

    pub fn id(&self) -> i64 {
        match *self {
            ResourceRef::Room { id }
            | ResourceRef::Message { id, .. }
            | ResourceRef::User { id }
            | ResourceRef::Announcement { id } => id,
        }
    }

    pub fn path(&self) -> String {
        match *self {
            ResourceRef::Room { id } => format!("/rooms/{id}"),
            ResourceRef::Message { room_id, id } => format!("/rooms/{room_id}/messages/{id}"),
            ResourceRef::User { id } => format!("/users/{id}"),
            ResourceRef::Announcement { id } => format!("/announcements/{id}"),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.path())
    }
}

/// A kind of record exposed by the platform.
pub trait Resource: DeserializeOwned + Send + 'static {
    const KIND: ResourceKind;

    /// Scope the collection lives under: `()` for top-level kinds.
    type Parent: Copy + Send + Sync + fmt::Debug;
    /// Payload for `create`.
    type Draft: Serialize + Sync;
    /// Payload for `update`.
    type Patch: Serialize + Sync;

    fn collection_path(parent: Self::Parent) -> String;

    fn reference(parent: Self::Parent, id: i64) -> ResourceRef;
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| Error::InvalidResponse(format!("failed to parse {what}: {e}")))
}

/// Operations on one collection of `R`.
pub struct Resources<'a, R: Resource> {
    client: &'a Client,
    parent: R::Parent,
    _kind: PhantomData<fn() -> R>,
}

impl<'a, R: Resource> Resources<'a, R> {
    pub(crate) fn new(client: &'a Client, parent: R::Parent) -> Self {
        Self {
            client,
            parent,
            _kind: PhantomData,
        }
    }

    pub fn reference(&self, id: i64) -> ResourceRef {
        R::reference(self.parent, id)
    }

    pub async fn create(&self, draft: &R::Draft) -> Result<R> {
        let envelope =
            RequestEnvelope::new(Method::POST, R::collection_path(self.parent)).json(draft)?;
        let value = self.client.execute(envelope).await?;
        decode(value, R::KIND.as_str())
    }

    pub async fn get(&self, id: i64) -> Result<R> {
        let reference = self.reference(id);
        let value = self.client.execute(RequestEnvelope::get(reference.path())).await?;
        decode(value, R::KIND.as_str())
    }

    pub async fn update(&self, id: i64, patch: &R::Patch) -> Result<R> {
        let reference = self.reference(id);
        let envelope = RequestEnvelope::new(Method::PUT, reference.path()).json(patch)?;
        let value = self.client.execute(envelope).await?;
        decode(value, R::KIND.as_str())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let reference = self.reference(id);
        self.client
            .execute(RequestEnvelope::new(Method::DELETE, reference.path()))
            .await?;
        Ok(())
    }

    /// Page through the collection, `page_size` records per request.
    pub fn list(&self, page_size: u32) -> Pager<R> {
        Pager::new(self.client.clone(), R::collection_path(self.parent), page_size)
    }
}

impl Resources<'_, Announcement> {
    /// Post the announcement into a room as a new message.
    pub async fn publish(&self, id: i64, room_id: i64) -> Result<()> {
        let path = format!("{}/rooms/{room_id}", self.reference(id).path());
        self.client
            .execute(RequestEnvelope::new(Method::PUT, path))
            .await?;
        Ok(())
    }

    /// Rooms the announcement has been published to.
    pub fn rooms(&self, id: i64, page_size: u32) -> Pager<Room> {
        let path = format!("{}/rooms", self.reference(id).path());
        Pager::new(self.client.clone(), path, page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_paths() {
        assert_eq!(ResourceRef::Room { id: 3 }.path(), "/rooms/3");
        assert_eq!(
            ResourceRef::Message { room_id: 3, id: 9 }.path(),
            "/rooms/3/messages/9"
        );
        assert_eq!(ResourceRef::User { id: 5 }.path(), "/users/5");
        assert_eq!(ResourceRef::Announcement { id: 6 }.path(), "/announcements/6");
    }

    #[test]
    fn test_reference_kind_and_display() {
        let message = ResourceRef::Message { room_id: 1, id: 2 };
        assert_eq!(message.kind(), ResourceKind::Message);
        assert_eq!(message.id(), 2);
        assert_eq!(message.to_string(), "message /rooms/1/messages/2");
    }
}
