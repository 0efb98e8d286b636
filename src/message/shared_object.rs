//! Shared-object synchronization batches.
//!
//! A shared-object message names one server-maintained object and carries an
//! ordered list of update events. Event tags, like message type codes, are
//! part of the wire contract and live here as named constants.

/// Wire tags for shared-object events.
pub mod event_tag {
    /// Attach to the object.
    pub const CONNECT: u8 = 0x01;
    /// Client-originated attach request.
    pub const CLIENT_CONNECT: u8 = 0x02;
    /// Set one attribute.
    pub const SET_ATTRIBUTE: u8 = 0x03;
    /// Client-side full data refresh.
    pub const CLIENT_UPDATE_DATA: u8 = 0x04;
    /// Client-side single attribute refresh.
    pub const CLIENT_UPDATE_ATTRIBUTE: u8 = 0x05;
    /// Invoke a handler with a list of arguments.
    pub const SEND_MESSAGE: u8 = 0x06;
    /// Client-side status notification.
    pub const CLIENT_STATUS: u8 = 0x07;
    /// Remove every attribute.
    pub const CLEAR: u8 = 0x08;
    /// Client-side attribute removal.
    pub const CLIENT_DELETE_ATTRIBUTE: u8 = 0x09;
    /// Delete one attribute.
    pub const DELETE_ATTRIBUTE: u8 = 0x0A;
    /// Client-side initial snapshot.
    pub const CLIENT_INITIAL_DATA: u8 = 0x0B;
}

/// Kind of one shared-object update event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SharedObjectEventType {
    /// Attach to the object.
    Connect,
    /// Remove every attribute.
    Clear,
    /// Set one attribute.
    SetAttribute,
    /// Delete one attribute.
    DeleteAttribute,
    /// Invoke a handler with a list of arguments.
    SendMessage,
    /// Client-originated attach request.
    ClientConnect,
    /// Client-side attribute removal.
    ClientDeleteAttribute,
    /// Client-side initial snapshot.
    ClientInitialData,
    /// Client-side status notification.
    ClientStatus,
    /// Client-side full data refresh.
    ClientUpdateData,
    /// Client-side single attribute refresh.
    ClientUpdateAttribute,
    /// A tag this engine does not know; preserved for pass-through.
    Unknown(u8),
}

impl SharedObjectEventType {
    /// Map a wire tag to its event type.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Self {
        match tag {
            event_tag::CONNECT => Self::Connect,
            event_tag::CLIENT_CONNECT => Self::ClientConnect,
            event_tag::SET_ATTRIBUTE => Self::SetAttribute,
            event_tag::CLIENT_UPDATE_DATA => Self::ClientUpdateData,
            event_tag::CLIENT_UPDATE_ATTRIBUTE => Self::ClientUpdateAttribute,
            event_tag::SEND_MESSAGE => Self::SendMessage,
            event_tag::CLIENT_STATUS => Self::ClientStatus,
            event_tag::CLEAR => Self::Clear,
            event_tag::CLIENT_DELETE_ATTRIBUTE => Self::ClientDeleteAttribute,
            event_tag::DELETE_ATTRIBUTE => Self::DeleteAttribute,
            event_tag::CLIENT_INITIAL_DATA => Self::ClientInitialData,
            other => Self::Unknown(other),
        }
    }

    /// The wire tag for this event type.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Connect => event_tag::CONNECT,
            Self::ClientConnect => event_tag::CLIENT_CONNECT,
            Self::SetAttribute => event_tag::SET_ATTRIBUTE,
            Self::ClientUpdateData => event_tag::CLIENT_UPDATE_DATA,
            Self::ClientUpdateAttribute => event_tag::CLIENT_UPDATE_ATTRIBUTE,
            Self::SendMessage => event_tag::SEND_MESSAGE,
            Self::ClientStatus => event_tag::CLIENT_STATUS,
            Self::Clear => event_tag::CLEAR,
            Self::ClientDeleteAttribute => event_tag::CLIENT_DELETE_ATTRIBUTE,
            Self::DeleteAttribute => event_tag::DELETE_ATTRIBUTE,
            Self::ClientInitialData => event_tag::CLIENT_INITIAL_DATA,
            Self::Unknown(tag) => tag,
        }
    }
}

/// Value carried by one event; its shape depends on the event type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SharedObjectValue<V> {
    /// The event carries no value.
    None,
    /// One decoded value (attribute updates).
    Single(V),
    /// An ordered argument list (handler messages).
    List(Vec<V>),
}

/// One atomic update within a shared-object batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedObjectEvent<V> {
    /// What the event does.
    pub event_type: SharedObjectEventType,
    /// Attribute or handler name, when the event names one.
    pub key: Option<String>,
    /// Event value, shaped by the event type.
    pub value: SharedObjectValue<V>,
}

/// A batched synchronization message for one shared object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedObjectMessage<V> {
    /// Name of the shared object being updated.
    pub name: String,
    /// Version of the object the batch applies to.
    pub version: u32,
    /// Raw persistence flags; value 2 marks a persistent object.
    pub flags: u32,
    /// Updates in wire order.
    pub events: Vec<SharedObjectEvent<V>>,
}

impl<V> SharedObjectMessage<V> {
    /// Whether the flags mark the object as persistent.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        self.flags == 2
    }
}

#[cfg(test)]
mod tests {
    use super::{SharedObjectEventType, event_tag};

    #[test]
    fn every_named_tag_round_trips() {
        for tag in 0x01..=0x0B {
            let event_type = SharedObjectEventType::from_tag(tag);
            assert!(!matches!(event_type, SharedObjectEventType::Unknown(_)));
            assert_eq!(event_type.tag(), tag);
        }
    }

    #[test]
    fn unnamed_tags_are_preserved() {
        let event_type = SharedObjectEventType::from_tag(0x7E);
        assert_eq!(event_type, SharedObjectEventType::Unknown(0x7E));
        assert_eq!(event_type.tag(), 0x7E);
    }

    #[test]
    fn send_message_keeps_its_contract_tag() {
        assert_eq!(SharedObjectEventType::SendMessage.tag(), event_tag::SEND_MESSAGE);
        assert_eq!(event_tag::SEND_MESSAGE, 0x06);
    }
}
