use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }
    };
}

define_id!(TrackId, "Unique identifier for a metadata-database track record.");
define_id!(
    RemovalId,
    "Unique identifier for a row in the two-phase removal ledger."
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_id_generation() {
        let id1 = TrackId::new();
        let id2 = TrackId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_track_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = TrackId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn test_removal_id_display() {
        let id = RemovalId::new();
        let display = id.to_string();
        assert!(!display.is_empty());
    }

    #[test]
    fn test_id_types_are_distinct() {
        let track_uuid = Uuid::new_v4();
        let removal_uuid = Uuid::new_v4();

        let _track_id = TrackId::from_uuid(track_uuid);
        let _removal_id = RemovalId::from_uuid(removal_uuid);

        // Type system ensures we can't mix these
    }
}
