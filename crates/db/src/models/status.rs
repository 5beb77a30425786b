//! Status helper enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding lookup table from `migrations/0001_init.sql`.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Media record lifecycle status. `Completed` and `Failed` are terminal.
    MediaStatus {
        Pending = 1,
        Processing = 2,
        Completed = 3,
        Failed = 4,
    }
}

define_status_enum! {
    /// Credit ledger entry kind. Balance = sum(grants) - sum(debits).
    CreditEntryKind {
        Grant = 1,
        Debit = 2,
    }
}

impl MediaStatus {
    /// Wire name used in API responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Look up a status by its database ID.
    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(Self::Pending),
            2 => Some(Self::Processing),
            3 => Some(Self::Completed),
            4 => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether this status is terminal (no further transitions observable).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_status_ids_match_seed_data() {
        assert_eq!(MediaStatus::Pending.id(), 1);
        assert_eq!(MediaStatus::Processing.id(), 2);
        assert_eq!(MediaStatus::Completed.id(), 3);
        assert_eq!(MediaStatus::Failed.id(), 4);
    }

    #[test]
    fn credit_entry_kind_ids_match_seed_data() {
        assert_eq!(CreditEntryKind::Grant.id(), 1);
        assert_eq!(CreditEntryKind::Debit.id(), 2);
    }

    #[test]
    fn terminality() {
        assert!(!MediaStatus::Pending.is_terminal());
        assert!(!MediaStatus::Processing.is_terminal());
        assert!(MediaStatus::Completed.is_terminal());
        assert!(MediaStatus::Failed.is_terminal());
    }

    #[test]
    fn status_round_trips_through_id_and_name() {
        for status in [
            MediaStatus::Pending,
            MediaStatus::Processing,
            MediaStatus::Completed,
            MediaStatus::Failed,
        ] {
            assert_eq!(MediaStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(MediaStatus::from_id(9), None);
        assert_eq!(MediaStatus::Processing.as_str(), "processing");
    }
}
