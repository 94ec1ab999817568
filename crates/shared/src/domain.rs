use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map($name)
                    .map_err(|e| format!("invalid {}: {e}", stringify!($name)))
            }
        }
    };
}

id_newtype!(ClientId);

/// Wire spelling, `Display` and a `FromStr` that accepts the wire spelling in
/// any letter case.
macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        let options: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        format!("unknown {} '{wanted}', expected one of: {}", stringify!($name), options.join(", "))
                    })
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
}

wire_enum!(ClientStatus {
    Active => "active",
    Inactive => "inactive",
});

impl ClientStatus {
    pub fn flipped(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    #[default]
    Unpaid,
}

wire_enum!(PaymentStatus {
    Paid => "paid",
    Unpaid => "unpaid",
});

impl PaymentStatus {
    pub fn flipped(self) -> Self {
        match self {
            Self::Paid => Self::Unpaid,
            Self::Unpaid => Self::Paid,
        }
    }
}

/// The two enum fields that can be flipped inline from the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToggleField {
    Status,
    PaymentStatus,
}

wire_enum!(ToggleField {
    Status => "status",
    PaymentStatus => "paymentStatus",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortColumn {
    #[default]
    CreatedAt,
    FullName,
    Status,
    PaymentStatus,
}

wire_enum!(SortColumn {
    CreatedAt => "createdAt",
    FullName => "fullName",
    Status => "status",
    PaymentStatus => "paymentStatus",
});

impl SortColumn {
    /// Direction applied when the column becomes the active sort.
    pub fn default_direction(self) -> SortDirection {
        match self {
            Self::FullName => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

wire_enum!(SortDirection {
    Asc => "asc",
    Desc => "desc",
});

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

wire_enum!(Theme {
    Dark => "dark",
    Light => "light",
});

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub full_name: String,
    pub phone: String,
    pub course: String,
    pub status: ClientStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// Value of a toggleable field, captured before an optimistic flip so it can
/// be written back verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    Status(ClientStatus),
    PaymentStatus(PaymentStatus),
}

impl Client {
    pub fn field(&self, field: ToggleField) -> FieldValue {
        match field {
            ToggleField::Status => FieldValue::Status(self.status),
            ToggleField::PaymentStatus => FieldValue::PaymentStatus(self.payment_status),
        }
    }

    pub fn flip(&mut self, field: ToggleField) {
        match field {
            ToggleField::Status => self.status = self.status.flipped(),
            ToggleField::PaymentStatus => self.payment_status = self.payment_status.flipped(),
        }
    }

    pub fn restore(&mut self, value: FieldValue) {
        match value {
            FieldValue::Status(status) => self.status = status,
            FieldValue::PaymentStatus(payment) => self.payment_status = payment,
        }
    }
}

/// Editable subset of a client, submitted on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDraft {
    pub full_name: String,
    pub phone: String,
    pub course: String,
    pub status: ClientStatus,
    pub payment_status: PaymentStatus,
}

impl From<&Client> for ClientDraft {
    fn from(client: &Client) -> Self {
        Self {
            full_name: client.full_name.clone(),
            phone: client.phone.clone(),
            course: client.course.clone(),
            status: client.status,
            payment_status: client.payment_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Client {
        Client {
            id: ClientId(4),
            full_name: "Ali Valiyev".into(),
            phone: "+998901234567".into(),
            course: "Frontend".into(),
            status: ClientStatus::Active,
            payment_status: PaymentStatus::Unpaid,
            created_at: "2024-01-01T00:00:00Z".parse().expect("timestamp"),
        }
    }

    #[test]
    fn client_uses_camel_case_wire_names() {
        let json = serde_json::to_value(sample()).expect("serialize");
        assert_eq!(json["fullName"], "Ali Valiyev");
        assert_eq!(json["paymentStatus"], "unpaid");
        assert_eq!(json["status"], "active");
        assert_eq!(json["id"], 4);
    }

    #[test]
    fn flip_and_restore_round_trip_a_single_field() {
        let mut client = sample();
        let before = client.field(ToggleField::PaymentStatus);
        client.flip(ToggleField::PaymentStatus);
        assert_eq!(client.payment_status, PaymentStatus::Paid);
        assert_eq!(client.status, ClientStatus::Active);

        client.restore(before);
        assert_eq!(client.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn parses_wire_spellings_case_insensitively() {
        assert_eq!("createdAt".parse::<SortColumn>(), Ok(SortColumn::CreatedAt));
        assert_eq!("FULLNAME".parse::<SortColumn>(), Ok(SortColumn::FullName));
        assert_eq!(
            "paymentStatus".parse::<ToggleField>(),
            Ok(ToggleField::PaymentStatus)
        );
        assert!("archived".parse::<ClientStatus>().is_err());
    }

    #[test]
    fn full_name_sorts_ascending_by_default() {
        assert_eq!(SortColumn::FullName.default_direction(), SortDirection::Asc);
        assert_eq!(SortColumn::CreatedAt.default_direction(), SortDirection::Desc);
        assert_eq!(SortColumn::Status.default_direction(), SortDirection::Desc);
    }
}
