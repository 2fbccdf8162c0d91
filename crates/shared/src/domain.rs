use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(TransactionId);
id_newtype!(AccountNumber);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// Server-reported settlement state. Unknown values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionStatus {
    Approved,
    Pending,
    Other(String),
}

impl From<String> for TransactionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Approved" => Self::Approved,
            "Pending" => Self::Pending,
            _ => Self::Other(value),
        }
    }
}

impl From<TransactionStatus> for String {
    fn from(value: TransactionStatus) -> Self {
        match value {
            TransactionStatus::Approved => "Approved".to_string(),
            TransactionStatus::Pending => "Pending".to_string(),
            TransactionStatus::Other(raw) => raw,
        }
    }
}

/// Mutually exclusive content views of the authenticated dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    #[default]
    Dashboard,
    MakePayment,
    Statements,
    Insights,
    Settings,
}

impl Section {
    /// Sidebar order.
    pub const ALL: [Section; 5] = [
        Section::Dashboard,
        Section::MakePayment,
        Section::Statements,
        Section::Insights,
        Section::Settings,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Section::Dashboard => "dashboard",
            Section::MakePayment => "makePayment",
            Section::Statements => "statements",
            Section::Insights => "insights",
            Section::Settings => "settings",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::MakePayment => "Make Payment",
            Section::Statements => "Statements",
            Section::Insights => "Insights",
            Section::Settings => "Settings",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|section| section.id() == id)
    }
}
