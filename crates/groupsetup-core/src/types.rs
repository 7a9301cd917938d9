use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

/// Opaque per-step data payload
///
/// The engine never inspects the shape of a payload; it is owned by the step
/// module that produced it and is only ever replaced wholesale.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct StepPayload {
    /// The inner JSON value
    pub value: serde_json::Value,
}

impl StepPayload {
    /// Create a new payload from a JSON value
    #[inline]
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// An empty object, the payload of a step with no data
    #[inline]
    pub fn empty() -> Self {
        Self {
            value: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Get the inner JSON value
    #[inline]
    pub fn as_value(&self) -> &serde_json::Value {
        &self.value
    }

    /// Take ownership of the inner JSON value
    #[inline]
    pub fn into_value(self) -> serde_json::Value {
        self.value
    }

    /// True for null and for an empty object
    pub fn is_empty(&self) -> bool {
        match &self.value {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Look up a nested value by a path of object keys
    pub fn get_path(&self, path: &[&str]) -> Option<&serde_json::Value> {
        path.iter()
            .try_fold(&self.value, |current, key| current.get(*key))
    }

    /// Try to convert the payload to a specific type
    pub fn to<T>(&self) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(self.value.clone())
    }

    /// Create a payload from a serializable value
    pub fn from<T>(value: &T) -> Result<Self, serde_json::Error>
    where
        T: Serialize,
    {
        Ok(Self::new(serde_json::to_value(value)?))
    }
}

impl Default for StepPayload {
    fn default() -> Self {
        Self::empty()
    }
}

/// Role of the acting user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Broker of record
    Broker,
    /// General agent
    Ga,
    /// Third party administrator
    Tpa,
    /// The enrolling employer
    Employer,
    /// Administrative user spanning broker, TPA and GA
    BrokerTpaGaAdmin,
}

impl Role {
    /// Wire representation of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Broker => "BROKER",
            Role::Ga => "GA",
            Role::Tpa => "TPA",
            Role::Employer => "EMPLOYER",
            Role::BrokerTpaGaAdmin => "BROKER_TPA_GA_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an enrolling entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityStatus {
    /// No workflow has been started
    ApplicationNotStarted,
    /// A workflow is in progress
    ApplicationInProgress,
    /// Group is active downstream
    Active,
    /// Group is inactive
    Inactive,
}

/// The enrolling entity (a client group) the workflow belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Entity identifier
    pub id: String,
    /// Legal name of the group
    pub client_name: String,
    /// External unique identifier
    pub unique_id: String,
    /// Number of eligible employees, when known
    #[serde(default)]
    pub eligible_employees: Option<u32>,
    /// Current lifecycle status
    pub status: EntityStatus,
    /// Whether the group chose the offline intake path
    #[serde(default)]
    pub is_offline: Option<bool>,
}

/// Contact that receives a handoff notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffReceipt {
    /// Employer contact name
    pub employer_name: String,
    /// Employer contact email
    pub employer_email: String,
}
