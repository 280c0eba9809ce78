use std::borrow::Cow;
use std::fmt;
use std::ops::{
    Deref,
    DerefMut,
};

use clockabilly::Clockable;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use schemars::JsonSchema;
use serde::{
    Deserialize,
    Serialize,
};

// Operators define their own condition types and reasons on top of the common ones below, so
// these are open string newtypes rather than closed enums.
macro_rules! string_newtype {
    ($name:ident) => {
        #[derive(Clone, Debug, Deserialize, Eq, Hash, JsonSchema, Ord, PartialEq, PartialOrd, Serialize)]
        #[serde(transparent)]
        pub struct $name(Cow<'static, str>);

        impl $name {
            pub const fn from_static(s: &'static str) -> $name {
                $name(Cow::Borrowed(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> $name {
                $name(Cow::Owned(s.into()))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> $name {
                $name(Cow::Owned(s))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_newtype!(ConditionType);
string_newtype!(ConditionReason);

// Condition types

// special state for 0 requested resources and 0 already provisioned
pub const CONDITION_TYPE_EMPTY: ConditionType = ConditionType::from_static("Empty");
pub const CONDITION_TYPE_WAITING: ConditionType = ConditionType::from_static("Waiting");
pub const CONDITION_TYPE_PROVISIONING: ConditionType = ConditionType::from_static("Provisioning");
// the requested resource count has been satisfied
pub const CONDITION_TYPE_PROVISIONED: ConditionType = ConditionType::from_static("Provisioned");
pub const CONDITION_TYPE_DEPROVISIONING: ConditionType = ConditionType::from_static("Deprovisioning");
pub const CONDITION_TYPE_ERROR: ConditionType = ConditionType::from_static("Error");
pub const CONDITION_TYPE_CREATED: ConditionType = ConditionType::from_static("Created");

// Condition reasons
pub const CONDITION_REASON_INIT: ConditionReason = ConditionReason::from_static("CommonInit");
pub const CONDITION_REASON_SECRET_MISSING: ConditionReason = ConditionReason::from_static("SecretMissing");
pub const CONDITION_REASON_SECRET_ERROR: ConditionReason = ConditionReason::from_static("SecretError");
pub const CONDITION_REASON_SECRET_DELETE_ERROR: ConditionReason = ConditionReason::from_static("SecretDeleteError");
pub const CONDITION_REASON_CONFIG_MAP_MISSING: ConditionReason = ConditionReason::from_static("ConfigMapMissing");
pub const CONDITION_REASON_CONFIG_MAP_ERROR: ConditionReason = ConditionReason::from_static("ConfigMapError");
pub const CONDITION_REASON_CR_STATUS_UPDATE_ERROR: ConditionReason =
    ConditionReason::from_static("CRStatusUpdateError");
pub const CONDITION_REASON_CONTROLLER_REFERENCE_ERROR: ConditionReason =
    ConditionReason::from_static("ControllerReferenceError");
pub const CONDITION_REASON_OWNER_REF_LABELED_OBJECTS_DELETE_ERROR: ConditionReason =
    ConditionReason::from_static("OwnerRefLabeledObjectsDeleteError");
pub const CONDITION_REASON_REMOVE_FINALIZER_ERROR: ConditionReason =
    ConditionReason::from_static("RemoveFinalizerError");
pub const CONDITION_REASON_ADD_REF_LABEL_ERROR: ConditionReason = ConditionReason::from_static("AddRefLabelError");
pub const CONDITION_REASON_SERVICE_NOT_FOUND: ConditionReason = ConditionReason::from_static("ServiceNotFound");

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, JsonSchema, PartialEq, Serialize)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

// Used for passing condition information into generic functions, e.g. so a secret lookup knows
// which condition to set when the secret is missing vs. when the lookup errored.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConditionDetails {
    pub not_found_type: ConditionType,
    pub not_found_reason: ConditionReason,
    pub error_type: ConditionType,
    pub error_reason: ConditionReason,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: ConditionType,
    pub status: ConditionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ConditionReason>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    // The misspelled key is what already-deployed CRDs store, so it has to stay
    #[serde(rename = "lastHearbeatTime", default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat_time: Option<metav1::Time>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<metav1::Time>,
}

impl Condition {
    pub fn new(
        type_: ConditionType,
        status: ConditionStatus,
        reason: ConditionReason,
        message: &str,
        clock: &dyn Clockable,
    ) -> Condition {
        let now = metav1::Time(clock.now());
        Condition {
            type_,
            status,
            reason: Some(reason),
            message: message.into(),
            last_heartbeat_time: Some(now.clone()),
            last_transition_time: Some(now),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConditionList(pub Vec<Condition>);

impl ConditionList {
    pub fn new() -> ConditionList {
        ConditionList(vec![])
    }

    // Sets the condition of the given type, appending it if it doesn't exist yet.  The transition
    // time only moves when status, reason or message actually change; the heartbeat always moves.
    pub fn set(
        &mut self,
        type_: ConditionType,
        status: ConditionStatus,
        reason: ConditionReason,
        message: &str,
        clock: &dyn Clockable,
    ) {
        let Some(cond) = self.find_mut(&type_) else {
            self.0.push(Condition::new(type_, status, reason, message, clock));
            return;
        };

        let now = metav1::Time(clock.now());
        if cond.status != status || cond.reason.as_ref() != Some(&reason) || cond.message != message {
            cond.status = status;
            cond.reason = Some(reason);
            cond.message = message.into();
            cond.last_transition_time = Some(now.clone());
        }
        cond.last_heartbeat_time = Some(now);
    }

    pub fn find(&self, type_: &ConditionType) -> Option<&Condition> {
        self.0.iter().find(|c| &c.type_ == type_)
    }

    pub fn find_mut(&mut self, type_: &ConditionType) -> Option<&mut Condition> {
        self.0.iter_mut().find(|c| &c.type_ == type_)
    }

    // The "current" condition is the first one with status True
    pub fn current(&self) -> Option<&Condition> {
        self.0.iter().find(|c| c.status == ConditionStatus::True)
    }

    pub fn init_condition(&self) -> Condition {
        match self.current() {
            Some(cond) => cond.clone(),
            None => Condition {
                type_: CONDITION_TYPE_EMPTY,
                status: ConditionStatus::Unknown,
                reason: Some(CONDITION_REASON_INIT),
                message: CONDITION_REASON_INIT.to_string(),
                last_heartbeat_time: None,
                last_transition_time: None,
            },
        }
    }

    // Flip the current True condition to False and mark the new one as True
    pub fn update_current(
        &mut self,
        type_: ConditionType,
        reason: ConditionReason,
        message: &str,
        clock: &dyn Clockable,
    ) {
        if let Some(current) = self.current().cloned() {
            self.set(
                current.type_,
                ConditionStatus::False,
                current.reason.unwrap_or(CONDITION_REASON_INIT),
                &current.message,
                clock,
            );
        }

        self.set(type_, ConditionStatus::True, reason, message, clock);
    }
}

impl Deref for ConditionList {
    type Target = Vec<Condition>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ConditionList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
