//! Identifier newtypes.
//!
//! All cross-entity references go through these ids; ordering is derived
//! from the underlying string so tie-breaks stay deterministic.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

id_newtype!(
    /// Emergency case identifier.
    EmergencyId
);
id_newtype!(
    /// Ambulance unit identifier.
    AmbulanceId
);
id_newtype!(
    /// Hospital identifier.
    HospitalId
);
id_newtype!(
    /// Road-grid segment identifier used by traffic updates.
    SegmentId
);
