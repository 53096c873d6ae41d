//! Resource signaling payload types.

use serde::{Deserialize, Serialize};

/// Request naming a single resource (create, delete, wait, signal-all).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    /// Target resource, canonical text form.
    pub resource_id: String,
}

/// Request signaling one specific waiter of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalOperationRequest {
    /// Resource whose waiter set is consulted.
    pub resource_id: String,
    /// Waiter to re-enable; a no-op if it is not registered.
    pub operation_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_request_serde() {
        let request = ResourceRequest {
            resource_id: format!("{:032x}", 77u128),
        };

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&request, &mut bytes).expect("encode");

        let decoded: ResourceRequest = ciborium::de::from_reader(&bytes[..]).expect("decode");
        assert_eq!(request, decoded);
    }

    #[test]
    fn signal_operation_serde() {
        let request = SignalOperationRequest {
            resource_id: format!("{:032x}", 77u128),
            operation_id: format!("{:032x}", 10u128),
        };

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&request, &mut bytes).expect("encode");

        let decoded: SignalOperationRequest =
            ciborium::de::from_reader(&bytes[..]).expect("decode");
        assert_eq!(request, decoded);
    }
}
