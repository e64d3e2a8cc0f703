// crates/bacnet-rs/src/object/property.rs
//! Object-type and property-identifier enumerations (§3.3, Clause 12/Clause 21).
//!
//! Only the object types and properties this crate's object/service layer actually
//! handles are named variants; everything else round-trips through `Other(u32)` so
//! a router relaying an unfamiliar object type never has to reject the frame.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ObjectType {
    AnalogInput,
    AnalogOutput,
    AnalogValue,
    BinaryInput,
    BinaryOutput,
    BinaryValue,
    Device,
    Other(u16),
}

impl ObjectType {
    pub fn to_wire(self) -> u16 {
        match self {
            ObjectType::AnalogInput => 0,
            ObjectType::AnalogOutput => 1,
            ObjectType::AnalogValue => 2,
            ObjectType::BinaryInput => 3,
            ObjectType::BinaryOutput => 4,
            ObjectType::BinaryValue => 5,
            ObjectType::Device => 8,
            ObjectType::Other(v) => v,
        }
    }

    pub fn from_wire(v: u16) -> Self {
        match v {
            0 => ObjectType::AnalogInput,
            1 => ObjectType::AnalogOutput,
            2 => ObjectType::AnalogValue,
            3 => ObjectType::BinaryInput,
            4 => ObjectType::BinaryOutput,
            5 => ObjectType::BinaryValue,
            8 => ObjectType::Device,
            other => ObjectType::Other(other),
        }
    }

    /// Does this object type support commandable (Priority_Array-backed) Present_Value?
    pub fn is_commandable(self) -> bool {
        matches!(
            self,
            ObjectType::AnalogOutput
                | ObjectType::AnalogValue
                | ObjectType::BinaryOutput
                | ObjectType::BinaryValue
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PropertyIdentifier {
    ObjectIdentifier,
    ObjectName,
    ObjectType,
    PresentValue,
    StatusFlags,
    EventState,
    OutOfService,
    Units,
    PriorityArray,
    RelinquishDefault,
    Description,
    SystemStatus,
    VendorName,
    VendorIdentifier,
    ModelName,
    FirmwareRevision,
    ApplicationSoftwareVersion,
    ProtocolVersion,
    ProtocolRevision,
    MaxApduLengthAccepted,
    SegmentationSupported,
    ApduTimeout,
    NumberOfApduRetries,
    MaxMaster,
    MaxInfoFrames,
    DeviceAddressBinding,
    DatabaseRevision,
    ObjectList,
    Other(u32),
}

impl PropertyIdentifier {
    pub fn to_wire(self) -> u32 {
        match self {
            PropertyIdentifier::ObjectIdentifier => 75,
            PropertyIdentifier::ObjectName => 77,
            PropertyIdentifier::ObjectType => 79,
            PropertyIdentifier::PresentValue => 85,
            PropertyIdentifier::StatusFlags => 111,
            PropertyIdentifier::EventState => 36,
            PropertyIdentifier::OutOfService => 81,
            PropertyIdentifier::Units => 117,
            PropertyIdentifier::PriorityArray => 87,
            PropertyIdentifier::RelinquishDefault => 104,
            PropertyIdentifier::Description => 28,
            PropertyIdentifier::SystemStatus => 112,
            PropertyIdentifier::VendorName => 121,
            PropertyIdentifier::VendorIdentifier => 120,
            PropertyIdentifier::ModelName => 70,
            PropertyIdentifier::FirmwareRevision => 44,
            PropertyIdentifier::ApplicationSoftwareVersion => 12,
            PropertyIdentifier::ProtocolVersion => 98,
            PropertyIdentifier::ProtocolRevision => 139,
            PropertyIdentifier::MaxApduLengthAccepted => 62,
            PropertyIdentifier::SegmentationSupported => 107,
            PropertyIdentifier::ApduTimeout => 11,
            PropertyIdentifier::NumberOfApduRetries => 73,
            PropertyIdentifier::MaxMaster => 64,
            PropertyIdentifier::MaxInfoFrames => 63,
            PropertyIdentifier::DeviceAddressBinding => 30,
            PropertyIdentifier::DatabaseRevision => 155,
            PropertyIdentifier::ObjectList => 76,
            PropertyIdentifier::Other(v) => v,
        }
    }

    pub fn from_wire(v: u32) -> Self {
        match v {
            75 => PropertyIdentifier::ObjectIdentifier,
            77 => PropertyIdentifier::ObjectName,
            79 => PropertyIdentifier::ObjectType,
            85 => PropertyIdentifier::PresentValue,
            111 => PropertyIdentifier::StatusFlags,
            36 => PropertyIdentifier::EventState,
            81 => PropertyIdentifier::OutOfService,
            117 => PropertyIdentifier::Units,
            87 => PropertyIdentifier::PriorityArray,
            104 => PropertyIdentifier::RelinquishDefault,
            28 => PropertyIdentifier::Description,
            112 => PropertyIdentifier::SystemStatus,
            121 => PropertyIdentifier::VendorName,
            120 => PropertyIdentifier::VendorIdentifier,
            70 => PropertyIdentifier::ModelName,
            44 => PropertyIdentifier::FirmwareRevision,
            12 => PropertyIdentifier::ApplicationSoftwareVersion,
            98 => PropertyIdentifier::ProtocolVersion,
            139 => PropertyIdentifier::ProtocolRevision,
            62 => PropertyIdentifier::MaxApduLengthAccepted,
            107 => PropertyIdentifier::SegmentationSupported,
            11 => PropertyIdentifier::ApduTimeout,
            73 => PropertyIdentifier::NumberOfApduRetries,
            64 => PropertyIdentifier::MaxMaster,
            63 => PropertyIdentifier::MaxInfoFrames,
            30 => PropertyIdentifier::DeviceAddressBinding,
            155 => PropertyIdentifier::DatabaseRevision,
            76 => PropertyIdentifier::ObjectList,
            other => PropertyIdentifier::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_type_round_trips() {
        for t in [
            ObjectType::AnalogInput,
            ObjectType::AnalogOutput,
            ObjectType::AnalogValue,
            ObjectType::BinaryValue,
            ObjectType::Device,
        ] {
            assert_eq!(ObjectType::from_wire(t.to_wire()), t);
        }
    }

    #[test]
    fn commandable_types_match_clause_19_2() {
        assert!(ObjectType::AnalogOutput.is_commandable());
        assert!(ObjectType::BinaryValue.is_commandable());
        assert!(!ObjectType::AnalogInput.is_commandable());
        assert!(!ObjectType::Device.is_commandable());
    }

    #[test]
    fn property_identifier_round_trips() {
        for p in [
            PropertyIdentifier::PresentValue,
            PropertyIdentifier::PriorityArray,
            PropertyIdentifier::RelinquishDefault,
            PropertyIdentifier::ObjectList,
        ] {
            assert_eq!(PropertyIdentifier::from_wire(p.to_wire()), p);
        }
    }

    #[test]
    fn unknown_wire_value_falls_back_to_other() {
        assert_eq!(ObjectType::from_wire(999), ObjectType::Other(999));
        assert_eq!(
            PropertyIdentifier::from_wire(4242),
            PropertyIdentifier::Other(4242)
        );
    }
}
