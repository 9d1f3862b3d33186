//! Feature 0x0003 - Device Information
//!
//! Versions 1 to 8. The device-info response layout changes at v2, v4 and v6,
//! the firmware-info response at v8, and v4 adds the serial number function.

use std::fmt;

use hidpp_codec::{FieldDecl, FrameDecl, FrameSize, Message};

use crate::error::FeatureError;
use crate::factory::typed_feature;
use crate::model::{FeatureDecl, FunctionBinding, VersionDecl};

pub const FEATURE_ID: u16 = 0x0003;
pub const MAX_FUNCTION_INDEX_V1_TO_V3: u8 = 1;
pub const MAX_FUNCTION_INDEX_V4_TO_V8: u8 = 2;

/// Field widths in bits
pub mod len {
    pub const ENTITY_INDEX: u16 = 8;
    pub const ENTITY_COUNT: u16 = 8;
    pub const UNIT_ID: u16 = 32;
    pub const TRANSPORT_RESERVED_V1_TO_V5: u16 = 12;
    pub const TRANSPORT_RESERVED_V6_TO_V8: u16 = 11;
    pub const TRANSPORT: u16 = 1;
    pub const MODEL_ID: u16 = 48;
    pub const EXTENDED_MODEL_ID: u16 = 8;
    pub const CAPABILITIES_RESERVED: u16 = 7;
    pub const SERIAL_NUMBER_CAPABILITY: u16 = 1;
    pub const FW_TYPE: u16 = 8;
    pub const FW_PREFIX: u16 = 24;
    pub const FW_NUMBER: u16 = 8;
    pub const FW_REVISION: u16 = 8;
    pub const FW_BUILD: u16 = 16;
    pub const RESERVED_V1_TO_V7: u16 = 7;
    pub const RESERVED_V8: u16 = 5;
    pub const SLOT_ID: u16 = 1;
    pub const INVALID: u16 = 1;
    pub const ACTIVE: u16 = 1;
    pub const TRANSPORT_ID: u16 = 16;
    pub const EXTRA_VERSION_INFORMATION: u16 = 40;
    pub const SERIAL_NUMBER: u16 = 96;
}

/// Firmware entity types; the set grows with the feature version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    MainApp,
    Bootloader,
    Hardware,
    Touchpad,
    OptSensor,
    Softdevice,
    /// 6 up to v4
    RfCompanion,
    FactoryApp,
    RgbEffect,
    MotorDrive,
    /// 6 from v5
    MainAppCompanion,
    BootloaderCompanion,
    EmbeddedImages,
}

impl EntityType {
    /// Decode a raw `fw_type` as defined by `version`
    pub fn from_raw(version: u8, raw: u8) -> Option<Self> {
        let entity = match raw {
            0 => EntityType::MainApp,
            1 => EntityType::Bootloader,
            2 => EntityType::Hardware,
            3 => EntityType::Touchpad,
            4 => EntityType::OptSensor,
            5 => EntityType::Softdevice,
            6 if version >= 5 => EntityType::MainAppCompanion,
            6 => EntityType::RfCompanion,
            7 if version >= 2 => EntityType::FactoryApp,
            8 if version >= 2 => EntityType::RgbEffect,
            9 if version >= 3 => EntityType::MotorDrive,
            10 if version >= 5 => EntityType::BootloaderCompanion,
            11 if version >= 7 => EntityType::EmbeddedImages,
            _ => return None,
        };
        Some(entity)
    }

    pub fn raw(self) -> u8 {
        match self {
            EntityType::MainApp => 0,
            EntityType::Bootloader => 1,
            EntityType::Hardware => 2,
            EntityType::Touchpad => 3,
            EntityType::OptSensor => 4,
            EntityType::Softdevice => 5,
            EntityType::RfCompanion | EntityType::MainAppCompanion => 6,
            EntityType::FactoryApp => 7,
            EntityType::RgbEffect => 8,
            EntityType::MotorDrive => 9,
            EntityType::BootloaderCompanion => 10,
            EntityType::EmbeddedImages => 11,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityType::MainApp => "main application",
            EntityType::Bootloader => "bootloader",
            EntityType::Hardware => "hardware",
            EntityType::Touchpad => "touchpad",
            EntityType::OptSensor => "optical sensor",
            EntityType::Softdevice => "softdevice",
            EntityType::RfCompanion => "RF companion",
            EntityType::FactoryApp => "factory application",
            EntityType::RgbEffect => "RGB custom effect",
            EntityType::MotorDrive => "motor drive",
            EntityType::MainAppCompanion => "companion main application",
            EntityType::BootloaderCompanion => "companion bootloader",
            EntityType::EmbeddedImages => "embedded images",
        };
        f.write_str(name)
    }
}

const INFO_V1: &[FieldDecl] = &[
    FieldDecl::uint("entity_count", len::ENTITY_COUNT),
    FieldDecl::raw("unit_id", len::UNIT_ID),
    FieldDecl::reserved("transport_reserved", len::TRANSPORT_RESERVED_V1_TO_V5),
    FieldDecl::uint("usb", len::TRANSPORT),
    FieldDecl::uint("e_quad", len::TRANSPORT),
    FieldDecl::uint("btle", len::TRANSPORT),
    FieldDecl::uint("bt", len::TRANSPORT),
    FieldDecl::raw("model_id", len::MODEL_ID),
];

const INFO_V2_TO_V3: &[FieldDecl] = &[
    FieldDecl::uint("entity_count", len::ENTITY_COUNT),
    FieldDecl::raw("unit_id", len::UNIT_ID),
    FieldDecl::reserved("transport_reserved", len::TRANSPORT_RESERVED_V1_TO_V5),
    FieldDecl::uint("usb", len::TRANSPORT),
    FieldDecl::uint("e_quad", len::TRANSPORT),
    FieldDecl::uint("btle", len::TRANSPORT),
    FieldDecl::uint("bt", len::TRANSPORT),
    FieldDecl::raw("model_id", len::MODEL_ID),
    FieldDecl::uint("extended_model_id", len::EXTENDED_MODEL_ID),
];

const INFO_V4_TO_V5: &[FieldDecl] = &[
    FieldDecl::uint("entity_count", len::ENTITY_COUNT),
    FieldDecl::raw("unit_id", len::UNIT_ID),
    FieldDecl::reserved("transport_reserved", len::TRANSPORT_RESERVED_V1_TO_V5),
    FieldDecl::uint("usb", len::TRANSPORT),
    FieldDecl::uint("e_quad", len::TRANSPORT),
    FieldDecl::uint("btle", len::TRANSPORT),
    FieldDecl::uint("bt", len::TRANSPORT),
    FieldDecl::raw("model_id", len::MODEL_ID),
    FieldDecl::uint("extended_model_id", len::EXTENDED_MODEL_ID),
    FieldDecl::reserved("capabilities_reserved", len::CAPABILITIES_RESERVED),
    FieldDecl::uint("serial_number", len::SERIAL_NUMBER_CAPABILITY),
];

const INFO_V6_TO_V8: &[FieldDecl] = &[
    FieldDecl::uint("entity_count", len::ENTITY_COUNT),
    FieldDecl::raw("unit_id", len::UNIT_ID),
    FieldDecl::reserved("transport_reserved", len::TRANSPORT_RESERVED_V6_TO_V8),
    FieldDecl::uint("serial", len::TRANSPORT),
    FieldDecl::uint("usb", len::TRANSPORT),
    FieldDecl::uint("e_quad", len::TRANSPORT),
    FieldDecl::uint("btle", len::TRANSPORT),
    FieldDecl::uint("bt", len::TRANSPORT),
    FieldDecl::raw("model_id", len::MODEL_ID),
    FieldDecl::uint("extended_model_id", len::EXTENDED_MODEL_ID),
    FieldDecl::reserved("capabilities_reserved", len::CAPABILITIES_RESERVED),
    FieldDecl::uint("serial_number", len::SERIAL_NUMBER_CAPABILITY),
];

const FW_V1_TO_V7: &[FieldDecl] = &[
    FieldDecl::uint("fw_type", len::FW_TYPE),
    FieldDecl::ascii("fw_prefix", len::FW_PREFIX),
    FieldDecl::uint("fw_number", len::FW_NUMBER),
    FieldDecl::uint("fw_revision", len::FW_REVISION),
    FieldDecl::uint("fw_build", len::FW_BUILD),
    FieldDecl::reserved("reserved", len::RESERVED_V1_TO_V7),
    FieldDecl::uint("active", len::ACTIVE),
    FieldDecl::uint("transport_id", len::TRANSPORT_ID),
    FieldDecl::raw("extra_version_information", len::EXTRA_VERSION_INFORMATION),
];

const FW_V8: &[FieldDecl] = &[
    FieldDecl::uint("fw_type", len::FW_TYPE),
    FieldDecl::ascii("fw_prefix", len::FW_PREFIX),
    FieldDecl::uint("fw_number", len::FW_NUMBER),
    FieldDecl::uint("fw_revision", len::FW_REVISION),
    FieldDecl::uint("fw_build", len::FW_BUILD),
    FieldDecl::reserved("reserved", len::RESERVED_V8),
    FieldDecl::uint("slot_id", len::SLOT_ID),
    FieldDecl::uint("invalid", len::INVALID),
    FieldDecl::uint("active", len::ACTIVE),
    FieldDecl::uint("transport_id", len::TRANSPORT_ID),
    FieldDecl::raw("extra_version_information", len::EXTRA_VERSION_INFORMATION),
];

const FRAMES: &[FrameDecl] = &[
    FrameDecl::request("GetDeviceInfo", 0, FrameSize::Short, &[]),
    FrameDecl::response("GetDeviceInfoResponseV1", 0, "GetDeviceInfo", INFO_V1, &[1]),
    FrameDecl::response(
        "GetDeviceInfoResponseV2ToV3",
        0,
        "GetDeviceInfo",
        INFO_V2_TO_V3,
        &[2, 3],
    ),
    FrameDecl::response(
        "GetDeviceInfoResponseV4ToV5",
        0,
        "GetDeviceInfo",
        INFO_V4_TO_V5,
        &[4, 5],
    ),
    FrameDecl::response(
        "GetDeviceInfoResponseV6ToV8",
        0,
        "GetDeviceInfo",
        INFO_V6_TO_V8,
        &[6, 7, 8],
    ),
    FrameDecl::request(
        "GetFwInfo",
        1,
        FrameSize::Short,
        &[FieldDecl::uint("entity_index", len::ENTITY_INDEX)],
    ),
    FrameDecl::response(
        "GetFwInfoResponseV1ToV7",
        1,
        "GetFwInfo",
        FW_V1_TO_V7,
        &[1, 2, 3, 4, 5, 6, 7],
    ),
    FrameDecl::response("GetFwInfoResponseV8", 1, "GetFwInfo", FW_V8, &[8]),
    FrameDecl::request("GetDeviceSerialNumber", 2, FrameSize::Short, &[]),
    FrameDecl::response(
        "GetDeviceSerialNumberResponse",
        2,
        "GetDeviceSerialNumber",
        &[FieldDecl::ascii("serial_number", len::SERIAL_NUMBER)],
        &[4, 5, 6, 7, 8],
    ),
];

const fn unchanged(version: u8, max_function_index: u8) -> VersionDecl {
    VersionDecl {
        version,
        max_function_index,
        functions: &[],
        events: &[],
    }
}

pub static DECL: FeatureDecl = FeatureDecl {
    name: "DeviceInformation",
    feature_id: FEATURE_ID,
    functions: &[
        (0, "get_device_info"),
        (1, "get_fw_info"),
        (2, "get_device_serial_number"),
    ],
    events: &[],
    frames: FRAMES,
    versions: &[
        VersionDecl {
            version: 1,
            max_function_index: MAX_FUNCTION_INDEX_V1_TO_V3,
            functions: &[
                FunctionBinding::new(0, "GetDeviceInfo", "GetDeviceInfoResponseV1"),
                FunctionBinding::new(1, "GetFwInfo", "GetFwInfoResponseV1ToV7"),
            ],
            events: &[],
        },
        VersionDecl {
            version: 2,
            max_function_index: MAX_FUNCTION_INDEX_V1_TO_V3,
            functions: &[FunctionBinding::new(
                0,
                "GetDeviceInfo",
                "GetDeviceInfoResponseV2ToV3",
            )],
            events: &[],
        },
        unchanged(3, MAX_FUNCTION_INDEX_V1_TO_V3),
        VersionDecl {
            version: 4,
            max_function_index: MAX_FUNCTION_INDEX_V4_TO_V8,
            functions: &[
                FunctionBinding::new(0, "GetDeviceInfo", "GetDeviceInfoResponseV4ToV5"),
                FunctionBinding::new(
                    2,
                    "GetDeviceSerialNumber",
                    "GetDeviceSerialNumberResponse",
                ),
            ],
            events: &[],
        },
        unchanged(5, MAX_FUNCTION_INDEX_V4_TO_V8),
        VersionDecl {
            version: 6,
            max_function_index: MAX_FUNCTION_INDEX_V4_TO_V8,
            functions: &[FunctionBinding::new(
                0,
                "GetDeviceInfo",
                "GetDeviceInfoResponseV6ToV8",
            )],
            events: &[],
        },
        unchanged(7, MAX_FUNCTION_INDEX_V4_TO_V8),
        VersionDecl {
            version: 8,
            max_function_index: MAX_FUNCTION_INDEX_V4_TO_V8,
            functions: &[FunctionBinding::new(1, "GetFwInfo", "GetFwInfoResponseV8")],
            events: &[],
        },
    ],
};

typed_feature!(
    /// Device Information feature object
    DeviceInformation,
    DECL,
    [
        get_device_info_cls,
        get_device_info_response_cls,
        get_fw_info_cls,
        get_fw_info_response_cls,
        get_device_serial_number_cls,
        get_device_serial_number_response_cls,
    ]
);

impl DeviceInformation {
    pub fn get_device_info(
        &self,
        device_index: u8,
        feature_index: u8,
    ) -> Result<Message, FeatureError> {
        self.request("get_device_info", device_index, feature_index)
    }

    pub fn get_fw_info(
        &self,
        device_index: u8,
        feature_index: u8,
        entity_index: u8,
    ) -> Result<Message, FeatureError> {
        Ok(self
            .request("get_fw_info", device_index, feature_index)?
            .with("entity_index", entity_index)?)
    }

    /// Bound from version 4
    pub fn get_device_serial_number(
        &self,
        device_index: u8,
        feature_index: u8,
    ) -> Result<Message, FeatureError> {
        self.request("get_device_serial_number", device_index, feature_index)
    }

    /// Entity type of a firmware-info response, per this object's version
    pub fn entity_type(&self, response: &Message) -> Result<Option<EntityType>, FeatureError> {
        let raw = response.get_int("fw_type")? as u8;
        Ok(EntityType::from_raw(self.version(), raw))
    }
}

/// ASCII text of a fixed-width field, trailing NULs removed
pub fn ascii_field(message: &Message, name: &str) -> Result<String, FeatureError> {
    let bytes = message.get_bytes(name)?;
    let text: String = bytes
        .iter()
        .map(|&b| char::from(b))
        .collect::<String>()
        .trim_end_matches('\0')
        .to_string();
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::FeatureFactory;
    use crate::model::FeatureModel;
    use std::sync::Arc;

    fn create(version: u8) -> DeviceInformation {
        let model = Arc::new(FeatureModel::build(&DECL).unwrap());
        DeviceInformation::new(FeatureFactory::new(model).create(version).unwrap()).unwrap()
    }

    #[test]
    fn test_layouts_per_version() {
        assert_eq!(
            create(1).get_device_info_response_cls().unwrap().name(),
            "GetDeviceInfoResponseV1"
        );
        assert_eq!(
            create(3).get_device_info_response_cls().unwrap().name(),
            "GetDeviceInfoResponseV2ToV3"
        );
        assert_eq!(
            create(7).get_device_info_response_cls().unwrap().name(),
            "GetDeviceInfoResponseV6ToV8"
        );
        assert_eq!(
            create(7).get_fw_info_response_cls().unwrap().name(),
            "GetFwInfoResponseV1ToV7"
        );
        assert_eq!(
            create(8).get_fw_info_response_cls().unwrap().name(),
            "GetFwInfoResponseV8"
        );
        assert!(create(3).get_device_serial_number_cls().is_err());
        assert_eq!(create(3).max_function_index(), MAX_FUNCTION_INDEX_V1_TO_V3);
        assert_eq!(create(4).max_function_index(), MAX_FUNCTION_INDEX_V4_TO_V8);
    }

    #[test]
    fn test_serial_number_response() {
        let feature = create(4);
        let class = feature.get_device_serial_number_response_cls().unwrap().clone();
        let message = Message::new(class.clone(), 0x01, 0x02)
            .with("serial_number", "2015LZ06DZN8")
            .unwrap();
        let bytes = message.to_bytes().unwrap();
        assert_eq!(&bytes[4..16], b"2015LZ06DZN8");
        assert_eq!(&bytes[16..20], &[0x00; 4]);

        let parsed = Message::from_bytes(class, &bytes).unwrap();
        assert_eq!(ascii_field(&parsed, "serial_number").unwrap(), "2015LZ06DZN8");
    }

    #[test]
    fn test_serial_number_width() {
        let class = create(5).get_device_serial_number_response_cls().unwrap().clone();
        assert!(Message::new(class, 1, 2)
            .with("serial_number", "2015LZ06DZN8X")
            .is_err());
        let short = Message::new(
            create(5).get_device_serial_number_response_cls().unwrap().clone(),
            1,
            2,
        )
        .with("serial_number", "ABC")
        .unwrap();
        assert_eq!(ascii_field(&short, "serial_number").unwrap(), "ABC");
    }

    #[test]
    fn test_fw_info_v8_flags() {
        let feature = create(8);
        let class = feature.get_fw_info_response_cls().unwrap().clone();
        let mut frame = vec![0x11, 0x01, 0x02, 0x11, 0x00, b'R', b'B', b'M', 0x12, 0x03, 0x00, 0x2A];
        frame.push(0b0000_0101);
        frame.resize(20, 0);
        let message = Message::from_bytes(class, &frame).unwrap();
        assert_eq!(ascii_field(&message, "fw_prefix").unwrap(), "RBM");
        assert_eq!(message.get_int("slot_id").unwrap(), 1);
        assert_eq!(message.get_int("invalid").unwrap(), 0);
        assert_eq!(message.get_int("active").unwrap(), 1);
        assert_eq!(feature.entity_type(&message).unwrap(), Some(EntityType::MainApp));
    }

    #[test]
    fn test_entity_types_by_version() {
        assert_eq!(EntityType::from_raw(1, 6), Some(EntityType::RfCompanion));
        assert_eq!(EntityType::from_raw(5, 6), Some(EntityType::MainAppCompanion));
        assert_eq!(EntityType::from_raw(1, 7), None);
        assert_eq!(EntityType::from_raw(2, 8), Some(EntityType::RgbEffect));
        assert_eq!(EntityType::from_raw(6, 11), None);
        assert_eq!(EntityType::from_raw(7, 11), Some(EntityType::EmbeddedImages));
        assert_eq!(EntityType::MainAppCompanion.raw(), 6);
    }

    #[test]
    fn test_get_fw_info_request() {
        let message = create(2).get_fw_info(1, 2, 3).unwrap();
        assert_eq!(
            message.to_bytes().unwrap().as_slice(),
            &[0x11, 0x01, 0x02, 0x10, 0x03, 0x00, 0x00]
        );
    }
}
