//! Feature 0x1817 - Lightspeed Prepairing

use hidpp_codec::{
    DiscriminatorDecl, FieldDecl, FrameDecl, FrameSize, HexList, Message, NestedDecl, Record,
    REPORT_ID_SHORT,
};

use crate::error::FeatureError;
use crate::factory::typed_feature;
use crate::model::{FeatureDecl, FunctionBinding, VersionDecl};

pub const FEATURE_ID: u16 = 0x1817;
pub const MAX_FUNCTION_INDEX_V0: u8 = 4;

/// Slot bits of prepairing management
pub mod pairing_slot {
    pub const LS: u8 = 0x01;
    pub const CRUSH: u8 = 0x02;
    pub const LS2: u8 = 0x04;
}

/// Prepairing management control values
pub mod control {
    pub const START: u8 = 0x00;
    pub const STORE: u8 = 0x01;
    pub const DELETE: u8 = 0x02;
}

/// Source of the data read back by `get_prepairing_data`
pub mod information_type {
    pub const PAIRING: u8 = 0x00;
    pub const PRE_PAIRING: u8 = 0xFF;
}

/// Interpretation of the 6-byte `data` region
pub mod data_type {
    pub const PAIRING_ADDRESS: u8 = 0x00;
    pub const EQUAD_ATTRIBUTES: u8 = 0x01;
}

/// Field widths in bits
pub mod len {
    pub const RESERVED_FLAGS: u16 = 7;
    pub const USE_ATTR: u16 = 1;
    pub const RESERVED_SLOTS: u16 = 5;
    pub const SLOT: u16 = 1;
    pub const PREPAIRING_MANAGEMENT_CONTROL: u16 = 8;
    pub const LTK: u16 = 128;
    pub const DATA_TYPE: u16 = 8;
    pub const DATA: u16 = 48;
    pub const RESERVED_SET_DATA: u16 = 72;
    pub const INFORMATION_TYPE: u16 = 8;
    pub const RESERVED_GET_DATA: u16 = 112;
    pub const PAIRING_ADDRESS_BASE: u16 = 32;
    pub const ADDRESS_DEST: u16 = 8;
    pub const UNUSED: u16 = 8;
    pub const EQUAD_ATTRIBUTES: u16 = 48;
}

pub const DEFAULT_ADDRESS_DEST: u8 = 0x01;

pub const PAIRING_ADDRESS: NestedDecl = NestedDecl {
    name: "DataDetailsPairingAddress",
    fields: &[
        FieldDecl::uint("pairing_address_base", len::PAIRING_ADDRESS_BASE),
        FieldDecl::uint("address_dest", len::ADDRESS_DEST).with_default(DEFAULT_ADDRESS_DEST as u64),
        FieldDecl::uint("unused", len::UNUSED),
    ],
};

pub const EQUAD_ATTRIBUTES: NestedDecl = NestedDecl {
    name: "DataDetailsEquadAttributes",
    fields: &[FieldDecl::uint("equad_attributes", len::EQUAD_ATTRIBUTES)],
};

const DATA: DiscriminatorDecl = DiscriminatorDecl {
    tag: "data_type",
    data: "data",
    variants: &[
        (data_type::PAIRING_ADDRESS as u64, &PAIRING_ADDRESS),
        (data_type::EQUAD_ATTRIBUTES as u64, &EQUAD_ATTRIBUTES),
    ],
};

const FRAMES: &[FrameDecl] = &[
    FrameDecl::request("GetCapabilities", 0, FrameSize::Short, &[]).with_report_id(REPORT_ID_SHORT),
    FrameDecl::response(
        "GetCapabilitiesResponse",
        0,
        "GetCapabilities",
        &[
            FieldDecl::reserved("reserved_flags", len::RESERVED_FLAGS),
            FieldDecl::uint("use_attr", len::USE_ATTR),
            FieldDecl::reserved("reserved_slots", len::RESERVED_SLOTS),
            FieldDecl::uint("ls2", len::SLOT),
            FieldDecl::uint("crush", len::SLOT),
            FieldDecl::uint("ls", len::SLOT),
        ],
        &[0],
    ),
    FrameDecl::request(
        "PrepairingManagement",
        1,
        FrameSize::Long,
        &[
            FieldDecl::reserved("reserved_slot", len::RESERVED_SLOTS),
            FieldDecl::uint("ls2", len::SLOT),
            FieldDecl::uint("crush", len::SLOT),
            FieldDecl::uint("ls", len::SLOT),
            FieldDecl::uint(
                "prepairing_management_control",
                len::PREPAIRING_MANAGEMENT_CONTROL,
            ),
        ],
    ),
    FrameDecl::response(
        "PrepairingManagementResponse",
        1,
        "PrepairingManagement",
        &[],
        &[0],
    ),
    FrameDecl::request(
        "SetLTK",
        2,
        FrameSize::Long,
        &[FieldDecl::raw("ltk", len::LTK)],
    ),
    FrameDecl::response("SetLTKResponse", 2, "SetLTK", &[], &[0]),
    FrameDecl::request(
        "SetPrepairingData",
        3,
        FrameSize::Long,
        &[
            FieldDecl::uint("data_type", len::DATA_TYPE),
            FieldDecl::uint("data", len::DATA),
            FieldDecl::reserved("reserved", len::RESERVED_SET_DATA),
        ],
    )
    .with_discriminator(DATA),
    FrameDecl::response(
        "SetPrepairingDataResponse",
        3,
        "SetPrepairingData",
        &[],
        &[0],
    ),
    FrameDecl::request(
        "GetPrepairingData",
        4,
        FrameSize::Long,
        &[
            FieldDecl::uint("information_type", len::INFORMATION_TYPE),
            FieldDecl::uint("data_type", len::DATA_TYPE),
            FieldDecl::reserved("reserved", len::RESERVED_GET_DATA),
        ],
    ),
    FrameDecl::response(
        "GetPrepairingDataResponse",
        4,
        "GetPrepairingData",
        &[
            FieldDecl::uint("information_type", len::INFORMATION_TYPE),
            FieldDecl::uint("data_type", len::DATA_TYPE),
            FieldDecl::uint("data", len::DATA),
        ],
        &[0],
    )
    .with_discriminator(DATA),
];

pub static DECL: FeatureDecl = FeatureDecl {
    name: "LightspeedPrepairing",
    feature_id: FEATURE_ID,
    functions: &[
        (0, "get_capabilities"),
        (1, "prepairing_management"),
        (2, "set_ltk"),
        (3, "set_prepairing_data"),
        (4, "get_prepairing_data"),
    ],
    events: &[],
    frames: FRAMES,
    versions: &[VersionDecl {
        version: 0,
        max_function_index: MAX_FUNCTION_INDEX_V0,
        functions: &[
            FunctionBinding::new(0, "GetCapabilities", "GetCapabilitiesResponse"),
            FunctionBinding::new(1, "PrepairingManagement", "PrepairingManagementResponse"),
            FunctionBinding::new(2, "SetLTK", "SetLTKResponse"),
            FunctionBinding::new(3, "SetPrepairingData", "SetPrepairingDataResponse"),
            FunctionBinding::new(4, "GetPrepairingData", "GetPrepairingDataResponse"),
        ],
        events: &[],
    }],
};

/// Typed content of the `data` region
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepairingData {
    PairingAddress {
        pairing_address_base: u32,
        address_dest: u8,
    },
    EquadAttributes(u64),
}

impl PrepairingData {
    pub fn data_type(&self) -> u8 {
        match self {
            PrepairingData::PairingAddress { .. } => data_type::PAIRING_ADDRESS,
            PrepairingData::EquadAttributes(_) => data_type::EQUAD_ATTRIBUTES,
        }
    }

    /// Nested record; the pairing address carries `unused = 0x00`
    pub fn to_record(&self) -> Result<Record, FeatureError> {
        let record = match self {
            PrepairingData::PairingAddress {
                pairing_address_base,
                address_dest,
            } => Record::from_values(
                PAIRING_ADDRESS.build()?.into(),
                [
                    ("pairing_address_base", u64::from(*pairing_address_base)),
                    ("address_dest", u64::from(*address_dest)),
                    ("unused", 0x00),
                ],
            )?,
            PrepairingData::EquadAttributes(attributes) => Record::from_values(
                EQUAD_ATTRIBUTES.build()?.into(),
                [("equad_attributes", *attributes)],
            )?,
        };
        Ok(record)
    }

    /// Typed view of a frame with a discriminated `data` field
    pub fn from_message(message: &Message) -> Result<Self, FeatureError> {
        let variant = message.variant()?;
        let record = variant.record();
        if record.name() == PAIRING_ADDRESS.name {
            Ok(PrepairingData::PairingAddress {
                pairing_address_base: record.get_int("pairing_address_base")? as u32,
                address_dest: record.get_int("address_dest")? as u8,
            })
        } else {
            Ok(PrepairingData::EquadAttributes(
                record.get_int("equad_attributes")?,
            ))
        }
    }
}

typed_feature!(
    /// Lightspeed Prepairing feature object
    LightspeedPrepairing,
    DECL,
    [
        get_capabilities_cls,
        get_capabilities_response_cls,
        prepairing_management_cls,
        prepairing_management_response_cls,
        set_ltk_cls,
        set_ltk_response_cls,
        set_prepairing_data_cls,
        set_prepairing_data_response_cls,
        get_prepairing_data_cls,
        get_prepairing_data_response_cls,
    ]
);

impl LightspeedPrepairing {
    pub fn get_capabilities(
        &self,
        device_index: u8,
        feature_index: u8,
    ) -> Result<Message, FeatureError> {
        self.request("get_capabilities", device_index, feature_index)
    }

    /// `slots` is a mask of [`pairing_slot`] bits
    pub fn prepairing_management(
        &self,
        device_index: u8,
        feature_index: u8,
        slots: u8,
        control: u8,
    ) -> Result<Message, FeatureError> {
        Ok(self
            .request("prepairing_management", device_index, feature_index)?
            .with("ls2", u8::from(slots & pairing_slot::LS2 != 0))?
            .with("crush", u8::from(slots & pairing_slot::CRUSH != 0))?
            .with("ls", u8::from(slots & pairing_slot::LS != 0))?
            .with("prepairing_management_control", control)?)
    }

    pub fn set_ltk(
        &self,
        device_index: u8,
        feature_index: u8,
        ltk: HexList,
    ) -> Result<Message, FeatureError> {
        Ok(self
            .request("set_ltk", device_index, feature_index)?
            .with("ltk", ltk)?)
    }

    pub fn set_prepairing_data(
        &self,
        device_index: u8,
        feature_index: u8,
        data: &PrepairingData,
    ) -> Result<Message, FeatureError> {
        let mut message = self.request("set_prepairing_data", device_index, feature_index)?;
        message.set_variant(data.to_record()?)?;
        Ok(message)
    }

    pub fn get_prepairing_data(
        &self,
        device_index: u8,
        feature_index: u8,
        information_type: u8,
        data_type: u8,
    ) -> Result<Message, FeatureError> {
        Ok(self
            .request("get_prepairing_data", device_index, feature_index)?
            .with("information_type", information_type)?
            .with("data_type", data_type)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::FeatureFactory;
    use crate::model::FeatureModel;
    use std::sync::Arc;

    fn create() -> LightspeedPrepairing {
        let model = Arc::new(FeatureModel::build(&DECL).unwrap());
        LightspeedPrepairing::new(FeatureFactory::new(model).create(0).unwrap()).unwrap()
    }

    #[test]
    fn test_get_capabilities_short_report() {
        let message = create().get_capabilities(1, 7).unwrap();
        assert_eq!(
            message.to_bytes().unwrap().as_slice(),
            &[REPORT_ID_SHORT, 0x01, 0x07, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_prepairing_management_slots() {
        let message = create()
            .prepairing_management(1, 7, pairing_slot::LS | pairing_slot::LS2, control::STORE)
            .unwrap();
        let bytes = message.to_bytes().unwrap();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[3..6], &[0x10, 0x05, 0x01]);
    }

    #[test]
    fn test_prepairing_data_variants() {
        let feature = create();
        let class = feature.set_prepairing_data_cls().unwrap().clone();

        let address = PrepairingData::PairingAddress {
            pairing_address_base: 0xDEADBEEF,
            address_dest: DEFAULT_ADDRESS_DEST,
        };
        let message = feature.set_prepairing_data(1, 7, &address).unwrap();
        let bytes = message.to_bytes().unwrap();
        assert_eq!(&bytes[4..11], &[0x00, 0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x00]);
        let parsed = Message::from_bytes(class.clone(), &bytes).unwrap();
        assert_eq!(PrepairingData::from_message(&parsed).unwrap(), address);

        let attributes = PrepairingData::EquadAttributes(0x010203040506);
        let message = feature.set_prepairing_data(1, 7, &attributes).unwrap();
        let parsed = Message::from_bytes(class, &message.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.get_int("data_type").unwrap(), 1);
        assert_eq!(PrepairingData::from_message(&parsed).unwrap(), attributes);
    }

    #[test]
    fn test_response_unknown_data_type_falls_back() {
        let class = create().get_prepairing_data_response_cls().unwrap().clone();
        let mut frame = vec![0u8; 20];
        frame[0] = 0x11;
        frame[3] = 0x41;
        frame[4] = information_type::PRE_PAIRING;
        frame[5] = 0x09;
        frame[6..12].copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        let message = Message::from_bytes(class, &frame).unwrap();
        let variant = message.variant().unwrap();
        assert!(!variant.is_recognized());
        assert_eq!(
            PrepairingData::from_message(&message).unwrap(),
            PrepairingData::EquadAttributes(0x010203040506)
        );
    }
}
