//! Feature 0x0000 - Root
//!
//! Always at feature index 0. Maps feature ids to indices and reports the
//! protocol version.

use hidpp_codec::{FieldDecl, FrameDecl, FrameSize, Message};

use crate::error::FeatureError;
use crate::factory::typed_feature;
use crate::model::{FeatureDecl, FunctionBinding, VersionDecl};

pub const FEATURE_ID: u16 = 0x0000;
pub const MAX_FUNCTION_INDEX: u8 = 1;
pub const FEATURE_INDEX: u8 = 0x00;
/// `feat_index` returned for an unsupported feature
pub const FEATURE_NOT_FOUND: u8 = 0x00;

/// Field widths in bits
pub mod len {
    pub const FEATURE_ID: u16 = 16;
    pub const FEATURE_INDEX: u16 = 8;
    pub const FLAG: u16 = 1;
    pub const RESERVED_V0_V1: u16 = 5;
    pub const RESERVED_V2: u16 = 3;
    pub const FEATURE_VERSION: u16 = 8;
    pub const ZERO: u16 = 16;
    pub const PING_DATA: u16 = 8;
    pub const PROTOCOL_NUMBER: u16 = 8;
    pub const TARGET_SOFTWARE: u16 = 8;
}

const FRAMES: &[FrameDecl] = &[
    FrameDecl::request(
        "GetFeature",
        0,
        FrameSize::Short,
        &[FieldDecl::uint("feature_id", len::FEATURE_ID)],
    ),
    FrameDecl::response(
        "GetFeatureResponse",
        0,
        "GetFeature",
        &[
            FieldDecl::uint("feat_index", len::FEATURE_INDEX),
            FieldDecl::uint("obsolete", len::FLAG),
            FieldDecl::uint("hidden", len::FLAG),
            FieldDecl::uint("engineering", len::FLAG),
            FieldDecl::reserved("reserved", len::RESERVED_V0_V1),
        ],
        &[0],
    ),
    FrameDecl::response(
        "GetFeatureV1Response",
        0,
        "GetFeature",
        &[
            FieldDecl::uint("feat_index", len::FEATURE_INDEX),
            FieldDecl::uint("obsolete", len::FLAG),
            FieldDecl::uint("hidden", len::FLAG),
            FieldDecl::uint("engineering", len::FLAG),
            FieldDecl::reserved("reserved", len::RESERVED_V0_V1),
            FieldDecl::uint("feat_ver", len::FEATURE_VERSION),
        ],
        &[1],
    ),
    FrameDecl::response(
        "GetFeatureV2Response",
        0,
        "GetFeature",
        &[
            FieldDecl::uint("feat_index", len::FEATURE_INDEX),
            FieldDecl::uint("obsolete", len::FLAG),
            FieldDecl::uint("hidden", len::FLAG),
            FieldDecl::uint("engineering", len::FLAG),
            FieldDecl::uint("manuf_deact", len::FLAG),
            FieldDecl::uint("compl_deact", len::FLAG),
            FieldDecl::reserved("reserved", len::RESERVED_V2),
            FieldDecl::uint("feat_ver", len::FEATURE_VERSION),
        ],
        &[2],
    ),
    FrameDecl::request(
        "GetProtocolVersion",
        1,
        FrameSize::Short,
        &[
            FieldDecl::reserved("zero", len::ZERO),
            FieldDecl::uint("ping_data", len::PING_DATA),
        ],
    ),
    FrameDecl::response(
        "GetProtocolVersionResponse",
        1,
        "GetProtocolVersion",
        &[
            FieldDecl::uint("protocol_number", len::PROTOCOL_NUMBER),
            FieldDecl::uint("target_software", len::TARGET_SOFTWARE),
            FieldDecl::uint("ping_data", len::PING_DATA),
        ],
        &[0, 1, 2],
    ),
];

pub static DECL: FeatureDecl = FeatureDecl {
    name: "Root",
    feature_id: FEATURE_ID,
    functions: &[(0, "get_feature"), (1, "get_protocol_version")],
    events: &[],
    frames: FRAMES,
    versions: &[
        VersionDecl {
            version: 0,
            max_function_index: MAX_FUNCTION_INDEX,
            functions: &[
                FunctionBinding::new(0, "GetFeature", "GetFeatureResponse"),
                FunctionBinding::new(1, "GetProtocolVersion", "GetProtocolVersionResponse"),
            ],
            events: &[],
        },
        VersionDecl {
            version: 1,
            max_function_index: MAX_FUNCTION_INDEX,
            functions: &[FunctionBinding::new(0, "GetFeature", "GetFeatureV1Response")],
            events: &[],
        },
        VersionDecl {
            version: 2,
            max_function_index: MAX_FUNCTION_INDEX,
            functions: &[FunctionBinding::new(0, "GetFeature", "GetFeatureV2Response")],
            events: &[],
        },
    ],
};

typed_feature!(
    /// Root feature object
    Root,
    DECL,
    [
        get_feature_cls,
        get_feature_response_cls,
        get_protocol_version_cls,
        get_protocol_version_response_cls,
    ]
);

impl Root {
    pub fn get_feature(&self, device_index: u8, feature_id: u16) -> Result<Message, FeatureError> {
        Ok(self
            .request("get_feature", device_index, FEATURE_INDEX)?
            .with("feature_id", feature_id)?)
    }

    pub fn get_protocol_version(
        &self,
        device_index: u8,
        ping_data: u8,
    ) -> Result<Message, FeatureError> {
        Ok(self
            .request("get_protocol_version", device_index, FEATURE_INDEX)?
            .with("ping_data", ping_data)?)
    }
}

/// Decoded `get_feature` response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureLookup {
    pub feature_index: u8,
    pub obsolete: bool,
    pub hidden: bool,
    pub engineering: bool,
    /// Absent from version 0 responses
    pub version: Option<u8>,
}

impl FeatureLookup {
    pub fn from_message(message: &Message) -> Result<Self, FeatureError> {
        let flag = |name: &str| -> Result<bool, FeatureError> { Ok(message.get_int(name)? != 0) };
        let version = match message.class().payload().field("feat_ver") {
            Some(_) => Some(message.get_int("feat_ver")? as u8),
            None => None,
        };
        Ok(Self {
            feature_index: message.get_int("feat_index")? as u8,
            obsolete: flag("obsolete")?,
            hidden: flag("hidden")?,
            engineering: flag("engineering")?,
            version,
        })
    }

    /// Index 0 for any id but the root's own means not supported
    pub fn is_found(&self) -> bool {
        self.feature_index != FEATURE_NOT_FOUND
    }
}
