//! Feature 0x1861 - Battery Levels Calibration
//!
//! Versions 0 and 1. Version 1 adds `set_battery_source_info` at index 5.

use hidpp_codec::{CodecError, FieldDecl, FrameDecl, FrameSize, Message};

use crate::error::FeatureError;
use crate::factory::typed_feature;
use crate::model::{FeatureDecl, FunctionBinding, VersionDecl};

pub const FEATURE_ID: u16 = 0x1861;
pub const MAX_FUNCTION_INDEX_V0: u8 = 4;
pub const MAX_FUNCTION_INDEX_V1: u8 = 5;

pub const CUTOFF_ENABLE: u8 = 0;
pub const CUTOFF_DISABLE: u8 = 1;
pub const MAX_NUMBER_OF_CALIBRATION_POINTS: usize = 7;

/// Field widths in bits
pub mod len {
    pub const CALIBRATION_POINTS_NB: u16 = 8;
    pub const RESERVED_CALIBRATION: u16 = 8;
    pub const CALIBRATION_POINT: u16 = 16;
    pub const MEASURE: u16 = 16;
    pub const RESERVED_CUTOFF_REQUEST: u16 = 6;
    pub const CUTOFF_CHANGE_STATE_REQUESTED: u16 = 1;
    pub const CUTOFF_DESIRED_STATE: u16 = 1;
    pub const RESERVED_CUTOFF_RESPONSE: u16 = 7;
    pub const CUTOFF_STATE: u16 = 1;
    pub const BATTERY_SOURCE_INDEX: u16 = 8;
}

const CALIBRATION_POINTS: [&str; MAX_NUMBER_OF_CALIBRATION_POINTS] = [
    "calibration_point_0",
    "calibration_point_1",
    "calibration_point_2",
    "calibration_point_3",
    "calibration_point_4",
    "calibration_point_5",
    "calibration_point_6",
];

const CALIBRATION: &[FieldDecl] = &[
    FieldDecl::uint("calibration_points_nb", len::CALIBRATION_POINTS_NB),
    FieldDecl::reserved("reserved", len::RESERVED_CALIBRATION),
    FieldDecl::uint(CALIBRATION_POINTS[0], len::CALIBRATION_POINT),
    FieldDecl::uint(CALIBRATION_POINTS[1], len::CALIBRATION_POINT),
    FieldDecl::uint(CALIBRATION_POINTS[2], len::CALIBRATION_POINT),
    FieldDecl::uint(CALIBRATION_POINTS[3], len::CALIBRATION_POINT),
    FieldDecl::uint(CALIBRATION_POINTS[4], len::CALIBRATION_POINT),
    FieldDecl::uint(CALIBRATION_POINTS[5], len::CALIBRATION_POINT),
    FieldDecl::uint(CALIBRATION_POINTS[6], len::CALIBRATION_POINT),
];

const FRAMES: &[FrameDecl] = &[
    FrameDecl::request("GetBatteryCalibrationInfo", 0, FrameSize::Short, &[]),
    FrameDecl::response(
        "GetBatteryCalibrationInfoResponse",
        0,
        "GetBatteryCalibrationInfo",
        CALIBRATION,
        &[0, 1],
    ),
    FrameDecl::request("MeasureBattery", 1, FrameSize::Short, &[]),
    FrameDecl::response(
        "MeasureBatteryResponse",
        1,
        "MeasureBattery",
        &[FieldDecl::uint("measure", len::MEASURE)],
        &[0, 1],
    ),
    FrameDecl::request("StoreCalibration", 2, FrameSize::Long, CALIBRATION),
    FrameDecl::response("StoreCalibrationResponse", 2, "StoreCalibration", &[], &[0, 1]),
    FrameDecl::request("ReadCalibration", 3, FrameSize::Short, &[]),
    FrameDecl::response(
        "ReadCalibrationResponse",
        3,
        "ReadCalibration",
        CALIBRATION,
        &[0, 1],
    ),
    FrameDecl::request(
        "CutOffControl",
        4,
        FrameSize::Short,
        &[
            FieldDecl::reserved("reserved", len::RESERVED_CUTOFF_REQUEST),
            FieldDecl::uint(
                "cutoff_change_state_requested",
                len::CUTOFF_CHANGE_STATE_REQUESTED,
            ),
            FieldDecl::uint("cutoff_desired_state", len::CUTOFF_DESIRED_STATE),
        ],
    ),
    FrameDecl::response(
        "CutOffControlResponse",
        4,
        "CutOffControl",
        &[
            FieldDecl::reserved("reserved", len::RESERVED_CUTOFF_RESPONSE),
            FieldDecl::uint("cutoff_state", len::CUTOFF_STATE),
        ],
        &[0, 1],
    ),
    FrameDecl::request(
        "SetBatterySourceInfo",
        5,
        FrameSize::Short,
        &[FieldDecl::uint("battery_source_index", len::BATTERY_SOURCE_INDEX)],
    ),
    FrameDecl::response(
        "SetBatterySourceInfoResponse",
        5,
        "SetBatterySourceInfo",
        &[FieldDecl::uint("battery_source_index", len::BATTERY_SOURCE_INDEX)],
        &[1],
    ),
];

pub static DECL: FeatureDecl = FeatureDecl {
    name: "BatteryLevelsCalibration",
    feature_id: FEATURE_ID,
    functions: &[
        (0, "get_battery_calibration_info"),
        (1, "measure_battery"),
        (2, "store_calibration"),
        (3, "read_calibration"),
        (4, "cut_off_control"),
        (5, "set_battery_source_info"),
    ],
    events: &[],
    frames: FRAMES,
    versions: &[
        VersionDecl {
            version: 0,
            max_function_index: MAX_FUNCTION_INDEX_V0,
            functions: &[
                FunctionBinding::new(
                    0,
                    "GetBatteryCalibrationInfo",
                    "GetBatteryCalibrationInfoResponse",
                ),
                FunctionBinding::new(1, "MeasureBattery", "MeasureBatteryResponse"),
                FunctionBinding::new(2, "StoreCalibration", "StoreCalibrationResponse"),
                FunctionBinding::new(3, "ReadCalibration", "ReadCalibrationResponse"),
                FunctionBinding::new(4, "CutOffControl", "CutOffControlResponse"),
            ],
            events: &[],
        },
        VersionDecl {
            version: 1,
            max_function_index: MAX_FUNCTION_INDEX_V1,
            functions: &[FunctionBinding::new(
                5,
                "SetBatterySourceInfo",
                "SetBatterySourceInfoResponse",
            )],
            events: &[],
        },
    ],
};

typed_feature!(
    /// Battery Levels Calibration feature object
    BatteryLevelsCalibration,
    DECL,
    [
        get_battery_calibration_info_cls,
        get_battery_calibration_info_response_cls,
        measure_battery_cls,
        measure_battery_response_cls,
        store_calibration_cls,
        store_calibration_response_cls,
        read_calibration_cls,
        read_calibration_response_cls,
        cut_off_control_cls,
        cut_off_control_response_cls,
        set_battery_source_info_cls,
        set_battery_source_info_response_cls,
    ]
);

impl BatteryLevelsCalibration {
    pub fn get_battery_calibration_info(
        &self,
        device_index: u8,
        feature_index: u8,
    ) -> Result<Message, FeatureError> {
        self.request("get_battery_calibration_info", device_index, feature_index)
    }

    pub fn measure_battery(
        &self,
        device_index: u8,
        feature_index: u8,
    ) -> Result<Message, FeatureError> {
        self.request("measure_battery", device_index, feature_index)
    }

    /// Store up to seven calibration points; unused slots stay zero
    pub fn store_calibration(
        &self,
        device_index: u8,
        feature_index: u8,
        points: &[u16],
    ) -> Result<Message, FeatureError> {
        if points.len() > MAX_NUMBER_OF_CALIBRATION_POINTS {
            return Err(CodecError::OutOfRange {
                field: "calibration_points_nb".to_string(),
                reason: format!(
                    "{} points, at most {MAX_NUMBER_OF_CALIBRATION_POINTS}",
                    points.len()
                ),
            }
            .into());
        }
        let mut message = self.request("store_calibration", device_index, feature_index)?;
        message.set("calibration_points_nb", points.len())?;
        for (name, point) in CALIBRATION_POINTS.iter().zip(points) {
            message.set(name, *point)?;
        }
        Ok(message)
    }

    pub fn read_calibration(
        &self,
        device_index: u8,
        feature_index: u8,
    ) -> Result<Message, FeatureError> {
        self.request("read_calibration", device_index, feature_index)
    }

    pub fn cut_off_control(
        &self,
        device_index: u8,
        feature_index: u8,
        change_state_requested: u8,
        desired_state: u8,
    ) -> Result<Message, FeatureError> {
        Ok(self
            .request("cut_off_control", device_index, feature_index)?
            .with("cutoff_change_state_requested", change_state_requested)?
            .with("cutoff_desired_state", desired_state)?)
    }

    /// Bound from version 1
    pub fn set_battery_source_info(
        &self,
        device_index: u8,
        feature_index: u8,
        battery_source_index: u8,
    ) -> Result<Message, FeatureError> {
        Ok(self
            .request("set_battery_source_info", device_index, feature_index)?
            .with("battery_source_index", battery_source_index)?)
    }
}

/// Calibration points of a calibration-format frame, limited to the declared count
pub fn calibration_points(message: &Message) -> Result<Vec<u16>, FeatureError> {
    let count = message.get_int("calibration_points_nb")? as usize;
    CALIBRATION_POINTS
        .iter()
        .take(count.min(MAX_NUMBER_OF_CALIBRATION_POINTS))
        .map(|name| Ok(message.get_int(name)? as u16))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::FeatureFactory;
    use crate::model::FeatureModel;
    use std::sync::Arc;

    fn create(version: u8) -> BatteryLevelsCalibration {
        let model = Arc::new(FeatureModel::build(&DECL).unwrap());
        BatteryLevelsCalibration::new(FeatureFactory::new(model).create(version).unwrap()).unwrap()
    }

    #[test]
    fn test_cut_off_control_wire() {
        let feature = create(0);
        let message = feature.cut_off_control(1, 4, 1, CUTOFF_ENABLE).unwrap();
        assert_eq!(
            message.to_bytes().unwrap().as_slice(),
            &[0x11, 0x01, 0x04, 0x40, 0x02, 0x00, 0x00]
        );
    }

    #[test]
    fn test_version_selection() {
        let v0 = create(0);
        assert_eq!(v0.max_function_index(), MAX_FUNCTION_INDEX_V0);
        assert!(matches!(
            v0.set_battery_source_info_cls(),
            Err(FeatureError::NotImplemented { .. })
        ));
        assert!(v0.set_battery_source_info(1, 4, 0).is_err());

        let v1 = create(1);
        assert_eq!(v1.max_function_index(), MAX_FUNCTION_INDEX_V1);
        let class = v1.set_battery_source_info_cls().unwrap();
        assert_eq!(class.index(), 5);
        assert!(class.versions().is_empty());
        assert_eq!(v1.set_battery_source_info_response_cls().unwrap().versions(), &[1]);
    }

    #[test]
    fn test_store_calibration_points() {
        let feature = create(1);
        let message = feature.store_calibration(1, 4, &[3300, 3700, 4200]).unwrap();
        let bytes = message.to_bytes().unwrap();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[3..12], &[0x20, 3, 0, 0x0C, 0xE4, 0x0E, 0x74, 0x10, 0x68]);
        assert_eq!(calibration_points(&message).unwrap(), vec![3300, 3700, 4200]);

        let too_many = [0u16; 8];
        assert!(feature.store_calibration(1, 4, &too_many).is_err());
    }

    #[test]
    fn test_measure_response_is_big_endian() {
        let feature = create(0);
        let class = feature.measure_battery_response_cls().unwrap().clone();
        let mut frame = vec![0u8; 20];
        frame[0] = 0x11;
        frame[3] = 0x1A;
        frame[4] = 0x0F;
        frame[5] = 0xA0;
        let message = Message::from_bytes(class, &frame).unwrap();
        assert_eq!(message.get_int("measure").unwrap(), 4000);
    }
}
