//! Feature 0x18B0 - Static Monitor Mode
//!
//! One function and up to six events. Version 1 adds the larger-matrix
//! keyboard reports at event indices 4 and 5.

use hidpp_codec::{FieldDecl, FrameDecl, FrameSize, Message, REPORT_ID_SHORT};

use crate::error::FeatureError;
use crate::factory::typed_feature;
use crate::model::{EventBinding, FeatureDecl, FunctionBinding, VersionDecl};

pub const FEATURE_ID: u16 = 0x18B0;
pub const MAX_FUNCTION_INDEX_V0: u8 = 0;
pub const MAX_FUNCTION_INDEX_V1: u8 = 0;

/// Monitoring modes accepted by `set_monitor_mode`
pub mod mode {
    pub const OFF: u8 = 0;
    pub const KBD_ON: u8 = 1;
    pub const MOUSE_ON: u8 = 2;
    pub const ENHANCED_KBD_ON: u8 = 3;
    pub const KBD_LARGER_MATRIX: u8 = 4;
    pub const ENHANCED_KBD_LARGER_MATRIX: u8 = 5;
}

pub const MAKE: u8 = 1;
pub const BREAK: u8 = 0;

pub const ROW_UPPER_LIMIT: u8 = 18;
pub const COL_UPPER_LIMIT: u8 = 15;

/// Field widths in bits
pub mod len {
    pub const MODE: u16 = 8;
    pub const MODE_SPECIFIC_MONITOR_REPORT: u16 = 128;
    pub const ROW_COL_CODE: u16 = 8;
    pub const BREAK_OR_MAKE_INFO: u16 = 8;
    pub const X_VALUE: u16 = 16;
    pub const Y_VALUE: u16 = 16;
    pub const TILT_LEFT_OR_RIGHT_ANALOG_VALUE: u16 = 8;
    pub const BACK_AND_FORWARD_ANALOG_VALUES: u16 = 8;
    pub const ROLLER_VALUE: u16 = 8;
    pub const TIME_BETWEEN_RATCHETS: u16 = 8;
    pub const SWITCHES: u16 = 16;
    pub const ROW_CODE: u16 = 8;
    pub const COL_CODE: u16 = 8;
}

const FRAMES: &[FrameDecl] = &[
    FrameDecl::request(
        "SetMonitorMode",
        0,
        FrameSize::Short,
        &[FieldDecl::uint("mode", len::MODE)],
    )
    .with_report_id(REPORT_ID_SHORT),
    FrameDecl::response(
        "SetMonitorModeResponse",
        0,
        "SetMonitorMode",
        &[FieldDecl::uint("mode", len::MODE)],
        &[0, 1],
    ),
    FrameDecl::event(
        "MonitorModeBroadcastEvent",
        0,
        &[FieldDecl::raw(
            "mode_specific_monitor_report",
            len::MODE_SPECIFIC_MONITOR_REPORT,
        )],
        &[0, 1],
    ),
    FrameDecl::event(
        "KeyboardModeEvent",
        1,
        &[
            FieldDecl::uint("row_col_code", len::ROW_COL_CODE),
            FieldDecl::uint("break_or_make_info", len::BREAK_OR_MAKE_INFO),
        ],
        &[0, 1],
    ),
    FrameDecl::event(
        "MouseModeEvent",
        2,
        &[
            FieldDecl::uint("x_value", len::X_VALUE),
            FieldDecl::uint("y_value", len::Y_VALUE),
            FieldDecl::uint(
                "tilt_left_or_right_analog_value",
                len::TILT_LEFT_OR_RIGHT_ANALOG_VALUE,
            ),
            FieldDecl::uint(
                "back_and_forward_analog_values",
                len::BACK_AND_FORWARD_ANALOG_VALUES,
            ),
            FieldDecl::uint("roller_value", len::ROLLER_VALUE),
            FieldDecl::uint("time_between_ratchets", len::TIME_BETWEEN_RATCHETS),
            FieldDecl::uint("switches", len::SWITCHES),
        ],
        &[0, 1],
    ),
    FrameDecl::event(
        "EnhancedKeyboardModeEvent",
        3,
        &[
            FieldDecl::uint("row_col_code_0", len::ROW_COL_CODE),
            FieldDecl::uint("row_col_code_1", len::ROW_COL_CODE),
            FieldDecl::uint("row_col_code_2", len::ROW_COL_CODE),
            FieldDecl::uint("row_col_code_3", len::ROW_COL_CODE),
            FieldDecl::uint("row_col_code_4", len::ROW_COL_CODE),
            FieldDecl::uint("row_col_code_5", len::ROW_COL_CODE),
            FieldDecl::uint("row_col_code_6", len::ROW_COL_CODE),
            FieldDecl::uint("row_col_code_7", len::ROW_COL_CODE),
        ],
        &[0, 1],
    ),
    FrameDecl::event(
        "KeyboardWithLargerMatrixModeEvent",
        4,
        &[
            FieldDecl::uint("row_code", len::ROW_CODE),
            FieldDecl::uint("col_code", len::COL_CODE),
            FieldDecl::uint("break_or_make_info", len::BREAK_OR_MAKE_INFO),
        ],
        &[1],
    ),
    FrameDecl::event(
        "EnhancedKeyboardWithLargerMatrixModeEvent",
        5,
        &[
            FieldDecl::uint("row_code_0", len::ROW_CODE),
            FieldDecl::uint("col_code_0", len::COL_CODE),
            FieldDecl::uint("row_code_1", len::ROW_CODE),
            FieldDecl::uint("col_code_1", len::COL_CODE),
            FieldDecl::uint("row_code_2", len::ROW_CODE),
            FieldDecl::uint("col_code_2", len::COL_CODE),
            FieldDecl::uint("row_code_3", len::ROW_CODE),
            FieldDecl::uint("col_code_3", len::COL_CODE),
            FieldDecl::uint("row_code_4", len::ROW_CODE),
            FieldDecl::uint("col_code_4", len::COL_CODE),
            FieldDecl::uint("row_code_5", len::ROW_CODE),
            FieldDecl::uint("col_code_5", len::COL_CODE),
            FieldDecl::uint("row_code_6", len::ROW_CODE),
            FieldDecl::uint("col_code_6", len::COL_CODE),
            FieldDecl::uint("row_code_7", len::ROW_CODE),
            FieldDecl::uint("col_code_7", len::COL_CODE),
        ],
        &[1],
    ),
];

pub static DECL: FeatureDecl = FeatureDecl {
    name: "StaticMonitorMode",
    feature_id: FEATURE_ID,
    functions: &[(0, "set_monitor_mode")],
    events: &[
        (0, "monitor_mode_broadcast"),
        (1, "keyboard_mode"),
        (2, "mouse_mode"),
        (3, "enhanced_keyboard_mode"),
        (4, "keyboard_with_larger_matrix_mode"),
        (5, "enhanced_keyboard_with_larger_matrix_mode"),
    ],
    frames: FRAMES,
    versions: &[
        VersionDecl {
            version: 0,
            max_function_index: MAX_FUNCTION_INDEX_V0,
            functions: &[FunctionBinding::new(0, "SetMonitorMode", "SetMonitorModeResponse")],
            events: &[
                EventBinding::new(0, "MonitorModeBroadcastEvent"),
                EventBinding::new(1, "KeyboardModeEvent"),
                EventBinding::new(2, "MouseModeEvent"),
                EventBinding::new(3, "EnhancedKeyboardModeEvent"),
            ],
        },
        VersionDecl {
            version: 1,
            max_function_index: MAX_FUNCTION_INDEX_V1,
            functions: &[],
            events: &[
                EventBinding::new(4, "KeyboardWithLargerMatrixModeEvent"),
                EventBinding::new(5, "EnhancedKeyboardWithLargerMatrixModeEvent"),
            ],
        },
    ],
};

typed_feature!(
    /// Static Monitor Mode feature object
    StaticMonitorMode,
    DECL,
    [
        set_monitor_mode_cls,
        set_monitor_mode_response_cls,
        monitor_mode_broadcast_event_cls,
        keyboard_mode_event_cls,
        mouse_mode_event_cls,
        enhanced_keyboard_mode_event_cls,
        keyboard_with_larger_matrix_mode_event_cls,
        enhanced_keyboard_with_larger_matrix_mode_event_cls,
    ]
);

impl StaticMonitorMode {
    pub fn set_monitor_mode(
        &self,
        device_index: u8,
        feature_index: u8,
        mode: u8,
    ) -> Result<Message, FeatureError> {
        Ok(self
            .request("set_monitor_mode", device_index, feature_index)?
            .with("mode", mode)?)
    }
}

/// One key transition from a keyboard-mode event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTransition {
    pub row_col_code: u8,
    pub make: bool,
}

impl KeyTransition {
    pub fn from_message(message: &Message) -> Result<Self, FeatureError> {
        Ok(Self {
            row_col_code: message.get_int("row_col_code")? as u8,
            make: message.get_int("break_or_make_info")? as u8 == MAKE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::FeatureFactory;
    use crate::model::FeatureModel;
    use std::sync::Arc;

    fn create(version: u8) -> StaticMonitorMode {
        let model = Arc::new(FeatureModel::build(&DECL).unwrap());
        StaticMonitorMode::new(FeatureFactory::new(model).create(version).unwrap()).unwrap()
    }

    #[test]
    fn test_set_monitor_mode_short_report() {
        let message = create(0).set_monitor_mode(1, 9, mode::KBD_ON).unwrap();
        assert_eq!(
            message.to_bytes().unwrap().as_slice(),
            &[REPORT_ID_SHORT, 0x01, 0x09, 0x00, 0x01, 0x00, 0x00]
        );
    }

    #[test]
    fn test_keyboard_event_dispatch() {
        let feature = create(1);
        let mut frame = vec![0x11, 0x01, 0x09, 0x10, 0x17, MAKE];
        frame.resize(20, 0);
        let message = feature.decode(&frame).unwrap();
        assert_eq!(message.class().name(), "KeyboardModeEvent");
        assert_eq!(
            KeyTransition::from_message(&message).unwrap(),
            KeyTransition {
                row_col_code: 0x17,
                make: true
            }
        );
    }

    #[test]
    fn test_larger_matrix_events_need_v1() {
        let v0 = create(0);
        assert!(matches!(
            v0.keyboard_with_larger_matrix_mode_event_cls(),
            Err(FeatureError::NotImplemented { .. })
        ));
        let v1 = create(1);
        assert_eq!(
            v1.enhanced_keyboard_with_larger_matrix_mode_event_cls()
                .unwrap()
                .payload()
                .bit_length(),
            128
        );
    }

    #[test]
    fn test_mouse_event_fields() {
        let feature = create(0);
        let mut frame = vec![0x11, 0x01, 0x09, 0x20, 0x00, 0x10, 0xFF, 0xF0, 1, 2, 3, 4, 0x00, 0x05];
        frame.resize(20, 0);
        let message = feature.decode(&frame).unwrap();
        assert_eq!(message.class().name(), "MouseModeEvent");
        assert_eq!(message.get_int("x_value").unwrap(), 0x0010);
        assert_eq!(message.get_int("y_value").unwrap(), 0xFFF0);
        assert_eq!(message.get_int("time_between_ratchets").unwrap(), 4);
        assert_eq!(message.get_int("switches").unwrap(), 5);
    }
}
