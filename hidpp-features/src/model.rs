//! Feature declarations and the per-version lookup table built from them
//!
//! A feature is declared once as constant data: its interface (function and
//! event names), every concrete frame, and a list of per-version deltas. The
//! model merges the deltas into a `(version → bindings)` table at build time
//! and checks that every response and event class lists exactly the versions
//! that bind it.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use hidpp_codec::message::MAX_NIBBLE;
use hidpp_codec::{FrameDecl, MessageClass, MessageType};
use tracing::debug;

use crate::error::FeatureError;

// =============================================================================
// Declarations
// =============================================================================

/// Request/response pair bound at one function index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionBinding {
    pub index: u8,
    pub request: &'static str,
    pub response: &'static str,
}

impl FunctionBinding {
    pub const fn new(index: u8, request: &'static str, response: &'static str) -> Self {
        Self {
            index,
            request,
            response,
        }
    }
}

/// Report bound at one event index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventBinding {
    pub index: u8,
    pub report: &'static str,
}

impl EventBinding {
    pub const fn new(index: u8, report: &'static str) -> Self {
        Self { index, report }
    }
}

/// Bindings a version adds or replaces relative to the previous version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionDecl {
    pub version: u8,
    pub max_function_index: u8,
    pub functions: &'static [FunctionBinding],
    pub events: &'static [EventBinding],
}

/// Static description of one feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureDecl {
    /// Title-case name, e.g. `BatteryLevelsCalibration`
    pub name: &'static str,
    pub feature_id: u16,
    /// Function names by index, across every version
    pub functions: &'static [(u8, &'static str)],
    /// Event names by index, across every version
    pub events: &'static [(u8, &'static str)],
    pub frames: &'static [FrameDecl],
    /// Contiguous, lowest version first
    pub versions: &'static [VersionDecl],
}

impl FeatureDecl {
    pub fn function_name(&self, index: u8) -> Option<&'static str> {
        self.functions
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, name)| *name)
    }

    pub fn event_name(&self, index: u8) -> Option<&'static str> {
        self.events
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, name)| *name)
    }
}

// =============================================================================
// Classes
// =============================================================================

/// Version-independent feature constants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseClass {
    name: String,
    feature_id: u16,
    max_function_index: BTreeMap<u8, u8>,
}

impl BaseClass {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn feature_id(&self) -> u16 {
        self.feature_id
    }

    /// `MAX_FUNCTION_INDEX_V<n>`
    pub fn max_function_index(&self, version: u8) -> Option<u8> {
        self.max_function_index.get(&version).copied()
    }

    pub fn max_function_indices(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.max_function_index.iter().map(|(v, m)| (*v, *m))
    }
}

/// Main class of one feature version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainClass {
    name: String,
    feature_id: u16,
    version: u8,
    max_function_index: u8,
}

impl MainClass {
    /// e.g. `BatteryLevelsCalibrationV1`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn feature_id(&self) -> u16 {
        self.feature_id
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn max_function_index(&self) -> u8 {
        self.max_function_index
    }
}

impl fmt::Display for MainClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (0x{:04X}, max function index {})",
            self.name, self.feature_id, self.max_function_index
        )
    }
}

/// Classes bound at one function index
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionClasses {
    pub request: Arc<MessageClass>,
    pub response: Arc<MessageClass>,
}

/// Merged bindings of one version
#[derive(Debug, Clone, PartialEq)]
pub struct VersionEntry {
    main: Arc<MainClass>,
    functions: BTreeMap<u8, FunctionClasses>,
    events: BTreeMap<u8, Arc<MessageClass>>,
}

impl VersionEntry {
    pub fn main(&self) -> &Arc<MainClass> {
        &self.main
    }

    pub fn functions(&self) -> &BTreeMap<u8, FunctionClasses> {
        &self.functions
    }

    pub fn events(&self) -> &BTreeMap<u8, Arc<MessageClass>> {
        &self.events
    }

    fn binds(&self, class_name: &str) -> bool {
        self.functions.values().any(|f| f.response.name() == class_name)
            || self.events.values().any(|e| e.name() == class_name)
    }
}

// =============================================================================
// Model
// =============================================================================

/// `(version → bindings)` lookup table of one feature
#[derive(Debug, Clone)]
pub struct FeatureModel {
    decl: &'static FeatureDecl,
    base: BaseClass,
    classes: Vec<Arc<MessageClass>>,
    by_name: HashMap<&'static str, usize>,
    versions: BTreeMap<u8, VersionEntry>,
}

impl FeatureModel {
    /// Build every frame class and merge the version deltas
    pub fn build(decl: &'static FeatureDecl) -> Result<Self, FeatureError> {
        let mut classes = Vec::with_capacity(decl.frames.len());
        let mut by_name = HashMap::with_capacity(decl.frames.len());
        for frame in decl.frames {
            if by_name.insert(frame.name, classes.len()).is_some() {
                return Err(invalid(decl, format!("duplicate frame {}", frame.name)));
            }
            classes.push(Arc::new(frame.build(decl.feature_id)?));
        }

        let first = decl
            .versions
            .first()
            .map(|v| v.version)
            .ok_or_else(|| invalid(decl, "no version declared"))?;

        let mut functions: BTreeMap<u8, FunctionClasses> = BTreeMap::new();
        let mut events: BTreeMap<u8, Arc<MessageClass>> = BTreeMap::new();
        let mut versions = BTreeMap::new();
        let mut max_function_index = BTreeMap::new();

        for (offset, delta) in decl.versions.iter().enumerate() {
            if usize::from(delta.version) != usize::from(first) + offset {
                return Err(invalid(
                    decl,
                    format!("version {} breaks the contiguous version list", delta.version),
                ));
            }
            if delta.max_function_index > MAX_NIBBLE {
                return Err(invalid(
                    decl,
                    format!("v{} max function index {}", delta.version, delta.max_function_index),
                ));
            }

            for binding in delta.functions {
                if decl.function_name(binding.index).is_none() {
                    return Err(invalid(
                        decl,
                        format!("function index {} is not in the interface", binding.index),
                    ));
                }
                let request = lookup(
                    decl,
                    &classes,
                    &by_name,
                    binding.request,
                    MessageType::Request,
                    binding.index,
                )?;
                let response = lookup(
                    decl,
                    &classes,
                    &by_name,
                    binding.response,
                    MessageType::Response,
                    binding.index,
                )?;
                if !response.request_list().iter().any(|r| r == binding.request) {
                    return Err(invalid(
                        decl,
                        format!("{} does not answer {}", binding.response, binding.request),
                    ));
                }
                functions.insert(binding.index, FunctionClasses { request, response });
            }

            for binding in delta.events {
                if decl.event_name(binding.index).is_none() {
                    return Err(invalid(
                        decl,
                        format!("event index {} is not in the interface", binding.index),
                    ));
                }
                let report = lookup(
                    decl,
                    &classes,
                    &by_name,
                    binding.report,
                    MessageType::Event,
                    binding.index,
                )?;
                events.insert(binding.index, report);
            }

            if let Some((&highest, _)) = functions.last_key_value() {
                if highest > delta.max_function_index {
                    return Err(invalid(
                        decl,
                        format!(
                            "v{} binds function {} above max function index {}",
                            delta.version, highest, delta.max_function_index
                        ),
                    ));
                }
            }

            let main = Arc::new(MainClass {
                name: format!("{}V{}", decl.name, delta.version),
                feature_id: decl.feature_id,
                version: delta.version,
                max_function_index: delta.max_function_index,
            });
            debug!(
                class = main.name(),
                functions = functions.len(),
                events = events.len(),
                "bound feature version"
            );
            max_function_index.insert(delta.version, delta.max_function_index);
            versions.insert(
                delta.version,
                VersionEntry {
                    main,
                    functions: functions.clone(),
                    events: events.clone(),
                },
            );
        }

        for class in &classes {
            if !matches!(class.msg_type(), MessageType::Response | MessageType::Event) {
                continue;
            }
            let bound: BTreeSet<u8> = versions
                .iter()
                .filter(|(_, entry)| entry.binds(class.name()))
                .map(|(version, _)| *version)
                .collect();
            let declared: BTreeSet<u8> = class.versions().iter().copied().collect();
            if bound != declared {
                return Err(invalid(
                    decl,
                    format!(
                        "{} declares versions {:?} but is bound in {:?}",
                        class.name(),
                        declared,
                        bound
                    ),
                ));
            }
        }

        Ok(Self {
            decl,
            base: BaseClass {
                name: decl.name.to_string(),
                feature_id: decl.feature_id,
                max_function_index,
            },
            classes,
            by_name,
            versions,
        })
    }

    pub fn decl(&self) -> &'static FeatureDecl {
        self.decl
    }

    pub fn name(&self) -> &'static str {
        self.decl.name
    }

    pub fn feature_id(&self) -> u16 {
        self.decl.feature_id
    }

    /// Declared versions, ascending
    pub fn versions(&self) -> impl Iterator<Item = u8> + '_ {
        self.versions.keys().copied()
    }

    pub fn has_version(&self, version: u8) -> bool {
        self.versions.contains_key(&version)
    }

    pub fn entry(&self, version: u8) -> Result<&VersionEntry, FeatureError> {
        self.versions
            .get(&version)
            .ok_or(FeatureError::UnknownVersion {
                feature_id: self.feature_id(),
                version,
            })
    }

    pub fn get_main_cls(&self, version: u8) -> Result<&Arc<MainClass>, FeatureError> {
        Ok(self.entry(version)?.main())
    }

    pub fn get_base_cls(&self) -> &BaseClass {
        &self.base
    }

    pub fn get_request_cls(
        &self,
        version: u8,
        function_index: u8,
    ) -> Result<&Arc<MessageClass>, FeatureError> {
        Ok(&self.function(version, function_index)?.request)
    }

    pub fn get_response_cls(
        &self,
        version: u8,
        function_index: u8,
    ) -> Result<&Arc<MessageClass>, FeatureError> {
        Ok(&self.function(version, function_index)?.response)
    }

    pub fn get_report_cls(
        &self,
        version: u8,
        event_index: u8,
    ) -> Result<&Arc<MessageClass>, FeatureError> {
        self.entry(version)?
            .events
            .get(&event_index)
            .ok_or(FeatureError::UnknownEventIndex {
                feature_id: self.feature_id(),
                version,
                index: event_index,
            })
    }

    fn function(&self, version: u8, index: u8) -> Result<&FunctionClasses, FeatureError> {
        self.entry(version)?
            .functions
            .get(&index)
            .ok_or(FeatureError::UnknownFunctionIndex {
                feature_id: self.feature_id(),
                version,
                index,
            })
    }

    /// Frame class by declared name
    pub fn class(&self, name: &str) -> Option<&Arc<MessageClass>> {
        self.by_name.get(name).map(|&i| &self.classes[i])
    }

    /// Every frame class, in declaration order
    pub fn classes(&self) -> &[Arc<MessageClass>] {
        &self.classes
    }
}

fn invalid(decl: &FeatureDecl, reason: impl fmt::Display) -> FeatureError {
    FeatureError::InvalidModel(format!("{} (0x{:04X}): {}", decl.name, decl.feature_id, reason))
}

fn lookup(
    decl: &FeatureDecl,
    classes: &[Arc<MessageClass>],
    by_name: &HashMap<&'static str, usize>,
    name: &str,
    msg_type: MessageType,
    index: u8,
) -> Result<Arc<MessageClass>, FeatureError> {
    let class = by_name
        .get(name)
        .map(|&i| &classes[i])
        .ok_or_else(|| invalid(decl, format!("no frame named {name}")))?;
    if class.msg_type() != msg_type {
        return Err(invalid(
            decl,
            format!("{name} is a {}, expected a {msg_type}", class.msg_type()),
        ));
    }
    if class.index() != index {
        return Err(invalid(
            decl,
            format!("{name} has index {}, bound at {index}", class.index()),
        ));
    }
    Ok(class.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hidpp_codec::{FieldDecl, FrameSize};

    const FRAMES: &[FrameDecl] = &[
        FrameDecl::request("Ping", 0, FrameSize::Short, &[]),
        FrameDecl::response("PingResponse", 0, "Ping", &[FieldDecl::uint("echo", 8)], &[0, 1]),
        FrameDecl::request("Reset", 1, FrameSize::Short, &[]),
        FrameDecl::response("ResetResponse", 1, "Reset", &[], &[1]),
        FrameDecl::event("Tick", 0, &[FieldDecl::uint("count", 16)], &[0, 1]),
    ];

    const PING: FeatureDecl = FeatureDecl {
        name: "Ping",
        feature_id: 0x1234,
        functions: &[(0, "ping"), (1, "reset")],
        events: &[(0, "tick")],
        frames: FRAMES,
        versions: &[
            VersionDecl {
                version: 0,
                max_function_index: 0,
                functions: &[FunctionBinding::new(0, "Ping", "PingResponse")],
                events: &[EventBinding::new(0, "Tick")],
            },
            VersionDecl {
                version: 1,
                max_function_index: 1,
                functions: &[FunctionBinding::new(1, "Reset", "ResetResponse")],
                events: &[],
            },
        ],
    };

    const GAP: FeatureDecl = FeatureDecl {
        versions: &[
            VersionDecl {
                version: 0,
                max_function_index: 0,
                functions: &[FunctionBinding::new(0, "Ping", "PingResponse")],
                events: &[EventBinding::new(0, "Tick")],
            },
            VersionDecl {
                version: 2,
                max_function_index: 1,
                functions: &[FunctionBinding::new(1, "Reset", "ResetResponse")],
                events: &[],
            },
        ],
        ..PING
    };

    const WRONG_VERSIONS: FeatureDecl = FeatureDecl {
        versions: &[VersionDecl {
            version: 0,
            max_function_index: 1,
            functions: &[
                FunctionBinding::new(0, "Ping", "PingResponse"),
                FunctionBinding::new(1, "Reset", "ResetResponse"),
            ],
            events: &[EventBinding::new(0, "Tick")],
        }],
        ..PING
    };

    const OVER_MAX: FeatureDecl = FeatureDecl {
        versions: &[VersionDecl {
            version: 0,
            max_function_index: 0,
            functions: &[
                FunctionBinding::new(0, "Ping", "PingResponse"),
                FunctionBinding::new(1, "Reset", "ResetResponse"),
            ],
            events: &[],
        }],
        ..PING
    };

    #[test]
    fn test_model_merges_deltas() {
        let model = FeatureModel::build(&PING).unwrap();
        assert_eq!(model.versions().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(model.get_request_cls(1, 0).unwrap().name(), "Ping");
        assert_eq!(model.get_response_cls(1, 1).unwrap().name(), "ResetResponse");
        assert_eq!(model.get_report_cls(1, 0).unwrap().name(), "Tick");
        assert_eq!(model.get_main_cls(1).unwrap().name(), "PingV1");
        assert_eq!(model.get_base_cls().max_function_index(0), Some(0));
        assert_eq!(model.get_base_cls().max_function_index(1), Some(1));
    }

    #[test]
    fn test_model_lookup_errors() {
        let model = FeatureModel::build(&PING).unwrap();
        assert!(matches!(
            model.get_main_cls(2),
            Err(FeatureError::UnknownVersion { version: 2, .. })
        ));
        assert!(matches!(
            model.get_request_cls(0, 1),
            Err(FeatureError::UnknownFunctionIndex { index: 1, .. })
        ));
        assert!(matches!(
            model.get_report_cls(0, 3),
            Err(FeatureError::UnknownEventIndex { index: 3, .. })
        ));
        assert!(model.get_request_cls(0, 1).unwrap_err().is_key_error());
    }

    #[test]
    fn test_model_rejects_version_gap() {
        assert!(matches!(
            FeatureModel::build(&GAP),
            Err(FeatureError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_model_rejects_version_tuple_mismatch() {
        // ResetResponse declares (1) but would be bound in (0)
        assert!(matches!(
            FeatureModel::build(&WRONG_VERSIONS),
            Err(FeatureError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_model_rejects_binding_above_max() {
        assert!(matches!(
            FeatureModel::build(&OVER_MAX),
            Err(FeatureError::InvalidModel(_))
        ));
    }
}
