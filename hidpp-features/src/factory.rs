//! Factory binding a feature version's classes to named interface attributes

use std::fmt;
use std::sync::Arc;

use hidpp_codec::{Message, MessageClass, Prologue, DEFAULT_SOFTWARE_ID};
use tracing::{debug, trace};

use crate::error::FeatureError;
use crate::model::{FeatureDecl, FeatureModel, MainClass};

/// `<function>_cls`
pub fn request_attribute(function: &str) -> String {
    format!("{function}_cls")
}

/// `<function>_response_cls`
pub fn response_attribute(function: &str) -> String {
    format!("{function}_response_cls")
}

/// `<event>_event_cls`
pub fn event_attribute(event: &str) -> String {
    format!("{event}_event_cls")
}

// =============================================================================
// Interface descriptor
// =============================================================================

/// Attribute names every product of a feature exposes, bound or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    feature: &'static str,
    attributes: Vec<String>,
}

impl Interface {
    pub fn of(decl: &FeatureDecl) -> Self {
        let mut attributes = Vec::with_capacity(decl.functions.len() * 2 + decl.events.len());
        for (_, function) in decl.functions {
            attributes.push(request_attribute(function));
            attributes.push(response_attribute(function));
        }
        for (_, event) in decl.events {
            attributes.push(event_attribute(event));
        }
        Self {
            feature: decl.name,
            attributes,
        }
    }

    pub fn feature(&self) -> &'static str {
        self.feature
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.attributes.iter().any(|a| a == attribute)
    }
}

// =============================================================================
// Factory
// =============================================================================

/// Creates feature objects from a model
#[derive(Debug, Clone)]
pub struct FeatureFactory {
    model: Arc<FeatureModel>,
}

impl FeatureFactory {
    pub fn new(model: Arc<FeatureModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &Arc<FeatureModel> {
        &self.model
    }

    pub fn interface(&self) -> Interface {
        Interface::of(self.model.decl())
    }

    /// Feature object for exactly `version`; there is no fallback to a lower one
    pub fn create(&self, version: u8) -> Result<Feature, FeatureError> {
        let main = self.model.get_main_cls(version)?.clone();
        let decl = self.model.decl();
        let mut bindings = Vec::with_capacity(decl.functions.len() * 2 + decl.events.len());

        for (index, function) in decl.functions {
            bindings.push((
                request_attribute(function),
                optional(self.model.get_request_cls(version, *index))?,
            ));
            bindings.push((
                response_attribute(function),
                optional(self.model.get_response_cls(version, *index))?,
            ));
        }
        for (index, event) in decl.events {
            bindings.push((
                event_attribute(event),
                optional(self.model.get_report_cls(version, *index))?,
            ));
        }

        debug!(
            class = main.name(),
            bound = bindings.iter().filter(|(_, c)| c.is_some()).count(),
            unbound = bindings.iter().filter(|(_, c)| c.is_none()).count(),
            "created feature"
        );
        Ok(Feature {
            model: self.model.clone(),
            main,
            bindings,
        })
    }
}

/// Index misses leave the attribute unbound
fn optional(
    lookup: Result<&Arc<MessageClass>, FeatureError>,
) -> Result<Option<Arc<MessageClass>>, FeatureError> {
    match lookup {
        Ok(class) => Ok(Some(class.clone())),
        Err(e) if e.is_key_error() => Ok(None),
        Err(e) => Err(e),
    }
}

// =============================================================================
// Feature object
// =============================================================================

/// Product of [`FeatureFactory::create`], immutable after construction
#[derive(Debug, Clone)]
pub struct Feature {
    model: Arc<FeatureModel>,
    main: Arc<MainClass>,
    bindings: Vec<(String, Option<Arc<MessageClass>>)>,
}

impl Feature {
    pub fn model(&self) -> &Arc<FeatureModel> {
        &self.model
    }

    pub fn main_cls(&self) -> &Arc<MainClass> {
        &self.main
    }

    pub fn name(&self) -> &str {
        self.main.name()
    }

    pub fn feature_id(&self) -> u16 {
        self.main.feature_id()
    }

    pub fn version(&self) -> u8 {
        self.main.version()
    }

    pub fn max_function_index(&self) -> u8 {
        self.main.max_function_index()
    }

    /// Bound class of an interface attribute
    pub fn attribute(&self, name: &str) -> Result<&Arc<MessageClass>, FeatureError> {
        match self.bindings.iter().find(|(attr, _)| attr == name) {
            Some((_, Some(class))) => Ok(class),
            Some((_, None)) => Err(FeatureError::NotImplemented {
                feature: self.main.name().to_string(),
                attribute: name.to_string(),
            }),
            None => Err(FeatureError::UnknownAttribute {
                feature: self.main.name().to_string(),
                attribute: name.to_string(),
            }),
        }
    }

    /// Present and bound
    pub fn is_bound(&self, name: &str) -> bool {
        self.attribute(name).is_ok()
    }

    /// Every interface attribute in declaration order, `None` when unbound
    pub fn attributes(&self) -> impl Iterator<Item = (&str, Option<&Arc<MessageClass>>)> {
        self.bindings
            .iter()
            .map(|(name, class)| (name.as_str(), class.as_ref()))
    }

    pub fn request_cls(&self, function: &str) -> Result<&Arc<MessageClass>, FeatureError> {
        self.attribute(&request_attribute(function))
    }

    pub fn response_cls(&self, function: &str) -> Result<&Arc<MessageClass>, FeatureError> {
        self.attribute(&response_attribute(function))
    }

    pub fn event_cls(&self, event: &str) -> Result<&Arc<MessageClass>, FeatureError> {
        self.attribute(&event_attribute(event))
    }

    /// Request frame of `function` with its payload at defaults
    pub fn request(
        &self,
        function: &str,
        device_index: u8,
        feature_index: u8,
    ) -> Result<Message, FeatureError> {
        Ok(Message::new(
            self.request_cls(function)?.clone(),
            device_index,
            feature_index,
        ))
    }

    /// Parse an incoming frame through the class bound at its index
    ///
    /// A frame carrying the reserved software id is taken as an event when
    /// one is bound at that index, otherwise as a response.
    pub fn decode(&self, data: &[u8]) -> Result<Message, FeatureError> {
        let prologue = Prologue::parse(data)?;
        let index = prologue.function_index();
        let version = self.version();
        let event = match prologue.software_id() {
            DEFAULT_SOFTWARE_ID => self.model.get_report_cls(version, index).ok(),
            _ => None,
        };
        let class = match event {
            Some(class) => class,
            None => self.model.get_response_cls(version, index)?,
        };
        trace!(feature = self.name(), class = class.name(), "dispatching frame");
        Ok(Message::from_bytes(class.clone(), data)?)
    }
}

impl PartialEq for Feature {
    fn eq(&self, other: &Self) -> bool {
        self.main == other.main
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.main)?;
        for (name, class) in self.attributes() {
            match class {
                Some(class) => writeln!(f, "  {name} = {}", class.name())?,
                None => writeln!(f, "  {name} = None")?,
            }
        }
        Ok(())
    }
}

/// Typed wrapper exposing one accessor per interface attribute
macro_rules! typed_feature {
    ($(#[$meta:meta])* $wrapper:ident, $decl:ident, [$($attr:ident),* $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $wrapper($crate::factory::Feature);

        impl $wrapper {
            /// Wrap a product of this feature's factory
            pub fn new(
                feature: $crate::factory::Feature,
            ) -> Result<Self, $crate::error::FeatureError> {
                if feature.feature_id() != $decl.feature_id {
                    return Err($crate::error::FeatureError::InvalidModel(format!(
                        "{} is not {}",
                        feature.name(),
                        $decl.name
                    )));
                }
                Ok(Self(feature))
            }

            /// Create from the global registry
            pub fn create(version: u8) -> Result<Self, $crate::error::FeatureError> {
                Self::new($crate::registry::feature_registry()?.create($decl.feature_id, version)?)
            }

            pub fn into_inner(self) -> $crate::factory::Feature {
                self.0
            }

            $(
                pub fn $attr(
                    &self,
                ) -> Result<&std::sync::Arc<hidpp_codec::MessageClass>, $crate::error::FeatureError> {
                    self.0.attribute(stringify!($attr))
                }
            )*
        }

        impl std::ops::Deref for $wrapper {
            type Target = $crate::factory::Feature;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
    };
}

pub(crate) use typed_feature;
