// Descriptor -> message class regeneration
// Builds the runtime frame classes of one feature version straight from its descriptor

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use hidpp_codec::message::{fid, PROLOGUE_NAMES};
use hidpp_codec::{
    stock_field, ClassInfo, Field, FieldKind, FrameSize, MessageClass, MessageType,
};
use tracing::{debug, trace, warn};

use super::model::{
    CommonParameter, FeatureDescriptor, Packet, SettingValue, HEX_LIST_DATA_TYPE,
    RESERVED_DATA_TYPE,
};
use super::names::CommonName;
use super::validate::event_class_name;
use crate::error::DescriptorError;

/// Every frame class of one feature version
#[derive(Debug, Clone)]
pub struct FeatureLayout {
    pub feature_id: u16,
    pub name: String,
    pub version: u8,
    pub classes: Vec<Arc<MessageClass>>,
}

impl FeatureLayout {
    /// Class by generated name
    pub fn find(&self, name: &str) -> Option<&Arc<MessageClass>> {
        self.classes.iter().find(|class| class.name() == name)
    }

    pub fn of_type(&self, msg_type: MessageType) -> impl Iterator<Item = &Arc<MessageClass>> {
        self.classes
            .iter()
            .filter(move |class| class.msg_type() == msg_type)
    }

    /// Response class answering function `index`
    pub fn response(&self, index: u8) -> Option<&Arc<MessageClass>> {
        self.of_type(MessageType::Response)
            .find(|class| class.index() == index)
    }

    /// Event class at `index`
    pub fn event(&self, index: u8) -> Option<&Arc<MessageClass>> {
        self.of_type(MessageType::Event)
            .find(|class| class.index() == index)
    }
}

impl fmt::Display for FeatureLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} (0x{:04X}) version {}",
            self.name, self.feature_id, self.version
        )?;
        for class in &self.classes {
            writeln!(f, "  {class}")?;
            for field in class.payload().fields() {
                writeln!(f, "    {:>3} bits  {}", field.length(), field.summary())?;
            }
            if class.padding_len() > 0 {
                writeln!(f, "    {:>3} bits  Padding", class.padding_len() * 8)?;
            }
        }
        Ok(())
    }
}

/// Build the message classes of `descriptor` at `version`
pub fn regenerate(
    descriptor: &FeatureDescriptor,
    version: u8,
) -> Result<FeatureLayout, DescriptorError> {
    if !descriptor.has_version(version) {
        return Err(DescriptorError::UnknownVersion(version));
    }

    let mut classes = Vec::new();
    for function in descriptor.functions_for(version) {
        let title = function.get_name_title(true);

        let size = request_size(&function.request, version);
        let mut info = ClassInfo::new(
            title.clone(),
            descriptor.feature_id,
            MessageType::Request,
            function.index,
        );
        info.size = size;
        info.versions = vec![version];
        classes.push(build_class(info, &function.request, version)?);

        let mut info = ClassInfo::new(
            format!("{title}Response"),
            descriptor.feature_id,
            MessageType::Response,
            function.index,
        );
        info.versions = vec![version];
        info.request_list = vec![title];
        classes.push(build_class(info, &function.response, version)?);
    }

    for event in descriptor.events_for(version) {
        let mut info = ClassInfo::new(
            event_class_name(&event.get_name_title(true)),
            descriptor.feature_id,
            MessageType::Event,
            event.index,
        );
        info.versions = vec![version];
        classes.push(build_class(info, &event.event, version)?);
    }

    debug!(
        feature = %descriptor.name,
        version,
        classes = classes.len(),
        "regenerated feature layout"
    );
    Ok(FeatureLayout {
        feature_id: descriptor.feature_id,
        name: descriptor.title(),
        version,
        classes,
    })
}

/// Short when the payload fits, unless a long base is requested
fn request_size(packet: &Packet, version: u8) -> FrameSize {
    let forced_long = packet
        .base
        .as_deref()
        .is_some_and(|base| base.starts_with("Long"));
    let short_bits = FrameSize::Short.payload_bits() as u32;
    if !forced_long && packet.bit_size(version) <= short_bits {
        FrameSize::Short
    } else {
        FrameSize::Long
    }
}

fn build_class(
    info: ClassInfo,
    packet: &Packet,
    version: u8,
) -> Result<Arc<MessageClass>, DescriptorError> {
    let mut fields = FieldBuilder::new(&info.name);
    for param in packet.parameters_for(version) {
        if param.has_sub_parameters() {
            for sub in param
                .sub_parameters
                .iter()
                .filter(|sub| sub.is_given_version_present(version))
            {
                let name = match sub.prefix.as_deref() {
                    Some(prefix) if !prefix.is_empty() => format!(
                        "{}_{}",
                        prefix.to_lowercase(),
                        sub.get_name_lower_underscore(true)
                    ),
                    _ => sub.get_name_lower_underscore(true),
                };
                fields.push(
                    &name,
                    sub.size,
                    field_kind(sub.data_type()),
                    sub.default_value.as_ref(),
                )?;
            }
        } else {
            let bits = param.get_size(version);
            let bits = u16::try_from(bits).map_err(|_| DescriptorError::Oversize {
                frame: info.name.clone(),
                version,
                bits,
                limit: FrameSize::Long.payload_bits() as u32,
            })?;
            fields.push(
                &param.get_name_lower_underscore_with_prefix(true),
                bits,
                field_kind(param.data_type()),
                param.default_value.as_ref(),
            )?;
        }
    }
    let fields = fields.finish();
    let class = MessageClass::new(info, fields)?;
    trace!(class = class.name(), bits = class.payload().bit_length(), "built class");
    Ok(Arc::new(class))
}

fn field_kind(data_type: &str) -> FieldKind {
    match data_type {
        RESERVED_DATA_TYPE => FieldKind::Reserved,
        HEX_LIST_DATA_TYPE => FieldKind::Raw,
        other if other.eq_ignore_ascii_case("str") || other.eq_ignore_ascii_case("ascii") => {
            FieldKind::Ascii
        }
        _ => FieldKind::Uint,
    }
}

/// Accumulates payload fields with descending ids and unique names
struct FieldBuilder<'a> {
    class: &'a str,
    next_fid: u8,
    names: HashSet<String>,
    fields: Vec<Field>,
}

impl<'a> FieldBuilder<'a> {
    fn new(class: &'a str) -> Self {
        Self {
            class,
            next_fid: fid::FIRST_PAYLOAD,
            names: PROLOGUE_NAMES.iter().map(|name| name.to_string()).collect(),
            fields: Vec::new(),
        }
    }

    fn push(
        &mut self,
        name: &str,
        bits: u16,
        kind: FieldKind,
        default: Option<&SettingValue>,
    ) -> Result<(), DescriptorError> {
        if bits == 0 {
            warn!(class = self.class, field = name, "skipping zero-width field");
            return Ok(());
        }
        let name = self.unique_name(name);
        let default = match (kind, default.and_then(SettingValue::as_int)) {
            (_, Some(value)) => Some(u64::try_from(value).map_err(|_| {
                DescriptorError::Validation(format!(
                    "{}: negative default {value} for {name}",
                    self.class
                ))
            })?),
            (FieldKind::Reserved, None) => Some(0),
            _ => None,
        };
        let field = stock_field(self.next_fid, &name, bits, kind, default)?;
        self.next_fid = self.next_fid.checked_sub(1).ok_or_else(|| {
            DescriptorError::Validation(format!("{}: too many fields", self.class))
        })?;
        self.fields.push(field);
        Ok(())
    }

    /// Suffix repeated names (`reserved`, `reserved_2`, ...)
    fn unique_name(&mut self, name: &str) -> String {
        let base = if name.is_empty() { "field" } else { name };
        if self.names.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}_{n}");
            if self.names.insert(candidate.clone()) {
                warn!(class = self.class, field = base, renamed = %candidate, "renamed clashing field");
                return candidate;
            }
            n += 1;
        }
    }

    fn finish(self) -> Vec<Field> {
        self.fields
    }
}
