// Per-version frame size validation
// Requests fit a short (24-bit) or long (128-bit) payload, responses and events a long one

use std::fmt;

use hidpp_codec::{FrameSize, MessageType};
use tracing::debug;

use super::model::{FeatureDescriptor, Packet};
use super::names::CommonName;
use crate::error::DescriptorError;

/// Size of one frame in one version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    pub name: String,
    pub msg_type: MessageType,
    pub index: u8,
    pub bits: u32,
    /// Smallest frame that holds the payload, long when nothing does
    pub size: FrameSize,
}

impl FrameReport {
    fn new(name: String, msg_type: MessageType, index: u8, packet: &Packet, version: u8) -> Self {
        let bits = packet.bit_size(version);
        let size = match msg_type {
            MessageType::Request if bits <= payload_limit(FrameSize::Short) => FrameSize::Short,
            _ => FrameSize::Long,
        };
        Self {
            name,
            msg_type,
            index,
            bits,
            size,
        }
    }

    pub fn limit(&self) -> u32 {
        payload_limit(self.size)
    }

    pub fn fits(&self) -> bool {
        self.bits <= self.limit()
    }

    /// Padding bits the frame adds after the payload
    pub fn padding_bits(&self) -> u32 {
        self.limit().saturating_sub(self.bits)
    }
}

impl fmt::Display for FrameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<8} {:>2} {:<40} {:>3}/{:<3} bits ({})",
            self.msg_type.to_string(),
            self.index,
            self.name,
            self.bits,
            self.limit(),
            self.size
        )?;
        if !self.fits() {
            f.write_str(" OVERSIZE")?;
        }
        Ok(())
    }
}

fn payload_limit(size: FrameSize) -> u32 {
    // payload_bits is at most 128
    size.payload_bits() as u32
}

/// Frame sizes of every applicable function and event in one version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeReport {
    pub version: u8,
    pub frames: Vec<FrameReport>,
}

impl SizeReport {
    pub fn is_valid(&self) -> bool {
        self.frames.iter().all(FrameReport::fits)
    }

    pub fn oversized(&self) -> impl Iterator<Item = &FrameReport> {
        self.frames.iter().filter(|frame| !frame.fits())
    }
}

impl fmt::Display for SizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Version {}:", self.version)?;
        for frame in &self.frames {
            writeln!(f, "  {frame}")?;
        }
        Ok(())
    }
}

/// Checks that every declared version of a descriptor fits HID++ frames
pub struct SizeValidator<'d> {
    descriptor: &'d FeatureDescriptor,
}

impl<'d> SizeValidator<'d> {
    pub fn new(descriptor: &'d FeatureDescriptor) -> Self {
        Self { descriptor }
    }

    /// Report for one version
    pub fn report(&self, version: u8) -> Result<SizeReport, DescriptorError> {
        if !self.descriptor.has_version(version) {
            return Err(DescriptorError::UnknownVersion(version));
        }
        let mut frames = Vec::new();
        for function in self.descriptor.functions_for(version) {
            let title = function.get_name_title(true);
            frames.push(FrameReport::new(
                title.clone(),
                MessageType::Request,
                function.index,
                &function.request,
                version,
            ));
            frames.push(FrameReport::new(
                format!("{title}Response"),
                MessageType::Response,
                function.index,
                &function.response,
                version,
            ));
        }
        for event in self.descriptor.events_for(version) {
            frames.push(FrameReport::new(
                event_class_name(&event.get_name_title(true)),
                MessageType::Event,
                event.index,
                &event.event,
                version,
            ));
        }
        Ok(SizeReport { version, frames })
    }

    /// Reports for every declared version
    pub fn reports(&self) -> Result<Vec<SizeReport>, DescriptorError> {
        self.descriptor
            .versions
            .iter()
            .map(|&version| self.report(version))
            .collect()
    }

    /// Reports for every declared version, failing on the first oversize frame
    pub fn validate(&self) -> Result<Vec<SizeReport>, DescriptorError> {
        let reports = self.reports()?;
        for report in &reports {
            if let Some(frame) = report.oversized().next() {
                return Err(DescriptorError::Oversize {
                    frame: frame.name.clone(),
                    version: report.version,
                    bits: frame.bits,
                    limit: frame.limit(),
                });
            }
            debug!(
                feature = %self.descriptor.name,
                version = report.version,
                frames = report.frames.len(),
                "frame sizes valid"
            );
        }
        Ok(reports)
    }
}

/// `KeyboardMode` -> `KeyboardModeEvent`
pub(crate) fn event_class_name(title: &str) -> String {
    if title.ends_with("Event") {
        title.to_string()
    } else {
        format!("{title}Event")
    }
}
