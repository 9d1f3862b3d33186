// Identifier shaping from human-readable names
// "Battery Source Mask Bit Map" -> battery_source, BATTERY_SOURCE, BatterySource

/// Name helpers shared by every named descriptor node
///
/// `strip_bit_map` drops a trailing "Mask Bit Map" / "Bit Map" for compactness.
pub trait CommonName {
    fn name(&self) -> &str;

    fn get_name(&self, strip_bit_map: bool) -> String {
        let value = self.name().to_string();
        if strip_bit_map {
            value.replace("Mask Bit Map", "").replace(" Bit Map", "")
        } else {
            value
        }
    }

    fn get_name_lower_underscore(&self, strip_bit_map: bool) -> String {
        let value = words(self.name()).join("_").to_lowercase();
        if strip_bit_map {
            value.replace("_mask_bit_map", "").replace("_bit_map", "")
        } else {
            value
        }
    }

    fn get_name_upper_underscore(&self, strip_bit_map: bool) -> String {
        let value = words(self.name()).join("_").to_uppercase();
        if strip_bit_map {
            value.replace("_MASK_BIT_MAP", "").replace("_BIT_MAP", "")
        } else {
            value
        }
    }

    fn get_name_without_space(&self, strip_bit_map: bool) -> String {
        let value = words(self.name()).concat();
        if strip_bit_map {
            value.replace("MaskBitMap", "").replace("BitMap", "")
        } else {
            value
        }
    }

    /// "eQuad Id" -> "EquadId", "BLE HD" -> "BleHd"
    fn get_name_title(&self, strip_bit_map: bool) -> String {
        let value: String = words(self.name()).iter().map(|w| capitalize(w)).collect();
        if strip_bit_map {
            value.replace("MaskBitMap", "").replace("BitMap", "")
        } else {
            value
        }
    }
}

fn words(name: &str) -> Vec<&str> {
    name.split_whitespace().collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

impl CommonName for str {
    fn name(&self) -> &str {
        self
    }
}

impl CommonName for String {
    fn name(&self) -> &str {
        self
    }
}
