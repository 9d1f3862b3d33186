//! MSB-first bit stream used to pack and unpack record fields

/// Appends right-aligned values to a growing byte buffer
#[derive(Debug, Default)]
pub(crate) struct BitWriter {
    bytes: Vec<u8>,
    bits: usize,
}

impl BitWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append the low `width` bits of `data`; `data` must hold at least `width` bits
    pub(crate) fn write(&mut self, data: &[u8], width: usize) {
        let total = data.len() * 8;
        debug_assert!(total >= width);
        if self.bits % 8 == 0 && width % 8 == 0 {
            self.bytes.extend_from_slice(&data[data.len() - width / 8..]);
            self.bits += width;
            return;
        }
        for i in (total - width)..total {
            let bit = (data[i / 8] >> (7 - i % 8)) & 1;
            self.push_bit(bit);
        }
    }

    fn push_bit(&mut self, bit: u8) {
        if self.bits % 8 == 0 {
            self.bytes.push(0);
        }
        if bit != 0 {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 1 << (7 - self.bits % 8);
        }
        self.bits += 1;
    }

    pub(crate) fn bit_len(&self) -> usize {
        self.bits
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Reads right-aligned values from a byte slice
#[derive(Debug)]
pub(crate) struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    /// Next `width` bits, right-aligned in `width.div_ceil(8)` bytes
    pub(crate) fn read(&mut self, width: usize) -> Option<Vec<u8>> {
        if width > self.remaining() {
            return None;
        }
        if self.pos % 8 == 0 && width % 8 == 0 {
            let start = self.pos / 8;
            self.pos += width;
            return Some(self.data[start..start + width / 8].to_vec());
        }
        let mut out = vec![0u8; width.div_ceil(8)];
        let lead = out.len() * 8 - width;
        for i in 0..width {
            let src = self.pos + i;
            if (self.data[src / 8] >> (7 - src % 8)) & 1 != 0 {
                let dst = lead + i;
                out[dst / 8] |= 1 << (7 - dst % 8);
            }
        }
        self.pos += width;
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_byte_packing_msb_first() {
        // reserved 6, change requested 1, desired state 1
        let mut writer = BitWriter::new();
        writer.write(&[0x00], 6);
        writer.write(&[0x01], 1);
        writer.write(&[0x00], 1);
        writer.write(&[0x00, 0x00], 16);
        assert_eq!(writer.bit_len(), 24);
        assert_eq!(writer.into_bytes(), vec![0x02, 0x00, 0x00]);
    }

    #[test]
    fn test_unaligned_multi_byte() {
        let mut writer = BitWriter::new();
        writer.write(&[0x0A], 4);
        writer.write(&[0x0B, 0xCD], 12);
        assert_eq!(writer.into_bytes(), vec![0xAB, 0xCD]);

        let data = [0xAB, 0xCD];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read(4), Some(vec![0x0A]));
        assert_eq!(reader.read(12), Some(vec![0x0B, 0xCD]));
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.read(1), None);
    }

    #[test]
    fn test_aligned_fast_path() {
        let data = [0x11, 0x22, 0x33];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read(8), Some(vec![0x11]));
        assert_eq!(reader.read(16), Some(vec![0x22, 0x33]));
        assert_eq!(reader.position(), 24);
    }
}
