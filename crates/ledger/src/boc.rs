//! Minimal read-only bag-of-cells reader.
//!
//! Covers exactly what the RPC layer needs: parsing a single-root BoC
//! returned by a get-method and extracting a `MsgAddress` from the root
//! cell. Message construction is the signer's concern and never
//! happens on this side of the boundary.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::address::Address;

const BOC_MAGIC: u32 = 0xb5ee_9c72;

/// Errors from BoC parsing.
#[derive(Debug, thiserror::Error)]
pub enum BocError {
    #[error("bad bag-of-cells magic 0x{0:08x}")]
    Magic(u32),

    #[error("malformed bag of cells: {0}")]
    Malformed(String),

    #[error("bag of cells is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A parsed cell: raw data bits plus references into the arena.
#[derive(Debug, Clone)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
}

impl Cell {
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn refs(&self) -> &[usize] {
        &self.refs
    }

    pub fn slice(&self) -> CellSlice<'_> {
        CellSlice {
            data: &self.data,
            bit_len: self.bit_len,
            pos: 0,
        }
    }
}

/// A parsed bag of cells.
#[derive(Debug)]
pub struct Boc {
    cells: Vec<Cell>,
    root: usize,
}

impl Boc {
    /// Parses a standard-base64 BoC as returned by toncenter.
    pub fn parse_base64(encoded: &str) -> Result<Self, BocError> {
        Self::parse(&STANDARD.decode(encoded.trim())?)
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, BocError> {
        let mut pos = 0;

        let m = take(bytes, &mut pos, 4)?;
        let magic = u32::from_be_bytes([m[0], m[1], m[2], m[3]]);
        if magic != BOC_MAGIC {
            return Err(BocError::Magic(magic));
        }

        let flags = take(bytes, &mut pos, 1)?[0];
        let has_index = flags & 0x80 != 0;
        let ref_size = (flags & 0x07) as usize;
        let off_size = take(bytes, &mut pos, 1)?[0] as usize;
        if !(1..=4).contains(&ref_size) || !(1..=8).contains(&off_size) {
            return Err(BocError::Malformed(format!(
                "ref size {ref_size} / offset size {off_size} out of range"
            )));
        }

        let cell_count = read_be(bytes, &mut pos, ref_size)?;
        let root_count = read_be(bytes, &mut pos, ref_size)?;
        let _absent = read_be(bytes, &mut pos, ref_size)?;
        let _total_size = read_be(bytes, &mut pos, off_size)?;

        if root_count == 0 {
            return Err(BocError::Malformed("no root cell".into()));
        }
        let root = read_be(bytes, &mut pos, ref_size)?;
        for _ in 1..root_count {
            read_be(bytes, &mut pos, ref_size)?;
        }
        if root >= cell_count {
            return Err(BocError::Malformed(format!(
                "root index {root} out of range ({cell_count} cells)"
            )));
        }

        if has_index {
            take(bytes, &mut pos, cell_count * off_size)?;
        }

        let mut cells = Vec::with_capacity(cell_count);
        for i in 0..cell_count {
            cells.push(parse_cell(bytes, &mut pos, ref_size, cell_count, i)?);
        }

        // Trailing CRC (if flagged) is ignored.
        Ok(Self { cells, root })
    }

    pub fn root(&self) -> &Cell {
        &self.cells[self.root]
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }
}

fn parse_cell(
    bytes: &[u8],
    pos: &mut usize,
    ref_size: usize,
    cell_count: usize,
    index: usize,
) -> Result<Cell, BocError> {
    let d1 = take(bytes, pos, 1)?[0];
    let ref_count = (d1 & 0x07) as usize;
    if ref_count > 4 {
        return Err(BocError::Malformed(format!(
            "cell {index}: {ref_count} references"
        )));
    }

    let d2 = take(bytes, pos, 1)?[0] as usize;
    let data_bytes = d2.div_ceil(2);
    let data = take(bytes, pos, data_bytes)?.to_vec();

    let bit_len = if d2 % 2 == 0 {
        data_bytes * 8
    } else {
        // Odd descriptor: the last byte carries a completion tag.
        let last = *data
            .last()
            .ok_or_else(|| BocError::Malformed(format!("cell {index}: empty padded cell")))?;
        if last == 0 {
            return Err(BocError::Malformed(format!(
                "cell {index}: missing completion tag"
            )));
        }
        data_bytes * 8 - last.trailing_zeros() as usize - 1
    };

    let mut refs = Vec::with_capacity(ref_count);
    for _ in 0..ref_count {
        let target = read_be(bytes, pos, ref_size)?;
        if target >= cell_count {
            return Err(BocError::Malformed(format!(
                "cell {index}: reference {target} out of range"
            )));
        }
        refs.push(target);
    }

    Ok(Cell {
        data,
        bit_len,
        refs,
    })
}

fn take<'a>(bytes: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8], BocError> {
    let end = pos
        .checked_add(len)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| BocError::Malformed(format!("truncated at byte {pos}")))?;
    let slice = &bytes[*pos..end];
    *pos = end;
    Ok(slice)
}

fn read_be(bytes: &[u8], pos: &mut usize, len: usize) -> Result<usize, BocError> {
    let slice = take(bytes, pos, len)?;
    let mut value = 0usize;
    for &b in slice {
        value = (value << 8) | b as usize;
    }
    Ok(value)
}

/// Bit-level cursor over a cell's data.
#[derive(Debug, Clone)]
pub struct CellSlice<'a> {
    data: &'a [u8],
    bit_len: usize,
    pos: usize,
}

impl CellSlice<'_> {
    pub fn remaining(&self) -> usize {
        self.bit_len - self.pos
    }

    pub fn load_bit(&mut self) -> Result<bool, BocError> {
        if self.pos >= self.bit_len {
            return Err(BocError::Malformed("cell slice underflow".into()));
        }
        let byte = self.data[self.pos / 8];
        let bit = byte >> (7 - self.pos % 8) & 1;
        self.pos += 1;
        Ok(bit == 1)
    }

    /// Loads up to 64 bits, MSB first.
    pub fn load_uint(&mut self, bits: usize) -> Result<u64, BocError> {
        debug_assert!(bits <= 64);
        let mut value = 0u64;
        for _ in 0..bits {
            value = (value << 1) | self.load_bit()? as u64;
        }
        Ok(value)
    }
}

/// Reads a `MsgAddress` from a cell slice.
///
/// Returns `None` for `addr_none`. Anycast and non-standard address
/// forms are rejected; get-methods on NFT contracts never return them.
pub fn read_msg_address(slice: &mut CellSlice<'_>) -> Result<Option<Address>, BocError> {
    match slice.load_uint(2)? {
        0b00 => Ok(None),
        0b10 => {
            if slice.load_bit()? {
                return Err(BocError::Malformed("anycast addresses unsupported".into()));
            }
            let workchain = slice.load_uint(8)? as u8 as i8;
            let mut hash = [0u8; 32];
            for byte in &mut hash {
                *byte = slice.load_uint(8)? as u8;
            }
            Ok(Some(Address::new(workchain, hash)))
        }
        tag => Err(BocError::Malformed(format!(
            "unsupported address tag 0b{tag:02b}"
        ))),
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    //! Hand-rolled single-cell BoC construction for parser tests.

    pub(crate) struct BitWriter {
        bits: Vec<bool>,
    }

    impl BitWriter {
        pub(crate) fn new() -> Self {
            Self { bits: Vec::new() }
        }

        pub(crate) fn push(&mut self, value: u64, bits: usize) {
            for i in (0..bits).rev() {
                self.bits.push(value >> i & 1 == 1);
            }
        }

        /// Serializes the bits as a single-root, single-cell BoC.
        pub(crate) fn into_boc(self) -> Vec<u8> {
            let bit_len = self.bits.len();
            let mut data = pack_bits(&self.bits);
            if bit_len % 8 != 0 {
                // Completion tag: one 1-bit then zero padding.
                let tag_pos = 7 - bit_len % 8;
                *data.last_mut().unwrap() |= 1 << tag_pos;
            }
            let d2 = bit_len / 8 + bit_len.div_ceil(8);

            let mut out = Vec::new();
            out.extend_from_slice(&super::BOC_MAGIC.to_be_bytes());
            out.push(0x01); // no index/crc, ref size 1
            out.push(0x01); // offset size 1
            out.push(1); // cells
            out.push(1); // roots
            out.push(0); // absent
            out.push(2 + data.len() as u8); // total cell bytes
            out.push(0); // root index
            out.push(0); // d1: no refs, ordinary
            out.push(d2 as u8);
            out.extend_from_slice(&data);
            out
        }
    }

    fn pack_bits(bits: &[bool]) -> Vec<u8> {
        let mut bytes = vec![0u8; bits.len().div_ceil(8)];
        for (i, &bit) in bits.iter().enumerate() {
            if bit {
                bytes[i / 8] |= 1 << (7 - i % 8);
            }
        }
        bytes
    }

    /// BoC whose root cell holds `addr_std` for the given account.
    pub(crate) fn addr_std_boc(workchain: i8, hash: [u8; 32]) -> Vec<u8> {
        let mut w = BitWriter::new();
        w.push(0b10, 2); // addr_std
        w.push(0, 1); // no anycast
        w.push(workchain as u8 as u64, 8);
        for byte in hash {
            w.push(byte as u64, 8);
        }
        w.into_boc()
    }
}
