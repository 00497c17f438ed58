//! WebSocket frame codec.
//!
//! Pure encoding and decoding of RFC 6455 frames. Nothing here performs I/O;
//! the connection feeds byte buffers in and takes frames out.
//!
//! # Wire Layout
//!
//! ```text
//!  0               1               2               3
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |            (16/64)            |
//! |N|V|V|V|       |S|             |                               |
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |                 Masking-key (0 or 4 bytes)                    |
//! +---------------------------------------------------------------+
//! |                         Payload Data                          |
//! +---------------------------------------------------------------+
//! ```

// ============================================================================
// Constants
// ============================================================================

/// FIN bit of the first header byte.
const FIN_BIT: u8 = 0x80;

/// MASK bit of the second header byte.
const MASK_BIT: u8 = 0x80;

/// Largest payload length that fits the 7-bit length field.
const MAX_SHORT_LEN: usize = 125;

/// Length marker announcing a 16-bit extended length.
const LEN_MARKER_16: u8 = 126;

/// Length marker announcing a 64-bit extended length.
const LEN_MARKER_64: u8 = 127;

/// Close status code for a normal closure.
pub const NORMAL_CLOSURE: u16 = 1000;

// ============================================================================
// Opcode
// ============================================================================

/// Frame opcode (low nibble of the first header byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Continuation of a fragmented message.
    Continuation,
    /// UTF-8 text payload.
    Text,
    /// Binary payload.
    Binary,
    /// Connection close.
    Close,
    /// Ping.
    Ping,
    /// Pong.
    Pong,
    /// Any opcode RFC 6455 leaves undefined.
    Reserved(u8),
}

impl Opcode {
    /// Decodes the opcode from a nibble. Upper bits are ignored.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x0F {
            0x0 => Self::Continuation,
            0x1 => Self::Text,
            0x2 => Self::Binary,
            0x8 => Self::Close,
            0x9 => Self::Ping,
            0xA => Self::Pong,
            other => Self::Reserved(other),
        }
    }

    /// Returns the wire nibble.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Continuation => 0x0,
            Self::Text => 0x1,
            Self::Binary => 0x2,
            Self::Close => 0x8,
            Self::Ping => 0x9,
            Self::Pong => 0xA,
            Self::Reserved(bits) => bits & 0x0F,
        }
    }

    /// Returns `true` for close, ping, pong and reserved control opcodes.
    #[inline]
    #[must_use]
    pub const fn is_control(self) -> bool {
        self.bits() & 0x08 != 0
    }
}

// ============================================================================
// FrameHeader
// ============================================================================

/// A decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Final fragment flag.
    pub fin: bool,
    /// Frame opcode.
    pub opcode: Opcode,
    /// Masking key, present when the MASK bit is set.
    pub mask: Option<[u8; 4]>,
    /// Payload length announced by the header.
    pub payload_len: u64,
    /// Bytes consumed by the header itself.
    pub header_len: usize,
}

impl FrameHeader {
    /// Returns `true` if the payload is masked.
    #[inline]
    #[must_use]
    pub const fn masked(&self) -> bool {
        self.mask.is_some()
    }

    /// Total frame size (header plus payload), if addressable.
    #[inline]
    #[must_use]
    pub fn frame_len(&self) -> Option<usize> {
        usize::try_from(self.payload_len)
            .ok()
            .and_then(|len| len.checked_add(self.header_len))
    }
}

// ============================================================================
// Frame
// ============================================================================

/// A complete frame with its payload already unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Final fragment flag.
    pub fin: bool,
    /// Frame opcode.
    pub opcode: Opcode,
    /// Whether the payload was masked on the wire.
    pub masked: bool,
    /// Unmasked payload.
    pub payload: Vec<u8>,
}

// ============================================================================
// Masking
// ============================================================================

/// XORs `data` in place with `mask[i % 4]`.
///
/// Masking and unmasking are the same operation.
#[inline]
pub fn apply_mask(mask: [u8; 4], data: &mut [u8]) {
    for (byte, key) in data.iter_mut().zip(mask.iter().cycle()) {
        *byte ^= key;
    }
}

/// Returns an unmasked copy of `raw` when a mask is given.
#[must_use]
pub fn decode_payload(raw: &[u8], mask: Option<[u8; 4]>) -> Vec<u8> {
    let mut payload = raw.to_vec();
    if let Some(mask) = mask {
        apply_mask(mask, &mut payload);
    }
    payload
}

/// Builds the two-byte payload of a close frame.
#[inline]
#[must_use]
pub const fn close_payload(code: u16) -> [u8; 2] {
    code.to_be_bytes()
}

// ============================================================================
// Encoding
// ============================================================================

/// Encodes a single, final, masked frame.
#[must_use]
pub fn encode(opcode: Opcode, payload: &[u8], mask: [u8; 4]) -> Vec<u8> {
    let len = payload.len();
    let mut frame = Vec::with_capacity(len + 14);

    frame.push(FIN_BIT | opcode.bits());

    if len <= MAX_SHORT_LEN {
        // Fits in 7 bits
        frame.push(MASK_BIT | len as u8);
    } else if let Ok(len16) = u16::try_from(len) {
        frame.push(MASK_BIT | LEN_MARKER_16);
        frame.extend_from_slice(&len16.to_be_bytes());
    } else {
        frame.push(MASK_BIT | LEN_MARKER_64);
        frame.extend_from_slice(&(len as u64).to_be_bytes());
    }

    frame.extend_from_slice(&mask);

    let start = frame.len();
    frame.extend_from_slice(payload);
    apply_mask(mask, &mut frame[start..]);

    frame
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes a frame header from the front of `buf`.
///
/// Returns `None` while `buf` is shorter than the full header, including the
/// extended length and masking key.
#[must_use]
pub fn decode_header(buf: &[u8]) -> Option<FrameHeader> {
    let (&first, rest) = buf.split_first()?;
    let (&second, rest) = rest.split_first()?;

    let fin = first & FIN_BIT != 0;
    let opcode = Opcode::from_bits(first);
    let masked = second & MASK_BIT != 0;

    let (payload_len, ext_len) = match second & 0x7F {
        LEN_MARKER_16 => {
            let bytes: [u8; 2] = rest.get(..2)?.try_into().ok()?;
            (u64::from(u16::from_be_bytes(bytes)), 2)
        }
        LEN_MARKER_64 => {
            let bytes: [u8; 8] = rest.get(..8)?.try_into().ok()?;
            (u64::from_be_bytes(bytes), 8)
        }
        short => (u64::from(short), 0),
    };

    let mask = if masked {
        let bytes: [u8; 4] = rest.get(ext_len..ext_len + 4)?.try_into().ok()?;
        Some(bytes)
    } else {
        None
    };

    Some(FrameHeader {
        fin,
        opcode,
        mask,
        payload_len,
        header_len: 2 + ext_len + if masked { 4 } else { 0 },
    })
}

/// Decodes one complete frame from the front of `buf`.
///
/// Returns the frame and the number of bytes it occupied, or `None` if `buf`
/// does not yet hold the whole frame. Callers bound `payload_len` before
/// buffering that much data.
#[must_use]
pub fn decode(buf: &[u8]) -> Option<(Frame, usize)> {
    let header = decode_header(buf)?;
    let total = header.frame_len()?;
    let raw = buf.get(header.header_len..total)?;

    let frame = Frame {
        fin: header.fin,
        opcode: header.opcode,
        masked: header.masked(),
        payload: decode_payload(raw, header.mask),
    };

    Some((frame, total))
}

// ============================================================================
// Tests
// ============================================================================
