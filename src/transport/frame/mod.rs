//! In-memory representation of a classic CAN frame, plus the translation to
//! and from the low-level driver message where the extended (EFF) and remote
//! (RTR) flags live inside the identifier word.
use embedded_can::{ExtendedId, Id, StandardId};

/// Identifier flag marking a 29-bit (extended) frame in [`RawMessage::id`].
pub const ID_EFF: u32 = 1 << 31;
/// Identifier flag marking a remote transmission request in [`RawMessage::id`].
pub const ID_RTR: u32 = 1 << 30;

/// Bits of an 11-bit (standard) identifier.
pub const STD_ID_MASK: u32 = 0x7FF;
/// Bits of a 29-bit (extended) identifier.
pub const EXT_ID_MASK: u32 = 0x1FFF_FFFF;

/// Largest classic CAN payload.
pub const MAX_DLC: u8 = 8;

//==================================================================================FRAME
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// A single CAN message as seen by the rest of the firmware.
pub struct Frame {
    /// Arbitration identifier (11 or 29 bits), flags stripped.
    pub id: u32,
    /// 29-bit identifier space when set, 11-bit otherwise.
    pub extended: bool,
    /// Remote transmission request; the payload carries no meaning.
    pub rtr: bool,
    /// Declared data length (Data Length Code, 0 to 8).
    pub dlc: u8,
    /// Payload buffer; only the first `dlc` bytes are meaningful.
    pub data: [u8; 8],
}

impl Frame {
    /// Build a data frame. Returns `None` when `data` holds more than eight bytes.
    pub fn new_data(id: u32, extended: bool, data: &[u8]) -> Option<Self> {
        if data.len() > MAX_DLC as usize {
            return None;
        }
        let mut buf = [0u8; 8];
        buf[..data.len()].copy_from_slice(data);
        Some(Self {
            id,
            extended,
            rtr: false,
            dlc: data.len() as u8,
            data: buf,
        })
    }

    /// Populated bytes of the payload.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        let len = self.dlc.min(MAX_DLC) as usize;
        &self.data[..len]
    }

    /// Recover the canonical frame from a driver message.
    pub fn from_raw(msg: &RawMessage) -> Self {
        Self {
            id: msg.id & !(ID_RTR | ID_EFF),
            extended: msg.id & ID_EFF != 0,
            rtr: msg.id & ID_RTR != 0,
            dlc: msg.dlc.min(MAX_DLC as u32) as u8,
            data: msg.data,
        }
    }

    /// Build the driver message, re-inserting the flag bits into the identifier.
    ///
    /// Identifier bits beyond the frame's id space are dropped so they can
    /// never alias the flags.
    pub fn to_raw(&self) -> RawMessage {
        let mut id = if self.extended {
            (self.id & EXT_ID_MASK) | ID_EFF
        } else {
            self.id & STD_ID_MASK
        };
        if self.rtr {
            id |= ID_RTR;
        }
        RawMessage {
            id,
            dlc: self.dlc as u32,
            data: self.data,
        }
    }
}

impl From<&RawMessage> for Frame {
    fn from(msg: &RawMessage) -> Self {
        Frame::from_raw(msg)
    }
}

impl From<&Frame> for RawMessage {
    fn from(frame: &Frame) -> Self {
        frame.to_raw()
    }
}

//==================================================================================RAW_MESSAGE
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Message layout exchanged with the bit-level CAN engine.
pub struct RawMessage {
    /// Identifier with [`ID_EFF`] / [`ID_RTR`] flags in the top bits.
    pub id: u32,
    /// Data length code.
    pub dlc: u32,
    pub data: [u8; 8],
}

//==================================================================================EMBEDDED_CAN
impl embedded_can::Frame for Frame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        let (raw_id, extended) = split_id(id.into());
        Frame::new_data(raw_id, extended, data)
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > MAX_DLC as usize {
            return None;
        }
        let (raw_id, extended) = split_id(id.into());
        Some(Self {
            id: raw_id,
            extended,
            rtr: true,
            dlc: dlc as u8,
            data: [0; 8],
        })
    }

    fn is_extended(&self) -> bool {
        self.extended
    }

    fn is_remote_frame(&self) -> bool {
        self.rtr
    }

    fn id(&self) -> Id {
        if self.extended {
            let id = ExtendedId::new(self.id & ExtendedId::MAX.as_raw())
                .unwrap_or(ExtendedId::ZERO);
            Id::Extended(id)
        } else {
            let id = StandardId::new((self.id as u16) & StandardId::MAX.as_raw())
                .unwrap_or(StandardId::ZERO);
            Id::Standard(id)
        }
    }

    fn dlc(&self) -> usize {
        self.dlc as usize
    }

    fn data(&self) -> &[u8] {
        self.payload()
    }
}

fn split_id(id: Id) -> (u32, bool) {
    match id {
        Id::Standard(std_id) => (std_id.as_raw() as u32, false),
        Id::Extended(ext_id) => (ext_id.as_raw(), true),
    }
}
