//! IIO event records.
//!
//! The kernel delivers events on the IIO event fd as fixed-size
//! `struct iio_event_data { __u64 id; __s64 timestamp; }` records in
//! native byte order. The `id` packs channel, channel type, modifier,
//! direction and event type; see `include/uapi/linux/iio/events.h`.

/// Size in bytes of one `iio_event_data` record.
pub const EVENT_RECORD_SIZE: usize = 16;

/// `IIO_VOLTAGE` in `enum iio_chan_type`.
pub const CHAN_TYPE_VOLTAGE: u8 = 0;

/// `IIO_EV_TYPE_THRESH` in `enum iio_event_type`.
pub const EVENT_TYPE_THRESH: u8 = 0;

/// `enum iio_event_direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDirection {
    Either,
    Rising,
    Falling,
    None,
    Other(u8),
}

impl From<u8> for EventDirection {
    fn from(raw: u8) -> Self {
        match raw {
            0 => EventDirection::Either,
            1 => EventDirection::Rising,
            2 => EventDirection::Falling,
            3 => EventDirection::None,
            other => EventDirection::Other(other),
        }
    }
}

/// Decoded view of an IIO event `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventCode(u64);

impl EventCode {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Compose an event code the way `IIO_UNMOD_EVENT_CODE` does.
    pub fn unmodified(chan_type: u8, channel: i16, event_type: u8, direction: u8) -> Self {
        let id = ((event_type as u64) << 56)
            | (((direction & 0x7F) as u64) << 48)
            | ((chan_type as u64) << 32)
            | (channel as u16 as u64);
        Self(id)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn channel(&self) -> i16 {
        (self.0 & 0xFFFF) as u16 as i16
    }

    pub fn chan_type(&self) -> u8 {
        ((self.0 >> 32) & 0xFF) as u8
    }

    pub fn modifier(&self) -> u8 {
        ((self.0 >> 40) & 0xFF) as u8
    }

    pub fn direction(&self) -> EventDirection {
        EventDirection::from(((self.0 >> 48) & 0x7F) as u8)
    }

    pub fn event_type(&self) -> u8 {
        ((self.0 >> 56) & 0xFF) as u8
    }

    /// `true` for a rising or falling voltage threshold crossing on
    /// `channel`.
    pub fn is_threshold_crossing(&self, channel: u32) -> bool {
        i64::from(self.channel()) == i64::from(channel)
            && self.chan_type() == CHAN_TYPE_VOLTAGE
            && self.event_type() == EVENT_TYPE_THRESH
            && matches!(
                self.direction(),
                EventDirection::Rising | EventDirection::Falling
            )
    }
}

/// One event read from the event fd.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IioEvent {
    pub code: EventCode,
    /// Kernel timestamp in nanoseconds.
    pub timestamp: i64,
}

impl IioEvent {
    /// Decode a complete record. Returns `None` unless `buf` is exactly
    /// [`EVENT_RECORD_SIZE`] bytes long.
    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        let record: &[u8; EVENT_RECORD_SIZE] = buf.try_into().ok()?;
        let (id, timestamp) = record.split_at(8);
        Some(Self {
            code: EventCode::new(u64::from_ne_bytes(id.try_into().ok()?)),
            timestamp: i64::from_ne_bytes(timestamp.try_into().ok()?),
        })
    }

    pub fn to_bytes(&self) -> [u8; EVENT_RECORD_SIZE] {
        let mut buf = [0u8; EVENT_RECORD_SIZE];
        buf[..8].copy_from_slice(&self.code.raw().to_ne_bytes());
        buf[8..].copy_from_slice(&self.timestamp.to_ne_bytes());
        buf
    }
}
