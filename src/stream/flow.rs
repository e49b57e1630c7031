use crate::frame::{Reason, MAX_WINDOW_SIZE};

/// Window accounting for one direction of a stream.
///
/// The receive side debits on inbound DATA and credits as the user consumes;
/// the send side debits on outbound DATA and credits on WNDINC from the peer.
#[derive(Copy, Clone, Debug)]
pub(super) struct FlowControl {
    window: Window,
}

impl FlowControl {
    pub fn new(init_window_sz: u32) -> FlowControl {
        FlowControl {
            window: Window(init_window_sz as i32),
        }
    }

    pub fn available(&self) -> u32 {
        self.window.as_size()
    }

    /// Consume window for payload bytes.
    pub fn debit(&mut self, sz: u32) -> Result<(), Reason> {
        self.window.decrease_by(sz)
    }

    /// Return window credit.
    pub fn credit(&mut self, sz: u32) -> Result<(), Reason> {
        self.window.increase_by(sz)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd)]
struct Window(i32);

impl Window {
    fn as_size(&self) -> u32 {
        if self.0 < 0 {
            0
        } else {
            self.0 as u32
        }
    }

    fn decrease_by(&mut self, sz: u32) -> Result<(), Reason> {
        let Some(v) = self.0.checked_sub(sz as i32) else {
            return Err(Reason::FLOW_CONTROL_ERROR);
        };
        if v < 0 {
            return Err(Reason::FLOW_CONTROL_ERROR);
        }
        self.0 = v;
        Ok(())
    }

    fn increase_by(&mut self, sz: u32) -> Result<(), Reason> {
        let (val, overflow) = self.0.overflowing_add(sz as i32);
        if overflow || val > MAX_WINDOW_SIZE as i32 {
            return Err(Reason::FLOW_CONTROL_ERROR);
        }
        self.0 = val;
        Ok(())
    }
}
