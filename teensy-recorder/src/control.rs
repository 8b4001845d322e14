/// Channel layouts the capture engine supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelConfig {
    /// One data line, two slots per frame.
    Stereo = 2,
    /// Two data lines, four slots per frame.
    Quad = 4,
}

impl ChannelConfig {
    /// Layout for `channels` captured channels, if supported.
    pub const fn from_channels(channels: usize) -> Option<Self> {
        match channels {
            2 => Some(ChannelConfig::Stereo),
            4 => Some(ChannelConfig::Quad),
            _ => None,
        }
    }

    /// Number of channels in one frame.
    pub const fn channels(self) -> usize {
        self as usize
    }
}

/// Hardware side of a capture path (SAI/I2S receiver plus its DMA channel).
///
/// Register-level setup lives in the implementation; the capture engine only
/// needs to start the stream and to read where the DMA engine is writing.
pub trait CaptureControl {
    /// Error type for control operations.
    type Error;

    /// Configure and enable the receiver and its circular DMA transfer,
    /// including the half-complete and complete interrupts.
    fn start_capture(&mut self, channels: ChannelConfig) -> Result<(), Self::Error>;

    /// Address the DMA engine will write next.
    fn write_address(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_stereo_and_quad_are_supported() {
        for n in [2, 4] {
            assert_eq!(ChannelConfig::from_channels(n).map(ChannelConfig::channels), Some(n));
        }
        for n in [0, 1, 3, 8] {
            assert_eq!(ChannelConfig::from_channels(n), None);
        }
    }
}
