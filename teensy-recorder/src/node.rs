use crate::block::{AudioBlockMut, AudioBlockRef};

/// A stage of the audio stream graph.
///
/// Each node receives input blocks and produces output blocks once per tick
/// in `update()`. The number of ports is declared via associated constants.
pub trait AudioNode {
    /// Number of input channels this node accepts.
    const NUM_INPUTS: usize;

    /// Number of output channels this node produces.
    const NUM_OUTPUTS: usize;

    /// Process one tick.
    ///
    /// `inputs` contains `NUM_INPUTS` slots, each optionally holding a shared
    /// block routed from an upstream node. `outputs` contains `NUM_OUTPUTS`
    /// empty slots; a node that has data for a port moves a block into it.
    fn update(
        &mut self,
        inputs: &[Option<AudioBlockRef>],
        outputs: &mut [Option<AudioBlockMut>],
    );
}
