//! Audio graph macro for declarative node wiring.
//!
//! The [`audio_graph!`] macro generates a typed struct containing all audio nodes
//! with an `update_all()` method that processes them in the declared order and
//! routes audio blocks between connected ports. `update_all()` is the tick:
//! call it whenever the input with update responsibility reports that a cycle
//! is complete.
//!
//! # Syntax
//!
//! Nodes are listed in **processing order** (sources first, then downstream
//! consumers). Each node's input connections are declared inline after `=>`.
//! A node that cannot be built with a plain `new()` gives its constructor
//! expression after `=`.
//!
//! ```ignore
//! use teensy_recorder::audio_graph;
//! use teensy_recorder::io::*;
//!
//! static POOL: AudioBlockPool = AudioBlockPool::new();
//!
//! audio_graph! {
//!     pub struct Recorder {
//!         input: AudioInputI2SQuad = AudioInputI2S::new(&POOL, true) => {},
//!         logger: AudioRecordLogger<4, 8, 2> => {
//!             (input, 0), (input, 1), (input, 2), (input, 3)
//!         },
//!     }
//! }
//! ```
//!
//! ## Input connection syntax
//!
//! - `{}` — no inputs (source node)
//! - `{ (node, port) }` — input 0 connected to `node`'s output `port`
//! - `{ (node, 0), _ }` — input 0 connected, input 1 unconnected
//! - `{ (input, 0), (input, 0) }` — fan-out: same output to two inputs
//!
//! ## Generated API
//!
//! - A struct with `pub` fields for each node (direct access for configuration)
//! - `new()` — constructs all nodes, via `new()` unless an expression is given
//! - `update_all()` — processes one block cycle, routing audio between nodes
//!
//! ## Block routing
//!
//! - Output slots start empty; a node moves a block into each port it feeds
//! - Output blocks are converted to shared `AudioBlockRef` for routing
//! - Fan-out uses `AudioBlockRef::clone()` (refcount increment, no copy)
//! - Unconnected inputs (`_`) and empty outputs reach downstream as `None`
//! - Blocks nobody kept are released when `update_all()` returns

/// Declare and wire an audio processing graph.
///
/// See the [module documentation](crate::graph) for full syntax.
#[macro_export]
macro_rules! audio_graph {
    // ── Main entry point ──────────────────────────────────────────────
    (
        $(#[$struct_meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $node_name:ident : $node_type:ty $( = $ctor:expr )?
                    => { $( $input_item:tt ),* $(,)? }
            ),+
            $(,)?
        }
    ) => {
        // ── Struct definition ─────────────────────────────────────────
        $(#[$struct_meta])*
        $vis struct $name {
            $( pub $node_name: $node_type, )+
        }

        impl $name {
            /// Create the graph with every node in its initial state.
            pub fn new() -> Self {
                Self {
                    $( $node_name: $crate::audio_graph!(@ctor $node_type $(, $ctor)?), )+
                }
            }

            /// Process one block cycle through the entire graph.
            ///
            /// Calls `update()` on each node in declaration order and routes
            /// its output blocks to connected input ports.
            #[allow(unused_variables)]
            pub fn update_all(&mut self) {
                $(
                    #[allow(unused_variables, clippy::let_unit_value)]
                    let $node_name: [Option<$crate::block::AudioBlockRef>;
                        <$node_type as $crate::node::AudioNode>::NUM_OUTPUTS
                    ] = {
                        let _inputs: [Option<$crate::block::AudioBlockRef>;
                            <$node_type as $crate::node::AudioNode>::NUM_INPUTS
                        ] = [ $( $crate::audio_graph!(@input_expr $input_item) ),* ];

                        let mut _outs: [Option<$crate::block::AudioBlockMut>;
                            <$node_type as $crate::node::AudioNode>::NUM_OUTPUTS
                        ] = core::array::from_fn(|_| None);

                        <$node_type as $crate::node::AudioNode>::update(
                            &mut self.$node_name, &_inputs, &mut _outs
                        );

                        // Convert outputs to shared refs for downstream routing
                        _outs.map(|opt| opt.map(|b| b.into_shared()))
                    };
                )+
            }
        }
    };

    // ── Constructor helpers ───────────────────────────────────────────
    (@ctor $node_type:ty) => { <$node_type>::new() };
    (@ctor $node_type:ty, $ctor:expr) => { $ctor };

    // ── Input expression helpers ──────────────────────────────────────
    // Unconnected input
    (@input_expr _) => { None };

    // Connected input: clone a shared ref from a source node's output port
    (@input_expr ($src:ident, $port:expr)) => {
        $src[$port].clone()
    };
}

#[cfg(test)]
mod tests {
    use crate::block::AudioBlockPool;
    use crate::io::{AudioInputI2S, AudioInputI2SQuad, AudioInputI2SStereo, AudioRecordLogger, RxRing};
    use crate::logger::Drain;

    static QUAD_POOL: AudioBlockPool = AudioBlockPool::new();
    static FAN_POOL: AudioBlockPool = AudioBlockPool::new();

    crate::audio_graph! {
        struct QuadRecorder {
            input: AudioInputI2SQuad = AudioInputI2S::new(&QUAD_POOL, true) => {},
            logger: AudioRecordLogger<4, 8, 2> => {
                (input, 0), (input, 1), (input, 2), (input, 3)
            },
        }
    }

    // Left channel recorded twice, right channel dropped.
    crate::audio_graph! {
        struct FanOut {
            input: AudioInputI2SStereo = AudioInputI2S::new(&FAN_POOL, true) => {},
            both: AudioRecordLogger<2, 4, 1> => { (input, 0), (input, 0) },
            gap: AudioRecordLogger<2, 4, 1> => { (input, 1), _ },
        }
    }

    fn cycle<const N: usize>(input: &AudioInputI2S<N>, ring: &RxRing<N>) -> bool {
        let mid = ring.base_address() + RxRing::<N>::BYTES / 2;
        let a = input.isr(ring, mid);
        let b = input.isr(ring, ring.base_address());
        a || b
    }

    #[test]
    fn graph_new_creates_all_nodes() {
        let graph = QuadRecorder::new();
        assert!(graph.input.has_update_responsibility());
        assert!(!graph.logger.is_enabled());
    }

    #[test]
    fn graph_routes_captured_channels_to_logger() {
        let mut graph = QuadRecorder::new();
        graph.logger.begin();
        let mut ring = RxRing::<4>::new();
        for frame in ring.frames_mut() {
            // wire order ch0, ch2, ch1, ch3
            *frame = [100, 300, 200, 400];
        }

        graph.update_all(); // installs working blocks
        assert_eq!(graph.logger.depth(), 0);

        for _ in 0..2 {
            assert!(cycle(&graph.input, &ring));
            graph.update_all();
        }
        assert_eq!(graph.logger.depth(), 2);

        let mut buf = [0u8; AudioRecordLogger::<4, 8, 2>::WRITE_BYTES];
        assert!(graph.logger.drain(&mut buf).is_some());
        let first: [i16; 4] =
            core::array::from_fn(|c| i16::from_le_bytes([buf[c * 2], buf[c * 2 + 1]]));
        assert_eq!(first, [100, 200, 300, 400]);

        drop(graph);
        assert_eq!(QUAD_POOL.allocated_count(), 0);
    }

    #[test]
    fn graph_fan_out_shares_blocks() {
        let mut graph = FanOut::new();
        graph.both.begin();
        graph.gap.begin();
        let mut ring = RxRing::<2>::new();
        for frame in ring.frames_mut() {
            *frame = [7, -7];
        }

        graph.update_all();
        cycle(&graph.input, &ring);
        graph.update_all();

        // one captured left block held twice, right block released;
        // plus the fresh working set
        assert_eq!(graph.both.depth(), 1);
        assert_eq!(graph.gap.depth(), 0, "incomplete group is not queued");
        assert_eq!(FAN_POOL.allocated_count(), 3);

        let mut buf = [0u8; AudioRecordLogger::<2, 4, 1>::WRITE_BYTES];
        graph.both.drain(&mut buf).unwrap();
        assert_eq!(&buf[..4], &[7, 0, 7, 0]);
        assert_eq!(FAN_POOL.allocated_count(), 2);
    }
}
