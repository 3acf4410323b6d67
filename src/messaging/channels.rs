// Lock-free command channel (single producer, single consumer)

use crate::messaging::command::Command;
use ringbuf::{HeapRb, traits::Split};

/// Default queue depth. A burst larger than this between two audio callbacks
/// drops notes.
pub const DEFAULT_COMMAND_CAPACITY: usize = 1024;

pub type CommandProducer = ringbuf::HeapProd<Command>;
pub type CommandConsumer = ringbuf::HeapCons<Command>;

pub fn create_command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let rb = HeapRb::<Command>::new(capacity.max(1));
    rb.split()
}
