// Communication channels lock-free

use crate::messaging::command::ClickCommand;
use ringbuf::{HeapRb, traits::Split};

pub type ClickProducer = ringbuf::HeapProd<ClickCommand>;
pub type ClickConsumer = ringbuf::HeapCons<ClickCommand>;

pub fn create_click_channel(capacity: usize) -> (ClickProducer, ClickConsumer) {
    let rb = HeapRb::<ClickCommand>::new(capacity);
    rb.split()
}
