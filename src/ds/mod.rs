pub mod address_table;
pub mod ghost_list;
pub mod intrusive_list;
pub mod lazy_heap;
pub mod ring_buffer;
pub mod segmented_ring;
pub mod slot_arena;

pub use address_table::{AddressTable, TableMode};
pub use ghost_list::GhostList;
pub use intrusive_list::IntrusiveList;
pub use lazy_heap::LazyMinHeap;
pub use ring_buffer::RingBuffer;
pub use segmented_ring::SegmentedRing;
pub use slot_arena::{SlotArena, SlotId};
