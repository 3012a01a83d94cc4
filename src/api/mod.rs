pub mod admission;
pub mod attendance;
pub mod id_card;
pub mod result;
