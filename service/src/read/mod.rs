//! Read models: domain entities joined with what the API shows next to them.

pub mod payment;
pub mod rent_list;
pub mod sale_list;
