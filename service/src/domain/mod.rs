//! Entities of the dealership.

pub mod booking;
pub mod car;
pub mod contract;
pub mod customer;
pub mod employee;
pub mod manager;
pub mod payment;
pub mod rent_date;
pub mod rent_list;
pub mod sale_list;

pub use self::{
    booking::Booking, car::Car, contract::Contract, customer::Customer,
    payment::Payment, rent_date::RentDate, rent_list::RentList,
    sale_list::SaleList,
};
