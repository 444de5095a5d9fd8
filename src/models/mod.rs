pub mod booking;
pub mod tour;

pub use booking::{Booking, BookingSource, NewBooking, Participant, PaymentMethod};
pub use tour::Tour;
