pub mod user;
pub mod hall;
pub mod seat;
pub mod show;
pub mod ticket;

pub use user::User;
pub use hall::Hall;
pub use seat::{Seat, SeatCategory};
pub use show::{Show, ShowStatus};
pub use ticket::{Ticket, TicketStatus};
