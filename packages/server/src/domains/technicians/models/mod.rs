pub mod technician;
pub mod van;

pub use technician::{
    AvailabilityException, DefaultHours, ExceptionKind, Technician,
};
pub use van::Van;
