mod amenity;
mod society;

pub use amenity::Amenity;
pub use society::{
    normalize_email, InvalidTransition, OnboardingState, Society, SocietyDetails, Transition,
};
