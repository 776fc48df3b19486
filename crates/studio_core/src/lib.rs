pub mod bookings;
pub mod content;
pub mod domain;
pub mod enrollment;
pub mod error;
pub mod guard;
pub mod inbox;
pub mod ports;
pub mod session;
pub mod showcase;
pub mod slug;

pub use domain::{
    AuthSession, Booking, BookingPrice, BookingStatus, Category, FinancialStats, HomepageImage,
    Message, MessageStatus, NewBooking, NewMessage, NewPhoto, NewTestimonial, Photo, PhotoRef,
    Profile, Role, Testimonial, UploadFile, User,
};
pub use error::{ActionError, ActionResult};
pub use ports::{
    CacheInvalidator, DatabaseService, IdentityService, ObjectStorage, PortError, PortResult,
};
pub use session::{resolve_session, ResolvedSession};
