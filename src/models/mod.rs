pub mod event;
pub mod user;

pub use event::{
    AttendeeEntry, AttendeeStatus, AttendeeSummary, Event, EventOut, Invitation, InviteRequest,
    InviteResult, Message, NewEvent, RsvpRequest, RsvpResponse, Rsvps, SearchParams, DATE_FORMAT,
};
pub use user::{LoginRequest, Role, SignupRequest, TokenOut, User, UserOut};
