pub mod messages;

pub use messages::ConnectionInvitationMessage;
