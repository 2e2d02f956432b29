//! UseCase layer: application operations built on the domain interfaces.

mod authenticate;
mod connect_user;
mod disconnect_user;
mod error;
mod get_active_users;
mod get_conversation;
mod send_message;

pub use authenticate::AuthenticateUseCase;
pub use connect_user::ConnectUserUseCase;
pub use disconnect_user::DisconnectUserUseCase;
pub use error::SendMessageError;
pub use get_active_users::GetActiveUsersUseCase;
pub use get_conversation::GetConversationUseCase;
pub use send_message::{DeliveryFailure, SendMessageUseCase, SendOutcome};
