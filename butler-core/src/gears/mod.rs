// ABOUTME: Gears that need no network transport of their own
// ABOUTME: Echo, surface delivery and administrator notification

mod echo;
mod notify_admin;
mod send_message;

pub use echo::EchoMessageGear;
pub use notify_admin::NotifyAdminGear;
pub use send_message::SendMessageGear;
