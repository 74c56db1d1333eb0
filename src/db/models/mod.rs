mod attendance;
mod batch;
mod invoice;
mod material;
mod notification;
mod purchase_order;
mod session;
mod trainee;
mod user;

pub use attendance::*;
pub use batch::*;
pub use invoice::*;
pub use material::*;
pub use notification::*;
pub use purchase_order::*;
pub use session::*;
pub use trainee::*;
pub use user::*;
