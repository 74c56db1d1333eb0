mod batch_repository;
mod notification_repository;
mod purchase_order_repository;
mod user_repository;

pub use batch_repository::BatchRepository;
pub use notification_repository::NotificationRepository;
pub use purchase_order_repository::PurchaseOrderRepository;
pub use user_repository::UserRepository;
