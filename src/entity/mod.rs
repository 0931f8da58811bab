pub mod audit_logs;
pub mod cart_items;
pub mod product_uses;
pub mod products;
pub mod purchases;
pub mod roles;
pub mod user_roles;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use product_uses::Entity as ProductUses;
pub use products::Entity as Products;
pub use purchases::Entity as Purchases;
pub use roles::Entity as Roles;
pub use user_roles::Entity as UserRoles;
pub use users::Entity as Users;
