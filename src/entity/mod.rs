pub mod addresses;
pub mod cart_items;
pub mod categories;
pub mod inventory;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod subcategories;
pub mod users;

pub use addresses::Entity as Addresses;
pub use cart_items::Entity as CartItems;
pub use categories::Entity as Categories;
pub use inventory::Entity as Inventory;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use subcategories::Entity as Subcategories;
pub use users::Entity as Users;
