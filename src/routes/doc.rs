use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::{AddressList, CreateAddressRequest, UpdateAddressRequest},
        auth::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, TokenPair},
        cart::{AddToCartRequest, CartItemDto, CartView, UpdateCartItemRequest},
        categories::{CategoryList, CreateCategoryRequest, CreateSubcategoryRequest, SubcategoryList},
        inventory::{AdjustInventoryRequest, LowStockItem, LowStockList},
        orders::{CheckoutItem, CheckoutRequest, OrderDetail, OrderItemDetail, OrderList, UpdateOrderStatusRequest},
        products::{CategoryRef, CreateProductRequest, ProductDetail, ProductList, UpdateProductRequest},
        reviews::{ReviewList, UpsertReviewRequest},
        users::{ChangePasswordRequest, UpdateProfileRequest},
    },
    error::FieldError,
    models::{
        Address, CartItem, Category, Inventory, Order, OrderItem, OrderStatus, PaymentMethod,
        PaymentStatus, Product, ProductSummary, ProductUnit, Review, Subcategory, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        auth, cart, categories, health, inventory, orders, params, products, users,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::refresh,
        auth::me,
        auth::logout,
        users::get_profile,
        users::update_profile,
        users::change_password,
        users::list_addresses,
        users::create_address,
        users::get_address,
        users::update_address,
        users::delete_address,
        users::set_default_address,
        products::list_products,
        products::search_products,
        products::featured_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::list_reviews,
        products::upsert_review,
        categories::list_categories,
        categories::get_category,
        categories::list_subcategories,
        categories::create_category,
        categories::create_subcategory,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::checkout,
        orders::list_orders,
        orders::list_all_orders,
        orders::get_order,
        orders::update_order_status,
        orders::cancel_order,
        inventory::list_low_stock,
        inventory::get_inventory,
        inventory::adjust_inventory
    ),
    components(
        schemas(
            User,
            Address,
            Category,
            Subcategory,
            Product,
            ProductSummary,
            ProductUnit,
            Inventory,
            CartItem,
            Order,
            OrderItem,
            OrderStatus,
            PaymentMethod,
            PaymentStatus,
            Review,
            FieldError,
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            TokenPair,
            AuthResponse,
            UpdateProfileRequest,
            ChangePasswordRequest,
            CreateAddressRequest,
            UpdateAddressRequest,
            AddressList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            ProductDetail,
            CategoryRef,
            CreateCategoryRequest,
            CreateSubcategoryRequest,
            CategoryList,
            SubcategoryList,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartItemDto,
            CartView,
            CheckoutItem,
            CheckoutRequest,
            UpdateOrderStatusRequest,
            OrderItemDetail,
            OrderDetail,
            OrderList,
            AdjustInventoryRequest,
            LowStockItem,
            LowStockList,
            UpsertReviewRequest,
            ReviewList,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderList>,
            ApiResponse<CartView>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and database ping"),
        (name = "Auth", description = "Registration, login and token rotation"),
        (name = "Users", description = "Profile and delivery addresses"),
        (name = "Products", description = "Catalogue, search and reviews"),
        (name = "Categories", description = "Category tree"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Orders", description = "Checkout and order lifecycle"),
        (name = "Inventory", description = "Stock management"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
