use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        Validate,
        orders::{CheckoutRequest, OrderDetail, OrderItemDetail, OrderList, UpdateOrderStatusRequest},
    },
    entity::{
        addresses::Entity as Addresses,
        cart_items::{Column as CartCol, Entity as CartItems},
        inventory::{Column as InvCol, Entity as Inventory},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult, CheckoutError},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, ProductSummary},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{address_service, pricing::{DeliveryPolicy, line_total}},
    state::AppState,
};

/// Requested quantities keyed by product, duplicates summed. Ordered so row
/// locks are always taken in the same sequence.
pub fn merge_items(payload: &CheckoutRequest) -> BTreeMap<Uuid, i32> {
    let mut merged = BTreeMap::new();
    for item in &payload.items {
        *merged.entry(item.product_id).or_insert(0) += item.quantity;
    }
    merged
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    payload.validate()?;
    let requested = merge_items(&payload);
    let product_ids: Vec<Uuid> = requested.keys().copied().collect();

    let txn = state.orm.begin().await?;

    address_service::find_owned(&txn, user.user_id, payload.delivery_address_id)
        .await?
        .ok_or(CheckoutError::InvalidAddress)?;

    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids.clone()))
        .filter(ProdCol::IsActive.eq(true))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    if let Some(missing) = product_ids.iter().find(|id| !products.contains_key(id)) {
        return Err(CheckoutError::ProductUnavailable(*missing).into());
    }

    let stock: HashMap<Uuid, i32> = Inventory::find()
        .filter(InvCol::ProductId.is_in(product_ids.clone()))
        .order_by_asc(InvCol::ProductId)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|inv| (inv.product_id, inv.quantity))
        .collect();

    let mut lines = Vec::with_capacity(requested.len());
    for (product_id, quantity) in &requested {
        let product = &products[product_id];
        let available = stock.get(product_id).copied().unwrap_or(0);
        if available < *quantity {
            return Err(CheckoutError::InsufficientStock {
                product_id: *product_id,
                name: product.name.clone(),
                available,
                requested: *quantity,
            }
            .into());
        }
        lines.push((product, *quantity));
    }

    let totals = DeliveryPolicy::from_config(&state.config)
        .totals(lines.iter().map(|(p, q)| (p.price, *q)))?;

    let order_id = Uuid::new_v4();
    let order = OrderActive {
        id: Set(order_id),
        order_number: Set(build_order_number(order_id)),
        user_id: Set(user.user_id),
        status: Set(OrderStatus::Pending.as_str().into()),
        subtotal: Set(totals.subtotal),
        delivery_fee: Set(totals.delivery_fee),
        total: Set(totals.total),
        payment_method: Set(payload.payment_method.as_str().into()),
        payment_status: Set(PaymentStatus::Pending.as_str().into()),
        delivery_address_id: Set(payload.delivery_address_id),
        notes: Set(payload.notes.filter(|n| !n.trim().is_empty())),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for (product, quantity) in &lines {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product.id),
            product_name: Set(product.name.clone()),
            unit_price: Set(product.price),
            quantity: Set(*quantity),
            subtotal: Set(line_total(product.price, *quantity)?),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        Inventory::update_many()
            .col_expr(InvCol::Quantity, Expr::col(InvCol::Quantity).sub(*quantity))
            .col_expr(InvCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(InvCol::ProductId.eq(product.id))
            .exec(&txn)
            .await?;
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    let detail = load_detail(&txn, order).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %detail.order.id,
        order_number = %detail.order.order_number,
        total = detail.order.total,
        items = detail.items.len(),
        "order placed"
    );
    audit::record(
        &state.pool,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": detail.order.id, "total": detail.order.total }),
    )
    .await;

    Ok(ApiResponse::success("Order placed", detail, Some(Meta::empty())))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    paged_orders(state, Some(user.user_id), query).await
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    paged_orders(state, None, query).await
}

async fn paged_orders(
    state: &AppState,
    owner: Option<Uuid>,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if let Some(user_id) = owner {
        condition = condition.add(OrderCol::UserId.eq(user_id));
    }
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "OK",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let mut condition = Condition::all().add(OrderCol::Id.eq(id));
    if !user.is_admin() {
        condition = condition.add(OrderCol::UserId.eq(user.user_id));
    }

    let order = Orders::find()
        .filter(condition)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let detail = load_detail(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", detail, Some(Meta::empty())))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let order = transition(&txn, order, payload.status).await?;
    let detail = load_detail(&txn, order).await?;
    txn.commit().await?;

    tracing::info!(order_id = %id, status = %payload.status, "order status changed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status",
        "orders",
        serde_json::json!({ "order_id": id, "status": payload.status }),
    )
    .await;

    Ok(ApiResponse::success("Order updated", detail, Some(Meta::empty())))
}

/// Customers may only withdraw orders nobody has confirmed yet.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    if order.status != OrderStatus::Pending.as_str() {
        return Err(AppError::Conflict(
            "Only pending orders can be cancelled".into(),
        ));
    }

    let order = transition(&txn, order, OrderStatus::Cancelled).await?;
    let detail = load_detail(&txn, order).await?;
    txn.commit().await?;

    tracing::info!(order_id = %id, "order cancelled by customer");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::success("Order cancelled", detail, Some(Meta::empty())))
}

/// Payment status that follows from moving an order into `next`.
pub fn payment_after(
    next: OrderStatus,
    method: PaymentMethod,
    current: PaymentStatus,
) -> PaymentStatus {
    match (next, method, current) {
        (OrderStatus::Delivered, PaymentMethod::CashOnDelivery, PaymentStatus::Pending) => {
            PaymentStatus::Paid
        }
        (OrderStatus::Cancelled, _, PaymentStatus::Paid) => PaymentStatus::Refunded,
        _ => current,
    }
}

async fn transition(
    txn: &DatabaseTransaction,
    order: OrderModel,
    next: OrderStatus,
) -> AppResult<OrderModel> {
    let current: OrderStatus = order.status.parse()?;
    if !current.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "Cannot change order status from {current} to {next}"
        )));
    }

    if next == OrderStatus::Cancelled {
        restore_inventory(txn, order.id).await?;
    }

    let payment_status = payment_after(
        next,
        order.payment_method.parse()?,
        order.payment_status.parse()?,
    );

    let mut active: OrderActive = order.into();
    active.status = Set(next.as_str().into());
    active.payment_status = Set(payment_status.as_str().into());
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

async fn restore_inventory(txn: &DatabaseTransaction, order_id: Uuid) -> AppResult<()> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::ProductId)
        .all(txn)
        .await?;

    for item in items {
        Inventory::update_many()
            .col_expr(InvCol::Quantity, Expr::col(InvCol::Quantity).add(item.quantity))
            .col_expr(InvCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(InvCol::ProductId.eq(item.product_id))
            .exec(txn)
            .await?;
    }
    Ok(())
}

async fn load_detail<C: ConnectionTrait>(conn: &C, order: OrderModel) -> AppResult<OrderDetail> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::ProductName)
        .all(conn)
        .await?;

    let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    // Soft-deleted addresses still resolve for past orders.
    let address = Addresses::find_by_id(order.delivery_address_id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("Address"))?;

    let items = items
        .into_iter()
        .map(|item| -> AppResult<OrderItemDetail> {
            let product = match products.get(&item.product_id) {
                Some(p) => ProductSummary {
                    id: p.id,
                    name: p.name.clone(),
                    unit: p.unit.parse()?,
                    image_url: p.image_url.clone(),
                },
                None => return Err(AppError::NotFound("Product")),
            };
            Ok(OrderItemDetail {
                item: order_item_from_entity(item),
                product,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(OrderDetail {
        order: order_from_entity(order)?,
        items,
        delivery_address: address_service::address_from_entity(address),
    })
}

fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        order_number: model.order_number,
        user_id: model.user_id,
        status: model.status.parse()?,
        subtotal: model.subtotal,
        delivery_fee: model.delivery_fee,
        total: model.total,
        payment_method: model.payment_method.parse()?,
        payment_status: model.payment_status.parse()?,
        delivery_address_id: model.delivery_address_id,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        product_name: model.product_name,
        unit_price: model.unit_price,
        quantity: model.quantity,
        subtotal: model.subtotal,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn build_order_number(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = order_id.simple().to_string().to_uppercase();
    format!("ORD-{}-{}", date, &suffix[..8])
}
