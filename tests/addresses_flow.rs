mod common;

use grocery_storefront_api::{
    error::AppError,
    models::Role,
    services::address_service,
};

#[tokio::test]
async fn first_address_becomes_default() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let customer = common::create_user(&state, Role::Customer).await?;

    let first = address_service::create_address(
        &state,
        &customer,
        common::address_request("Casa", false),
    )
    .await?
    .data
    .expect("address");
    assert!(first.is_default);
    Ok(())
}

#[tokio::test]
async fn new_default_clears_previous() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let customer = common::create_user(&state, Role::Customer).await?;

    let home = address_service::create_address(&state, &customer, common::address_request("Casa", true))
        .await?
        .data
        .expect("address");
    let work = address_service::create_address(&state, &customer, common::address_request("Oficina", true))
        .await?
        .data
        .expect("address");

    let list = address_service::list_addresses(&state, &customer)
        .await?
        .data
        .expect("addresses")
        .items;
    let defaults: Vec<_> = list.iter().filter(|a| a.is_default).map(|a| a.id).collect();
    assert_eq!(defaults, [work.id]);

    address_service::set_default_address(&state, &customer, home.id).await?;
    let list = address_service::list_addresses(&state, &customer)
        .await?
        .data
        .expect("addresses")
        .items;
    let defaults: Vec<_> = list.iter().filter(|a| a.is_default).map(|a| a.id).collect();
    assert_eq!(defaults, [home.id]);
    Ok(())
}

#[tokio::test]
async fn deleting_default_promotes_another() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let customer = common::create_user(&state, Role::Customer).await?;

    let home = address_service::create_address(&state, &customer, common::address_request("Casa", true))
        .await?
        .data
        .expect("address");
    let work = address_service::create_address(&state, &customer, common::address_request("Oficina", false))
        .await?
        .data
        .expect("address");

    address_service::delete_address(&state, &customer, home.id).await?;

    let list = address_service::list_addresses(&state, &customer)
        .await?
        .data
        .expect("addresses")
        .items;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, work.id);
    assert!(list[0].is_default);

    let gone = address_service::get_address(&state, &customer, home.id)
        .await
        .unwrap_err();
    assert!(matches!(gone, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn addresses_are_private() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let owner = common::create_user(&state, Role::Customer).await?;
    let other = common::create_user(&state, Role::Customer).await?;
    let address = common::create_address(&state, &owner).await?;

    let err = address_service::get_address(&state, &other, address)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}
