mod common;

use common::*;
use dealership_api::{
    entities::{
        car::{CarStatus, Entity as Car},
        movement::{self, Entity as Movement},
        operation::{self, Entity as Operation, OperationKind},
    },
    errors::ServiceError,
    services::{
        cars::{CarService, CarUpdate, WAREHOUSE_LOCATION},
        movements::MovementService,
    },
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

#[tokio::test]
async fn arrival_creates_car_in_stock_at_warehouse() {
    let db = setup_db().await;
    let cars = CarService::new(db.clone(), test_clock());

    let created = cars
        .create_car(new_car("1HGCM82633A123456", "Sedan X", "Black", "15000.50"))
        .await
        .expect("create car");

    assert!(created.id > 0);
    assert_eq!(created.vin, "1HGCM82633A123456");
    assert_eq!(created.status, CarStatus::InStock);
    assert_eq!(created.location, WAREHOUSE_LOCATION);
    assert_eq!(created.purchase_price, dec("15000.50"));
    assert_eq!(created.sale_price, None);
    assert_eq!(created.buyer_id, None);
    assert_sold_invariant(&created);

    let logged = Operation::find()
        .filter(operation::Column::CarId.eq(created.id))
        .all(db.as_ref())
        .await
        .expect("query operations");
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].kind, OperationKind::Arrival);
    assert_eq!(logged[0].performed_by, "system");
    let details = logged[0].details.as_deref().expect("details recorded");
    assert!(details.contains("1HGCM82633A123456"));
    assert!(details.contains("Sedan X"));
}

#[tokio::test]
async fn duplicate_vin_leaves_exactly_one_car() {
    let db = setup_db().await;
    let cars = CarService::new(db.clone(), test_clock());

    cars.create_car(new_car("1HGCM82633A123456", "Sedan X", "Black", "15000"))
        .await
        .expect("first create");
    let second = cars
        .create_car(new_car("1HGCM82633A123456", "Sedan X", "White", "14000"))
        .await;

    assert!(matches!(second, Err(ServiceError::DuplicateVin(_))));
    let count = Car::find().count(db.as_ref()).await.expect("count cars");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn invalid_vin_and_negative_price_are_rejected() {
    let db = setup_db().await;
    let cars = CarService::new(db.clone(), test_clock());

    let short_vin = cars
        .create_car(new_car("SHORT", "Sedan X", "Black", "15000"))
        .await;
    assert!(matches!(short_vin, Err(ServiceError::ValidationError(_))));

    let bad_chars = cars
        .create_car(new_car("1HGCM82633A12345-", "Sedan X", "Black", "15000"))
        .await;
    assert!(matches!(bad_chars, Err(ServiceError::ValidationError(_))));

    let negative = cars
        .create_car(new_car("1HGCM82633A123456", "Sedan X", "Black", "-1"))
        .await;
    assert!(matches!(negative, Err(ServiceError::ValidationError(_))));

    let count = Car::find().count(db.as_ref()).await.expect("count cars");
    assert_eq!(count, 0);
}

#[tokio::test]
async fn lookup_by_id_and_vin() {
    let db = setup_db().await;
    let cars = CarService::new(db.clone(), test_clock());

    let created = cars
        .create_car(new_car("1HGCM82633A123456", "Sedan X", "Black", "15000"))
        .await
        .expect("create car");

    let by_id = cars.get_car(created.id).await.expect("get by id");
    assert_eq!(by_id.as_ref().map(|c| c.id), Some(created.id));

    let by_vin = cars
        .get_car_by_vin("1HGCM82633A123456")
        .await
        .expect("get by vin");
    assert_eq!(by_vin.map(|c| c.id), Some(created.id));

    assert!(cars.get_car(9999).await.expect("get missing").is_none());
    assert!(cars
        .get_car_by_vin("ZZZZZZZZZZZZZZZZZ")
        .await
        .expect("get missing vin")
        .is_none());
}

#[tokio::test]
async fn listing_supports_paging_and_status_filter() {
    let db = setup_db().await;
    let cars = CarService::new(db.clone(), test_clock());

    for i in 0..3 {
        cars.create_car(new_car(
            &format!("1HGCM82633A12345{}", i),
            "Sedan X",
            "Black",
            "10000",
        ))
        .await
        .expect("create car");
    }

    let page = cars.list_cars(0, 2, None).await.expect("first page");
    assert_eq!(page.len(), 2);
    let rest = cars.list_cars(2, 2, None).await.expect("second page");
    assert_eq!(rest.len(), 1);

    let in_stock = cars
        .list_cars(0, 100, Some(CarStatus::InStock))
        .await
        .expect("filtered list");
    assert_eq!(in_stock.len(), 3);
    let sold = cars
        .list_cars(0, 100, Some(CarStatus::Sold))
        .await
        .expect("filtered list");
    assert!(sold.is_empty());

    assert_eq!(cars.list_cars_in_stock().await.expect("stock list").len(), 3);
}

#[tokio::test]
async fn partial_update_touches_only_supplied_fields() {
    let db = setup_db().await;
    let cars = CarService::new(db.clone(), test_clock());

    let created = cars
        .create_car(new_car("1HGCM82633A123456", "Sedan X", "Black", "15000"))
        .await
        .expect("create car");

    let updated = cars
        .update_car(
            created.id,
            CarUpdate {
                color: Some("Red".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("update color");

    assert_eq!(updated.color, "Red");
    assert_eq!(updated.vin, created.vin);
    assert_eq!(updated.model, created.model);
    assert_eq!(updated.purchase_price, created.purchase_price);
    assert_eq!(updated.location, created.location);

    // An explicit null clears a nullable field; absence leaves it alone.
    let with_date = cars
        .update_car(
            created.id,
            CarUpdate {
                sale_date: Some(Some(date(2024, 2, 1))),
                ..Default::default()
            },
        )
        .await
        .expect("set sale date");
    assert_eq!(with_date.sale_date, Some(date(2024, 2, 1)));

    let untouched = cars
        .update_car(
            created.id,
            CarUpdate {
                model: Some("Sedan Y".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("unrelated update");
    assert_eq!(untouched.sale_date, Some(date(2024, 2, 1)));

    let cleared = cars
        .update_car(
            created.id,
            CarUpdate {
                sale_date: Some(None),
                ..Default::default()
            },
        )
        .await
        .expect("clear sale date");
    assert_eq!(cleared.sale_date, None);
}

#[tokio::test]
async fn update_of_missing_car_is_not_found() {
    let db = setup_db().await;
    let cars = CarService::new(db.clone(), test_clock());

    let missing = cars.update_car(42, CarUpdate::default()).await;
    assert!(matches!(missing, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn delete_cascades_movements_and_operations() {
    let db = setup_db().await;
    let cars = CarService::new(db.clone(), test_clock());
    let movements = MovementService::new(db.clone());

    let created = cars
        .create_car(new_car("1HGCM82633A123456", "Sedan X", "Black", "15000"))
        .await
        .expect("create car");
    movements
        .move_car("1HGCM82633A123456", "warehouse", "showroom", date(2024, 1, 12))
        .await
        .expect("move car");

    assert!(
        Movement::find()
            .filter(movement::Column::CarId.eq(created.id))
            .count(db.as_ref())
            .await
            .expect("count movements")
            > 0
    );

    cars.delete_car(created.id).await.expect("delete car");

    assert!(cars.get_car(created.id).await.expect("get").is_none());
    assert_eq!(
        Movement::find()
            .filter(movement::Column::CarId.eq(created.id))
            .count(db.as_ref())
            .await
            .expect("count movements"),
        0
    );
    assert_eq!(
        Operation::find()
            .filter(operation::Column::CarId.eq(created.id))
            .count(db.as_ref())
            .await
            .expect("count operations"),
        0
    );

    let missing = cars.delete_car(created.id).await;
    assert!(matches!(missing, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn status_stays_derived_from_location_updates_only_via_operations() {
    let db = setup_db().await;
    let cars = CarService::new(db.clone(), test_clock());
    let movements = MovementService::new(db.clone());

    cars.create_car(new_car("1HGCM82633A123456", "Sedan X", "Black", "15000"))
        .await
        .expect("create car");
    movements
        .move_car("1HGCM82633A123456", "", "service", date(2024, 1, 12))
        .await
        .expect("move car");

    let car = cars
        .get_car_by_vin("1HGCM82633A123456")
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(car.status, CarStatus::InService);
    assert_eq!(car.location, "service");
    assert_sold_invariant(&car);
}
