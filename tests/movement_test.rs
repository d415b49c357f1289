mod common;

use common::*;
use dealership_api::{
    entities::{
        car::CarStatus,
        movement::{self, Entity as Movement},
        operation::{self, Entity as Operation, OperationKind},
    },
    errors::ServiceError,
    services::{
        cars::CarService,
        movements::MovementService,
        sales::{SalesService, SellCar},
    },
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

#[tokio::test]
async fn move_updates_location_status_and_records_history() {
    let db = setup_db().await;
    let cars = CarService::new(db.clone(), test_clock());
    let movements = MovementService::new(db.clone());

    let created = cars
        .create_car(new_car("1HGCM82633A123456", "Sedan X", "Black", "15000"))
        .await
        .expect("create car");

    let moved = movements
        .move_car("1HGCM82633A123456", "warehouse", "showroom", date(2024, 1, 12))
        .await
        .expect("move car");

    assert_eq!(moved.car_id, created.id);
    assert_eq!(moved.from_location, "warehouse");
    assert_eq!(moved.to_location, "showroom");
    assert_eq!(moved.date, date(2024, 1, 12));

    let car = cars
        .get_car(created.id)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(car.location, "showroom");
    assert_eq!(car.status, CarStatus::InShowroom);
    assert_sold_invariant(&car);

    let log = Operation::find()
        .filter(operation::Column::Kind.eq(OperationKind::Movement))
        .all(db.as_ref())
        .await
        .expect("query log");
    assert_eq!(log.len(), 1);
    let details = log[0].details.as_deref().expect("details recorded");
    assert!(details.contains("warehouse"));
    assert!(details.contains("showroom"));
}

#[tokio::test]
async fn mismatched_from_location_changes_nothing() {
    let db = setup_db().await;
    let cars = CarService::new(db.clone(), test_clock());
    let movements = MovementService::new(db.clone());

    let created = cars
        .create_car(new_car("1HGCM82633A123456", "Sedan X", "Black", "15000"))
        .await
        .expect("create car");

    let result = movements
        .move_car(
            "1HGCM82633A123456",
            "warehouse-site-name",
            "showroom-site-name",
            date(2024, 1, 12),
        )
        .await;
    assert!(matches!(result, Err(ServiceError::LocationMismatch(_))));

    let car = cars
        .get_car(created.id)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(car.location, "warehouse");
    assert_eq!(car.status, CarStatus::InStock);

    let history = Movement::find()
        .filter(movement::Column::CarId.eq(created.id))
        .count(db.as_ref())
        .await
        .expect("count movements");
    assert_eq!(history, 0);

    // Only the arrival entry exists; the failed move logged nothing.
    let log_count = Operation::find()
        .filter(operation::Column::CarId.eq(created.id))
        .count(db.as_ref())
        .await
        .expect("count operations");
    assert_eq!(log_count, 1);
}

#[tokio::test]
async fn empty_from_location_skips_the_check() {
    let db = setup_db().await;
    let cars = CarService::new(db.clone(), test_clock());
    let movements = MovementService::new(db.clone());

    cars.create_car(new_car("1HGCM82633A123456", "Sedan X", "Black", "15000"))
        .await
        .expect("create car");

    let moved = movements
        .move_car("1HGCM82633A123456", "", "service", date(2024, 1, 12))
        .await
        .expect("move without prior location");
    assert_eq!(moved.from_location, "warehouse");
    assert_eq!(moved.to_location, "service");
}

#[tokio::test]
async fn unknown_destination_falls_back_to_in_stock() {
    let db = setup_db().await;
    let cars = CarService::new(db.clone(), test_clock());
    let movements = MovementService::new(db.clone());

    cars.create_car(new_car("1HGCM82633A123456", "Sedan X", "Black", "15000"))
        .await
        .expect("create car");
    movements
        .move_car("1HGCM82633A123456", "warehouse", "partner lot 7", date(2024, 1, 12))
        .await
        .expect("move car");

    let car = cars
        .get_car_by_vin("1HGCM82633A123456")
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(car.location, "partner lot 7");
    assert_eq!(car.status, CarStatus::InStock);
}

#[tokio::test]
async fn per_car_history_ascends_while_global_listing_descends() {
    let db = setup_db().await;
    let cars = CarService::new(db.clone(), test_clock());
    let movements = MovementService::new(db.clone());

    let first = cars
        .create_car(new_car("1HGCM82633A123456", "Sedan X", "Black", "15000"))
        .await
        .expect("create first car");
    cars.create_car(new_car("2HGCM82633A123457", "Sedan Y", "White", "17000"))
        .await
        .expect("create second car");

    movements
        .move_car("1HGCM82633A123456", "", "showroom", date(2024, 1, 12))
        .await
        .expect("move 1");
    movements
        .move_car("2HGCM82633A123457", "", "service", date(2024, 1, 14))
        .await
        .expect("move 2");
    movements
        .move_car("1HGCM82633A123456", "", "service", date(2024, 1, 16))
        .await
        .expect("move 3");

    let history = movements
        .list_movements_for_car(first.id)
        .await
        .expect("per-car history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].date, date(2024, 1, 12));
    assert_eq!(history[1].date, date(2024, 1, 16));

    let all = movements
        .list_all_movements(0, 100)
        .await
        .expect("global listing");
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].date, date(2024, 1, 16));
    assert_eq!(all[1].date, date(2024, 1, 14));
    assert_eq!(all[2].date, date(2024, 1, 12));

    let limited = movements
        .list_all_movements(0, 1)
        .await
        .expect("limited listing");
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].date, date(2024, 1, 16));
}

#[tokio::test]
async fn moving_an_unknown_vin_is_not_found() {
    let db = setup_db().await;
    let movements = MovementService::new(db.clone());

    let result = movements
        .move_car("ZZZZZZZZZZZZZZZZZ", "", "showroom", date(2024, 1, 12))
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn moving_a_sold_car_is_rejected() {
    let db = setup_db().await;
    let cars = CarService::new(db.clone(), test_clock());
    let movements = MovementService::new(db.clone());
    let sales = SalesService::new(db.clone(), test_clock());

    cars.create_car(new_car("1HGCM82633A123456", "Sedan X", "Black", "15000"))
        .await
        .expect("create car");
    sales
        .sell_car(SellCar {
            vin: "1HGCM82633A123456".to_string(),
            sale_price: dec("18500"),
            buyer_name: "Jane Doe".to_string(),
            buyer_phone: None,
            buyer_email: None,
            sale_date: Some(date(2024, 2, 1)),
        })
        .await
        .expect("sell car");

    let result = movements
        .move_car("1HGCM82633A123456", "", "showroom", date(2024, 2, 2))
        .await;
    assert!(matches!(result, Err(ServiceError::AlreadySold(_))));

    let car = cars
        .get_car_by_vin("1HGCM82633A123456")
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(car.status, CarStatus::Sold);
    assert_sold_invariant(&car);
}
